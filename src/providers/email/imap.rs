//! IMAP mailbox implementation.
//!
//! [`ImapMailbox`] speaks IMAP4rev1 over implicit TLS via `async-imap`. It is
//! meant to be used for a single unit of work: connect, run one operation,
//! disconnect.
//!
//! # Protocol Details
//!
//! - Messages are addressed by UID, never by sequence number
//! - Searches fetch `BODY.PEEK[HEADER]` so listing never marks mail as read
//! - Moves use `UID MOVE` and fall back to `UID COPY` + `\Deleted` + `EXPUNGE`

use async_imap::types::Fetch;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::StreamExt;
use mail_parser::{Address, MessageParser};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_rustls::client::TlsStream;
use tokio_rustls::rustls::pki_types::ServerName;
use tokio_rustls::rustls::ClientConfig;
use tokio_rustls::TlsConnector;
use tokio_util::compat::{Compat, TokioAsyncReadCompatExt};

use super::{with_timeout, Mailbox, ProviderError, Result};
use crate::domain::{EmailInput, MessageId, MessageSummary};

/// IMAP server configuration.
#[derive(Debug, Clone)]
pub struct ImapConfig {
    /// IMAP server hostname.
    pub host: String,
    /// IMAP server port (993 for implicit TLS).
    pub port: u16,
    /// Login name, usually the email address.
    pub username: String,
    /// Password or app-specific password.
    pub password: Option<String>,
    /// Upper bound on every network round trip.
    pub timeout: Duration,
}

impl ImapConfig {
    /// Creates a configuration for the standard IMAPS port.
    pub fn tls(host: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: 993,
            username: username.into(),
            password: None,
            timeout: Duration::from_secs(30),
        }
    }

    /// Sets the password.
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Sets the port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the per-call timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Type alias for the IMAP session with TLS (using tokio-util compat layer).
type ImapSession = async_imap::Session<Compat<TlsStream<TcpStream>>>;

/// IMAP mailbox connector.
pub struct ImapMailbox {
    config: ImapConfig,
    session: Option<ImapSession>,
}

impl ImapMailbox {
    /// Creates a disconnected mailbox.
    pub fn new(config: ImapConfig) -> Self {
        Self {
            config,
            session: None,
        }
    }

    /// Returns the server configuration.
    pub fn config(&self) -> &ImapConfig {
        &self.config
    }

    fn session(&mut self) -> Result<&mut ImapSession> {
        self.session
            .as_mut()
            .ok_or_else(|| ProviderError::Connection("not connected".to_string()))
    }

    /// Establishes TLS connection to the IMAP server with futures compat wrapper.
    async fn connect_tls(config: &ImapConfig) -> Result<Compat<TlsStream<TcpStream>>> {
        let tcp_stream = TcpStream::connect((config.host.as_str(), config.port))
            .await
            .map_err(|e| ProviderError::Connection(format!("TCP connect failed: {}", e)))?;

        let tls_config = ClientConfig::builder()
            .with_root_certificates(tokio_rustls::rustls::RootCertStore::from_iter(
                webpki_roots::TLS_SERVER_ROOTS.iter().cloned(),
            ))
            .with_no_client_auth();

        let connector = TlsConnector::from(Arc::new(tls_config));
        let server_name = ServerName::try_from(config.host.clone())
            .map_err(|e| ProviderError::Connection(format!("invalid server name: {}", e)))?;

        let tls_stream = connector
            .connect(server_name, tcp_stream)
            .await
            .map_err(|e| ProviderError::Connection(format!("TLS handshake failed: {}", e)))?;

        Ok(tls_stream.compat())
    }

    /// Consumes a stream to completion.
    async fn drain_stream<T, E>(
        stream: impl futures::Stream<Item = std::result::Result<T, E>>,
    ) -> std::result::Result<(), E> {
        futures::pin_mut!(stream);
        while let Some(result) = stream.next().await {
            result?;
        }
        Ok(())
    }

    fn parse_uid(id: &MessageId) -> Result<u32> {
        id.as_uid()
            .ok_or_else(|| ProviderError::InvalidRequest(format!("invalid message id: {}", id)))
    }

    /// Renders the first address of a header in `Name <addr>` form.
    fn first_address(address: Option<&Address<'_>>) -> String {
        let Some(addr) = address.and_then(|a| a.first()) else {
            return String::new();
        };
        match (addr.name(), addr.address()) {
            (Some(name), Some(email)) => format!("{} <{}>", name, email),
            (None, Some(email)) => email.to_string(),
            (Some(name), None) => name.to_string(),
            (None, None) => String::new(),
        }
    }

    /// Builds a summary from a header-only fetch.
    fn fetch_to_summary(fetch: &Fetch) -> Option<MessageSummary> {
        let uid = fetch.uid?;
        let header = fetch.header()?;
        let message = MessageParser::default().parse(header)?;

        let date = message
            .date()
            .and_then(|d| DateTime::<Utc>::from_timestamp(d.to_timestamp(), 0));

        Some(MessageSummary {
            id: MessageId::from(uid),
            subject: message.subject().unwrap_or("(no subject)").to_string(),
            sender: Self::first_address(message.from()),
            date,
        })
    }

    /// Builds an email input from a full-body fetch.
    fn fetch_to_input(fetch: &Fetch) -> Option<EmailInput> {
        let raw = fetch.body()?;
        let message = MessageParser::default().parse(raw)?;

        let body = message
            .body_text(0)
            .map(|s| s.to_string())
            .or_else(|| message.body_html(0).map(|s| s.to_string()))
            .unwrap_or_default();

        Some(EmailInput {
            subject: message.subject().unwrap_or_default().to_string(),
            body,
            sender: Self::first_address(message.from()),
        })
    }

    async fn select(session: &mut ImapSession, folder: &str) -> Result<()> {
        session
            .select(folder)
            .await
            .map_err(|e| ProviderError::NotFound(format!("folder {}: {}", folder, e)))?;
        Ok(())
    }

    async fn uid_exists(session: &mut ImapSession, uid: u32) -> Result<bool> {
        let found = session
            .uid_search(format!("UID {}", uid))
            .await
            .map_err(|e| ProviderError::Provider(format!("SEARCH failed: {}", e)))?;
        Ok(found.contains(&uid))
    }

    async fn do_connect(config: &ImapConfig) -> Result<ImapSession> {
        let password = config.password.as_deref().ok_or_else(|| {
            ProviderError::Authentication("no mailbox password configured".to_string())
        })?;
        if config.username.trim().is_empty() {
            return Err(ProviderError::Authentication(
                "no mailbox address configured".to_string(),
            ));
        }

        let tls_stream = Self::connect_tls(config).await?;
        let client = async_imap::Client::new(tls_stream);

        client
            .login(&config.username, password)
            .await
            .map_err(|e| ProviderError::Authentication(format!("IMAP login failed: {}", e.0)))
    }

    async fn do_search(
        session: &mut ImapSession,
        folder: &str,
        limit: usize,
    ) -> Result<Vec<MessageSummary>> {
        Self::select(session, folder).await?;

        let uids = session
            .uid_search("ALL")
            .await
            .map_err(|e| ProviderError::Provider(format!("SEARCH failed: {}", e)))?;

        let mut uid_list: Vec<u32> = uids.into_iter().collect();
        uid_list.sort_unstable_by(|a, b| b.cmp(a));
        uid_list.truncate(limit);

        if uid_list.is_empty() {
            return Ok(Vec::new());
        }

        let uid_seq = uid_list
            .iter()
            .map(|u| u.to_string())
            .collect::<Vec<_>>()
            .join(",");

        let fetches = session
            .uid_fetch(&uid_seq, "(UID BODY.PEEK[HEADER])")
            .await
            .map_err(|e| ProviderError::Provider(format!("FETCH failed: {}", e)))?;
        futures::pin_mut!(fetches);

        let mut summaries = Vec::new();
        while let Some(fetch_result) = fetches.next().await {
            match fetch_result {
                Ok(fetch) => summaries.extend(Self::fetch_to_summary(&fetch)),
                Err(e) => tracing::warn!(folder, error = %e, "Skipping unreadable message"),
            }
        }

        summaries.sort_by_key(|s| std::cmp::Reverse(s.id.as_uid().unwrap_or(0)));
        Ok(summaries)
    }

    async fn do_fetch(session: &mut ImapSession, folder: &str, uid: u32) -> Result<EmailInput> {
        Self::select(session, folder).await?;

        let fetches = session
            .uid_fetch(uid.to_string(), "(UID BODY.PEEK[])")
            .await
            .map_err(|e| ProviderError::Provider(format!("FETCH failed: {}", e)))?;
        futures::pin_mut!(fetches);

        let mut found = None;
        while let Some(fetch_result) = fetches.next().await {
            let fetch =
                fetch_result.map_err(|e| ProviderError::Provider(format!("FETCH failed: {}", e)))?;
            if found.is_none() && fetch.uid == Some(uid) {
                found = Self::fetch_to_input(&fetch);
            }
        }

        found.ok_or_else(|| ProviderError::NotFound(format!("message {} in {}", uid, folder)))
    }

    async fn do_move(session: &mut ImapSession, uid: u32, from: &str, to: &str) -> Result<()> {
        Self::select(session, from).await?;

        if !Self::uid_exists(session, uid).await? {
            return Err(ProviderError::NotFound(format!("message {} in {}", uid, from)));
        }

        let uid_str = uid.to_string();
        if session.uid_mv(&uid_str, to).await.is_ok() {
            return Ok(());
        }

        tracing::debug!(uid, "UID MOVE unavailable, falling back to COPY");
        session
            .uid_copy(&uid_str, to)
            .await
            .map_err(|e| ProviderError::Provider(format!("COPY failed: {}", e)))?;

        let store_stream = session
            .uid_store(&uid_str, "+FLAGS (\\Deleted)")
            .await
            .map_err(|e| ProviderError::Provider(format!("STORE failed: {}", e)))?;
        Self::drain_stream(store_stream)
            .await
            .map_err(|e| ProviderError::Provider(format!("STORE failed: {}", e)))?;

        let expunge_stream = session
            .expunge()
            .await
            .map_err(|e| ProviderError::Provider(format!("EXPUNGE failed: {}", e)))?;
        Self::drain_stream(expunge_stream)
            .await
            .map_err(|e| ProviderError::Provider(format!("EXPUNGE failed: {}", e)))?;

        Ok(())
    }
}

#[async_trait]
impl Mailbox for ImapMailbox {
    async fn connect(&mut self) -> Result<()> {
        if self.session.is_some() {
            return Ok(());
        }

        let session = with_timeout(self.config.timeout, Self::do_connect(&self.config)).await?;
        self.session = Some(session);

        tracing::info!(host = %self.config.host, user = %self.config.username, "IMAP session opened");
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<()> {
        let Some(mut session) = self.session.take() else {
            return Ok(());
        };

        let limit = self.config.timeout;
        match tokio::time::timeout(limit, session.logout()).await {
            Ok(Ok(())) => tracing::debug!(host = %self.config.host, "IMAP session closed"),
            Ok(Err(e)) => tracing::warn!(error = %e, "IMAP logout failed"),
            Err(_) => tracing::warn!("IMAP logout timed out"),
        }
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.session.is_some()
    }

    async fn list_folders(&mut self) -> Result<Vec<String>> {
        let limit = self.config.timeout;
        let session = self.session()?;

        let fut = async {
            let names = session
                .list(Some(""), Some("*"))
                .await
                .map_err(|e| ProviderError::Provider(format!("LIST failed: {}", e)))?;
            futures::pin_mut!(names);

            let mut folders = Vec::new();
            while let Some(name) = names.next().await {
                match name {
                    Ok(name) => folders.push(name.name().to_string()),
                    Err(e) => tracing::warn!(error = %e, "Skipping unreadable folder entry"),
                }
            }
            Ok(folders)
        };

        with_timeout(limit, fut).await
    }

    async fn create_folder(&mut self, name: &str) -> Result<()> {
        let limit = self.config.timeout;
        let session = self.session()?;

        with_timeout(limit, async {
            session
                .create(name)
                .await
                .map_err(|e| ProviderError::Provider(format!("CREATE {} failed: {}", name, e)))
        })
        .await?;

        tracing::info!(folder = name, "Created folder");
        Ok(())
    }

    async fn search_emails(&mut self, folder: &str, limit: usize) -> Result<Vec<MessageSummary>> {
        let timeout = self.config.timeout;
        let session = self.session()?;

        with_timeout(timeout, Self::do_search(session, folder, limit)).await
    }

    async fn fetch_email(&mut self, folder: &str, id: &MessageId) -> Result<EmailInput> {
        let uid = Self::parse_uid(id)?;
        let timeout = self.config.timeout;
        let session = self.session()?;

        with_timeout(timeout, Self::do_fetch(session, folder, uid)).await
    }

    async fn move_email(
        &mut self,
        id: &MessageId,
        from_folder: &str,
        to_folder: &str,
    ) -> Result<()> {
        let uid = Self::parse_uid(id)?;
        let timeout = self.config.timeout;
        let session = self.session()?;

        with_timeout(timeout, Self::do_move(session, uid, from_folder, to_folder)).await?;

        tracing::info!(uid, from = from_folder, to = to_folder, "Moved message");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> ImapConfig {
        ImapConfig::tls("imap.example.com", "user@example.com")
    }

    #[test]
    fn imap_config_tls() {
        let config = test_config()
            .with_password("secret")
            .with_timeout(Duration::from_secs(5));
        assert_eq!(config.host, "imap.example.com");
        assert_eq!(config.port, 993);
        assert_eq!(config.password.as_deref(), Some("secret"));
        assert_eq!(config.timeout, Duration::from_secs(5));
    }

    #[test]
    fn mailbox_starts_disconnected() {
        let mailbox = ImapMailbox::new(test_config().with_port(1993));
        assert!(!mailbox.is_connected());
        assert_eq!(mailbox.config().port, 1993);
    }

    #[test]
    fn uid_parsing() {
        assert_eq!(ImapMailbox::parse_uid(&MessageId::from("17")).unwrap(), 17);
        assert!(matches!(
            ImapMailbox::parse_uid(&MessageId::from("abc")),
            Err(ProviderError::InvalidRequest(_))
        ));
    }

    #[tokio::test]
    async fn operations_require_connection() {
        let mut mailbox = ImapMailbox::new(test_config());

        let result = mailbox.search_emails("INBOX", 5).await;
        assert!(matches!(result, Err(ProviderError::Connection(_))));

        let result = mailbox.list_folders().await;
        assert!(matches!(result, Err(ProviderError::Connection(_))));

        let result = mailbox
            .move_email(&MessageId::from("1"), "INBOX", "Archive")
            .await;
        assert!(matches!(result, Err(ProviderError::Connection(_))));
    }

    #[tokio::test]
    async fn connect_without_password_is_auth_error() {
        let mut mailbox = ImapMailbox::new(test_config());
        let result = mailbox.connect().await;
        assert!(matches!(result, Err(ProviderError::Authentication(_))));
        assert!(!mailbox.is_connected());
    }

    #[tokio::test]
    async fn disconnect_when_disconnected_is_noop() {
        let mut mailbox = ImapMailbox::new(test_config());
        assert!(mailbox.disconnect().await.is_ok());
    }
}
