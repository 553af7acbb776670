//! SMTP reply sender.
//!
//! Port 465 uses implicit TLS; every other port negotiates STARTTLS.

use async_trait::async_trait;
use chrono::Utc;
use lettre::message::{header::ContentType, Mailbox as Address};
use lettre::transport::smtp::authentication::Credentials as SmtpCredentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::time::Duration;

use super::{with_timeout, MailSender, OutgoingReply, ProviderError, Result};

/// Port on which SMTP is spoken over implicit TLS.
pub const SMTPS_PORT: u16 = 465;

/// SMTP server configuration.
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    /// SMTP server hostname.
    pub host: String,
    /// SMTP server port (465 for TLS, 587 for STARTTLS).
    pub port: u16,
    /// Login name and `From` address.
    pub username: String,
    /// Password or app-specific password.
    pub password: Option<String>,
    /// Display name for outgoing mail.
    pub display_name: Option<String>,
    /// Upper bound on the whole send.
    pub timeout: Duration,
}

impl SmtpConfig {
    /// Creates a configuration for the implicit TLS port.
    pub fn tls(host: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: SMTPS_PORT,
            username: username.into(),
            password: None,
            display_name: None,
            timeout: Duration::from_secs(30),
        }
    }

    /// Creates a configuration for the STARTTLS submission port.
    pub fn starttls(host: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            port: 587,
            ..Self::tls(host, username)
        }
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Whether the connection uses implicit TLS rather than STARTTLS.
    pub fn uses_implicit_tls(&self) -> bool {
        self.port == SMTPS_PORT
    }
}

/// Sends replies through an SMTP relay.
pub struct SmtpSender {
    config: SmtpConfig,
}

impl SmtpSender {
    pub fn new(config: SmtpConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SmtpConfig {
        &self.config
    }

    fn from_address(&self) -> Result<Address> {
        let raw = match self.config.display_name {
            Some(ref name) => format!("{} <{}>", name, self.config.username),
            None => self.config.username.clone(),
        };
        raw.parse()
            .map_err(|e| ProviderError::InvalidRequest(format!("invalid from address: {}", e)))
    }

    /// Builds an RFC 5322 plain-text message.
    fn build_message(&self, reply: &OutgoingReply) -> Result<Message> {
        let to: Address = reply
            .to
            .trim()
            .parse()
            .map_err(|e| ProviderError::InvalidRecipient(format!("{}: {}", reply.to, e)))?;

        Message::builder()
            .from(self.from_address()?)
            .to(to)
            .subject(reply.subject.as_str())
            .header(ContentType::TEXT_PLAIN)
            .body(reply.body.clone())
            .map_err(|e| ProviderError::InvalidRequest(format!("failed to build message: {}", e)))
    }

    fn transport(&self, password: &str) -> Result<AsyncSmtpTransport<Tokio1Executor>> {
        let credentials = SmtpCredentials::new(self.config.username.clone(), password.to_string());

        let builder = if self.config.uses_implicit_tls() {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&self.config.host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.config.host)
        }
        .map_err(|e| ProviderError::Connection(format!("SMTP relay error: {}", e)))?;

        Ok(builder
            .credentials(credentials)
            .port(self.config.port)
            .timeout(Some(self.config.timeout))
            .build())
    }
}

/// Maps an SMTP failure to a provider error by its reply code.
///
/// Failures without a reply code never reached a server verdict.
fn send_error(status: Option<u16>, detail: &str) -> ProviderError {
    match status {
        Some(530 | 534 | 535) => {
            ProviderError::Authentication(format!("SMTP rejected login: {}", detail))
        }
        Some(550 | 551 | 553) => ProviderError::InvalidRecipient(detail.to_string()),
        Some(code) if code < 500 => {
            ProviderError::Connection(format!("SMTP temporary failure: {}", detail))
        }
        Some(_) => ProviderError::Provider(format!("SMTP rejected: {}", detail)),
        None => ProviderError::Connection(format!("SMTP send failed: {}", detail)),
    }
}

#[async_trait]
impl MailSender for SmtpSender {
    async fn send(&self, reply: &OutgoingReply) -> Result<String> {
        let password = self.config.password.as_deref().ok_or_else(|| {
            ProviderError::Authentication("no SMTP password configured".to_string())
        })?;
        if self.config.username.trim().is_empty() {
            return Err(ProviderError::Authentication(
                "no sender address configured".to_string(),
            ));
        }

        let message = self.build_message(reply)?;
        let mailer = self.transport(password)?;

        let response = with_timeout(self.config.timeout, async {
            mailer
                .send(message)
                .await
                .map_err(|e| send_error(e.status().map(u16::from), &e.to_string()))
        })
        .await?;

        let message_id = response
            .message()
            .next()
            .map(|s| s.to_string())
            .unwrap_or_else(|| format!("<sent-{}>", Utc::now().timestamp()));

        tracing::info!(to = %reply.to, message_id = %message_id, "Reply sent via SMTP");
        Ok(message_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sender() -> SmtpSender {
        SmtpSender::new(
            SmtpConfig::tls("smtp.example.com", "me@example.com").with_display_name("Me"),
        )
    }

    #[test]
    fn port_selects_tls_mode() {
        assert!(SmtpConfig::tls("smtp.example.com", "me@example.com").uses_implicit_tls());
        assert!(!SmtpConfig::starttls("smtp.example.com", "me@example.com").uses_implicit_tls());
        assert!(!SmtpConfig::tls("smtp.example.com", "me@example.com")
            .with_port(2525)
            .uses_implicit_tls());
    }

    #[test]
    fn builds_plain_text_reply() {
        let reply = OutgoingReply::reply_to("boss@example.com", "Status", "All good.");
        let message = sender().build_message(&reply).unwrap();
        let raw = String::from_utf8(message.formatted()).unwrap();

        assert!(raw.contains("Subject: Re: Status"));
        assert!(raw.contains("To: boss@example.com"));
        assert!(raw.contains("From: Me <me@example.com>"));
        assert!(raw.contains("All good."));
    }

    #[test]
    fn invalid_recipient_is_rejected() {
        let reply = OutgoingReply::reply_to("not an address", "Status", "Hi");
        let result = sender().build_message(&reply);
        assert!(matches!(result, Err(ProviderError::InvalidRecipient(_))));
    }

    #[test]
    fn reply_codes_map_to_error_kinds() {
        assert!(matches!(
            send_error(Some(535), "5.7.8 bad credentials"),
            ProviderError::Authentication(_)
        ));
        assert!(matches!(
            send_error(Some(530), "authentication required"),
            ProviderError::Authentication(_)
        ));
        assert!(matches!(
            send_error(Some(550), "5.1.1 user unknown"),
            ProviderError::InvalidRecipient(_)
        ));
        assert!(matches!(
            send_error(Some(553), "mailbox name not allowed"),
            ProviderError::InvalidRecipient(_)
        ));
        assert!(matches!(
            send_error(Some(552), "message too large"),
            ProviderError::Provider(_)
        ));
        assert!(matches!(
            send_error(Some(421), "try again later"),
            ProviderError::Connection(_)
        ));
        assert!(matches!(
            send_error(None, "connection reset"),
            ProviderError::Connection(_)
        ));
    }

    #[tokio::test]
    async fn missing_password_is_auth_error() {
        let reply = OutgoingReply::reply_to("boss@example.com", "Status", "Hi");
        let result = sender().send(&reply).await;
        assert!(matches!(result, Err(ProviderError::Authentication(_))));
    }
}
