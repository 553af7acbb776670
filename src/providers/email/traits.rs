//! Mailbox and sender trait definitions.
//!
//! [`Mailbox`] abstracts the IMAP side (folders, search, fetch, move) and
//! [`MailSender`] the SMTP side. Services only ever talk to these traits, which
//! keeps the orchestration testable without a mail server.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;

use crate::domain::{EmailInput, MessageId, MessageSummary};

/// Result type alias for email provider operations.
pub type Result<T> = std::result::Result<T, ProviderError>;

/// Errors that can occur during email provider operations.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// Authentication failed or credentials are missing.
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// Network or connection error.
    #[error("connection error: {0}")]
    Connection(String),

    /// The operation did not finish within the request timeout.
    #[error("timed out after {0} seconds")]
    Timeout(u64),

    /// Requested message or folder was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// The reply recipient is not a valid address.
    #[error("invalid recipient: {0}")]
    InvalidRecipient(String),

    /// Invalid request or parameters.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Server rejected a command.
    #[error("provider error: {0}")]
    Provider(String),
}

/// Awaits `fut`, failing with [`ProviderError::Timeout`] once `limit` elapses.
pub async fn with_timeout<T, F>(limit: Duration, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    tokio::time::timeout(limit, fut)
        .await
        .map_err(|_| ProviderError::Timeout(limit.as_secs()))?
}

/// A reply ready to be handed to the SMTP server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutgoingReply {
    /// Recipient address.
    pub to: String,
    /// Subject line.
    pub subject: String,
    /// Plain text body.
    pub body: String,
}

impl OutgoingReply {
    /// Builds a reply to a message with the given subject.
    ///
    /// Prefixes `Re: ` unless the subject already carries it; falls back to a
    /// generic subject when the original one is unknown.
    pub fn reply_to(to: impl Into<String>, original_subject: &str, body: impl Into<String>) -> Self {
        let original_subject = original_subject.trim();
        let subject = if original_subject.is_empty() {
            "Re: your email".to_string()
        } else if original_subject.to_lowercase().starts_with("re:") {
            original_subject.to_string()
        } else {
            format!("Re: {}", original_subject)
        };

        Self {
            to: to.into(),
            subject,
            body: body.into(),
        }
    }
}

/// Trait for mailbox (IMAP) implementations.
///
/// The connection follows `Disconnected -> Connected -> Disconnected`. Every
/// operation other than [`connect`](Mailbox::connect) and
/// [`disconnect`](Mailbox::disconnect) fails with [`ProviderError::Connection`]
/// while disconnected.
#[async_trait]
pub trait Mailbox: Send {
    /// Opens and authenticates a session.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Authentication`] if login is refused and
    /// [`ProviderError::Connection`] if the server cannot be reached.
    async fn connect(&mut self) -> Result<()>;

    /// Closes the session. Safe to call when already disconnected.
    async fn disconnect(&mut self) -> Result<()>;

    /// Whether a session is currently open.
    fn is_connected(&self) -> bool;

    /// Lists every folder name on the server.
    async fn list_folders(&mut self) -> Result<Vec<String>>;

    /// Creates a folder.
    async fn create_folder(&mut self, name: &str) -> Result<()>;

    /// Returns the most recent `limit` messages in a folder, newest first.
    async fn search_emails(&mut self, folder: &str, limit: usize) -> Result<Vec<MessageSummary>>;

    /// Loads the subject, sender and body of one message.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::NotFound`] if the message does not exist.
    async fn fetch_email(&mut self, folder: &str, id: &MessageId) -> Result<EmailInput>;

    /// Moves a message between folders.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::NotFound`] if the message no longer exists in
    /// `from_folder`; the source folder is left untouched in that case.
    async fn move_email(&mut self, id: &MessageId, from_folder: &str, to_folder: &str)
        -> Result<()>;
}

/// Trait for reply transports (SMTP).
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MailSender: Send + Sync {
    /// Sends a reply and returns the server's message reference.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::InvalidRecipient`] for an unparseable
    /// recipient, [`ProviderError::Authentication`] when credentials are
    /// missing or refused, and [`ProviderError::Connection`] or
    /// [`ProviderError::Timeout`] on transport failure.
    async fn send(&self, reply: &OutgoingReply) -> Result<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reply_subject_prefix() {
        let reply = OutgoingReply::reply_to("a@b.com", "Invoice overdue", "Paid.");
        assert_eq!(reply.subject, "Re: Invoice overdue");

        let again = OutgoingReply::reply_to("a@b.com", "RE: Invoice overdue", "Paid.");
        assert_eq!(again.subject, "RE: Invoice overdue");

        let unknown = OutgoingReply::reply_to("a@b.com", "  ", "Paid.");
        assert_eq!(unknown.subject, "Re: your email");
    }

    #[test]
    fn provider_error_display() {
        let auth_err = ProviderError::Authentication("bad password".to_string());
        assert_eq!(auth_err.to_string(), "authentication failed: bad password");

        let not_found = ProviderError::NotFound("message 123".to_string());
        assert!(not_found.to_string().contains("not found"));

        let timeout = ProviderError::Timeout(30);
        assert_eq!(timeout.to_string(), "timed out after 30 seconds");
    }

    #[tokio::test]
    async fn with_timeout_maps_elapsed() {
        let slow = async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        };
        let result = with_timeout(Duration::from_millis(10), slow).await;
        assert!(matches!(result, Err(ProviderError::Timeout(0))));

        let fast = with_timeout(Duration::from_secs(1), async { Ok(7) }).await;
        assert_eq!(fast.unwrap(), 7);
    }

    #[test]
    fn outgoing_reply_serialization() {
        let reply = OutgoingReply::reply_to("a@b.com", "Hello", "Hi there");
        let json = serde_json::to_string(&reply).unwrap();
        let back: OutgoingReply = serde_json::from_str(&json).unwrap();
        assert_eq!(back, reply);
    }
}
