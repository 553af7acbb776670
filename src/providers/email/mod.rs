//! Email provider implementations.
//!
//! This module contains the [`Mailbox`] and [`MailSender`] traits and their
//! implementations:
//!
//! - [`ImapMailbox`] - IMAP over implicit TLS
//! - [`InMemoryMailbox`] - process-local folders for tests
//! - [`SmtpSender`] - SMTP with implicit TLS or STARTTLS
//!
//! # Example
//!
//! ```ignore
//! use mailbuddy::providers::email::{ImapConfig, ImapMailbox, Mailbox};
//!
//! let mut mailbox = ImapMailbox::new(ImapConfig::tls("imap.example.com", "me@example.com"));
//! mailbox.connect().await?;
//! let recent = mailbox.search_emails("INBOX", 5).await;
//! mailbox.disconnect().await?;
//! ```

mod imap;
mod memory;
mod smtp;
mod traits;

pub use imap::{ImapConfig, ImapMailbox};
pub use memory::InMemoryMailbox;
pub use smtp::{SmtpConfig, SmtpSender, SMTPS_PORT};
#[cfg(test)]
pub use traits::MockMailSender;
pub use traits::{with_timeout, MailSender, Mailbox, OutgoingReply, ProviderError, Result};
