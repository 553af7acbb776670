//! Mailbox service.
//!
//! Wraps a [`Mailbox`] so that each call is one unit of work: connect, run the
//! operation, disconnect. The session is closed on error paths as well, and
//! no session outlives the call that opened it.

use crate::domain::{EmailInput, FolderMapping, MessageId, MessageSummary, INBOX};
use crate::providers::email::{Mailbox, Result};

/// Creates every folder in `mapping` that the server doesn't have yet.
///
/// The mailbox must already be connected. Returns the folders that were
/// created; running it again right away creates nothing.
pub async fn ensure_folders_exist<M: Mailbox + ?Sized>(
    mailbox: &mut M,
    mapping: &FolderMapping,
) -> Result<Vec<String>> {
    let existing = mailbox.list_folders().await?;
    let mut created = Vec::new();

    for folder in mapping.folders() {
        let present = folder.eq_ignore_ascii_case(INBOX) || existing.iter().any(|f| f == folder);
        if present {
            continue;
        }
        mailbox.create_folder(folder).await?;
        created.push(folder.to_string());
    }

    Ok(created)
}

/// Scoped access to a mailbox.
pub struct MailboxService<M: Mailbox> {
    mailbox: M,
}

impl<M: Mailbox> MailboxService<M> {
    pub fn new(mailbox: M) -> Self {
        Self { mailbox }
    }

    /// The wrapped mailbox.
    pub fn mailbox(&self) -> &M {
        &self.mailbox
    }

    async fn close(&mut self) {
        if let Err(e) = self.mailbox.disconnect().await {
            tracing::warn!(error = %e, "Mailbox disconnect failed");
        }
    }

    /// Creates any missing mapped folders.
    pub async fn setup_folders(&mut self, mapping: &FolderMapping) -> Result<Vec<String>> {
        self.mailbox.connect().await?;
        let result = ensure_folders_exist(&mut self.mailbox, mapping).await;
        self.close().await;

        if let Ok(ref created) = result {
            tracing::info!(created = created.len(), "Mailbox folders ready");
        }
        result
    }

    /// Lists every folder on the server.
    pub async fn list_folders(&mut self) -> Result<Vec<String>> {
        self.mailbox.connect().await?;
        let result = self.mailbox.list_folders().await;
        self.close().await;
        result
    }

    /// Returns the newest `limit` messages in `folder`.
    pub async fn recent(&mut self, folder: &str, limit: usize) -> Result<Vec<MessageSummary>> {
        self.mailbox.connect().await?;
        let result = self.mailbox.search_emails(folder, limit).await;
        self.close().await;
        result
    }

    /// Loads one message.
    pub async fn fetch(&mut self, folder: &str, id: &MessageId) -> Result<EmailInput> {
        self.mailbox.connect().await?;
        let result = self.mailbox.fetch_email(folder, id).await;
        self.close().await;
        result
    }

    /// Moves one message between folders.
    pub async fn move_message(&mut self, id: &MessageId, from: &str, to: &str) -> Result<()> {
        self.mailbox.connect().await?;
        let result = self.mailbox.move_email(id, from, to).await;
        self.close().await;
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Category;
    use crate::providers::email::{InMemoryMailbox, ProviderError};
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn setup_creates_missing_folders_once() {
        let mut service = MailboxService::new(InMemoryMailbox::new());
        let mapping = FolderMapping::default();

        let created = service.setup_folders(&mapping).await.unwrap();
        assert_eq!(created.len(), 6);
        let after_first = service.list_folders().await.unwrap();

        let created_again = service.setup_folders(&mapping).await.unwrap();
        assert!(created_again.is_empty());
        assert_eq!(service.list_folders().await.unwrap(), after_first);
    }

    #[tokio::test]
    async fn inbox_is_never_created() {
        let mut service = MailboxService::new(InMemoryMailbox::new());
        let mapping = FolderMapping::from_pairs([(Category::Other, "Inbox"), (Category::Urgent, "Urgent")]);

        let created = service.setup_folders(&mapping).await.unwrap();
        assert_eq!(created, vec!["Urgent".to_string()]);
    }

    #[tokio::test]
    async fn session_is_closed_after_each_call() {
        let mut service = MailboxService::new(InMemoryMailbox::new());

        service.recent(INBOX, 5).await.unwrap();
        assert!(!service.mailbox().is_connected());

        let result = service.fetch(INBOX, &MessageId::from("9")).await;
        assert!(matches!(result, Err(ProviderError::NotFound(_))));
        assert!(!service.mailbox().is_connected());
        assert_eq!(service.mailbox().connect_count(), 2);
    }

    #[tokio::test]
    async fn connect_failure_is_reported() {
        let mut service = MailboxService::new(InMemoryMailbox::new().refusing_login());
        let result = service.list_folders().await;
        assert!(matches!(result, Err(ProviderError::Authentication(_))));
    }
}
