//! In-memory mailbox.
//!
//! Holds folders and messages in process memory for the test suites. It
//! follows the same connection rules as the IMAP implementation.

use async_trait::async_trait;
use std::collections::BTreeMap;

use super::{Mailbox, ProviderError, Result};
use crate::domain::{EmailInput, MessageId, MessageSummary, INBOX};

#[derive(Debug, Clone)]
struct StoredMessage {
    uid: u32,
    email: EmailInput,
}

/// Mailbox backed by an ordered map of folders.
#[derive(Debug, Clone)]
pub struct InMemoryMailbox {
    folders: BTreeMap<String, Vec<StoredMessage>>,
    next_uid: u32,
    connected: bool,
    refuse_login: bool,
    connects: usize,
}

impl Default for InMemoryMailbox {
    fn default() -> Self {
        let mut folders = BTreeMap::new();
        folders.insert(INBOX.to_string(), Vec::new());
        Self {
            folders,
            next_uid: 1,
            connected: false,
            refuse_login: false,
            connects: 0,
        }
    }
}

impl InMemoryMailbox {
    /// Creates a mailbox containing only an empty INBOX.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent `connect` fail with an authentication error.
    pub fn refusing_login(mut self) -> Self {
        self.refuse_login = true;
        self
    }

    /// Delivers a message into a folder, creating the folder if needed.
    pub fn deliver(&mut self, folder: &str, email: EmailInput) -> MessageId {
        let uid = self.next_uid;
        self.next_uid += 1;
        self.folders
            .entry(folder.to_string())
            .or_default()
            .push(StoredMessage { uid, email });
        MessageId::from(uid)
    }

    /// Number of messages in a folder (zero if it doesn't exist).
    pub fn count(&self, folder: &str) -> usize {
        self.folders.get(folder).map_or(0, Vec::len)
    }

    /// Number of successful connects so far.
    pub fn connect_count(&self) -> usize {
        self.connects
    }

    fn ensure_connected(&self) -> Result<()> {
        if self.connected {
            Ok(())
        } else {
            Err(ProviderError::Connection("not connected".to_string()))
        }
    }

    fn folder(&self, name: &str) -> Result<&Vec<StoredMessage>> {
        self.folders
            .get(name)
            .ok_or_else(|| ProviderError::NotFound(format!("folder {}", name)))
    }
}

#[async_trait]
impl Mailbox for InMemoryMailbox {
    async fn connect(&mut self) -> Result<()> {
        if self.refuse_login {
            return Err(ProviderError::Authentication("login refused".to_string()));
        }
        self.connected = true;
        self.connects += 1;
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<()> {
        self.connected = false;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    async fn list_folders(&mut self) -> Result<Vec<String>> {
        self.ensure_connected()?;
        Ok(self.folders.keys().cloned().collect())
    }

    async fn create_folder(&mut self, name: &str) -> Result<()> {
        self.ensure_connected()?;
        if self.folders.contains_key(name) {
            return Err(ProviderError::Provider(format!("folder {} already exists", name)));
        }
        self.folders.insert(name.to_string(), Vec::new());
        Ok(())
    }

    async fn search_emails(&mut self, folder: &str, limit: usize) -> Result<Vec<MessageSummary>> {
        self.ensure_connected()?;
        let mut messages: Vec<&StoredMessage> = self.folder(folder)?.iter().collect();
        messages.sort_by(|a, b| b.uid.cmp(&a.uid));

        Ok(messages
            .into_iter()
            .take(limit)
            .map(|m| MessageSummary {
                id: MessageId::from(m.uid),
                subject: m.email.subject.clone(),
                sender: m.email.sender.clone(),
                date: None,
            })
            .collect())
    }

    async fn fetch_email(&mut self, folder: &str, id: &MessageId) -> Result<EmailInput> {
        self.ensure_connected()?;
        let uid = id.as_uid();
        self.folder(folder)?
            .iter()
            .find(|m| Some(m.uid) == uid)
            .map(|m| m.email.clone())
            .ok_or_else(|| ProviderError::NotFound(format!("message {} in {}", id, folder)))
    }

    async fn move_email(
        &mut self,
        id: &MessageId,
        from_folder: &str,
        to_folder: &str,
    ) -> Result<()> {
        self.ensure_connected()?;
        if !self.folders.contains_key(to_folder) {
            return Err(ProviderError::NotFound(format!("folder {}", to_folder)));
        }

        let uid = id.as_uid();
        let source = self
            .folders
            .get_mut(from_folder)
            .ok_or_else(|| ProviderError::NotFound(format!("folder {}", from_folder)))?;
        let position = source
            .iter()
            .position(|m| Some(m.uid) == uid)
            .ok_or_else(|| ProviderError::NotFound(format!("message {} in {}", id, from_folder)))?;

        let message = source.remove(position);
        self.folders
            .entry(to_folder.to_string())
            .or_default()
            .push(message);
        Ok(())
    }
}
