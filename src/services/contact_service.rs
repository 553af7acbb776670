//! Contact service for the known-sender list.
//!
//! Known senders are promoted by triage. The list is an insertion-ordered set
//! of normalized addresses; every mutation rewrites the whole backing store.

use thiserror::Error;

use crate::domain::{is_valid_email, normalize_email, Contact};

/// Errors that can occur during contact operations.
#[derive(Debug, Error)]
pub enum ContactError {
    #[error("Contact not found: {0}")]
    NotFound(String),

    #[error("Contact already exists: {0}")]
    AlreadyExists(String),

    #[error("Invalid email address: {0}")]
    InvalidEmail(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

/// Result type for contact operations.
pub type Result<T> = std::result::Result<T, ContactError>;

/// Storage trait for contact persistence.
pub trait ContactStorage: Send + Sync {
    /// Reads every stored contact, in stored order.
    ///
    /// A store that doesn't exist yet yields an empty list.
    fn load(&self) -> Result<Vec<Contact>>;

    /// Replaces the stored contacts with `contacts`.
    fn save_all(&self, contacts: &[Contact]) -> Result<()>;
}

/// Service for managing known contacts.
pub struct ContactService<S: ContactStorage> {
    storage: S,
    contacts: Vec<Contact>,
}

impl<S: ContactStorage> ContactService<S> {
    /// Opens the service, loading the current contacts from storage.
    ///
    /// An unreadable or malformed store is logged and treated as empty.
    /// Stored entries that are not valid addresses are dropped.
    pub fn open(storage: S) -> Self {
        let loaded = match storage.load() {
            Ok(contacts) => contacts,
            Err(e) => {
                tracing::warn!(error = %e, "Could not load contacts, starting with an empty list");
                Vec::new()
            }
        };

        let mut contacts: Vec<Contact> = Vec::with_capacity(loaded.len());
        for contact in loaded {
            let contact = Contact::new(contact.email());
            if is_valid_email(contact.email()) && !contacts.contains(&contact) {
                contacts.push(contact);
            }
        }

        tracing::debug!(count = contacts.len(), "Loaded contacts");
        Self { storage, contacts }
    }

    /// All contacts, in insertion order.
    pub fn list(&self) -> &[Contact] {
        &self.contacts
    }

    /// Number of contacts.
    pub fn count(&self) -> usize {
        self.contacts.len()
    }

    /// Whether an address is a known contact (after normalization).
    pub fn contains(&self, email: &str) -> bool {
        let normalized = normalize_email(email);
        self.contacts.iter().any(|c| c.email() == normalized)
    }

    /// Adds a contact and persists the list.
    ///
    /// # Errors
    ///
    /// Returns [`ContactError::InvalidEmail`] for empty or malformed addresses
    /// and [`ContactError::AlreadyExists`] for duplicates; the list is unchanged
    /// in both cases. A [`ContactError::Storage`] error means the contact was
    /// added in memory but could not be written.
    pub fn add(&mut self, email: &str) -> Result<Contact> {
        let normalized = normalize_email(email);
        if !is_valid_email(&normalized) {
            return Err(ContactError::InvalidEmail(email.trim().to_string()));
        }
        if self.contains(&normalized) {
            return Err(ContactError::AlreadyExists(normalized));
        }

        let contact = Contact::new(&normalized);
        self.contacts.push(contact.clone());
        self.persist()?;

        tracing::info!(contact = %contact, "Added contact");
        Ok(contact)
    }

    /// Removes a contact and persists the list.
    pub fn remove(&mut self, email: &str) -> Result<Contact> {
        let normalized = normalize_email(email);
        let position = self
            .contacts
            .iter()
            .position(|c| c.email() == normalized)
            .ok_or_else(|| ContactError::NotFound(normalized.clone()))?;

        let removed = self.contacts.remove(position);
        self.persist()?;

        tracing::info!(contact = %removed, "Removed contact");
        Ok(removed)
    }

    fn persist(&self) -> Result<()> {
        self.storage.save_all(&self.contacts).map_err(|e| {
            tracing::warn!(error = %e, "Failed to persist contacts");
            e
        })
    }
}
