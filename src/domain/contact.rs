//! Contact domain types.
//!
//! A contact is a known sender address. Known senders raise the priority of
//! their mail during triage.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A known sender, stored as a normalized email address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Contact {
    email: String,
}

impl Contact {
    /// Creates a contact, normalizing the address (trimmed, lowercase).
    pub fn new(email: impl AsRef<str>) -> Self {
        Self {
            email: normalize_email(email.as_ref()),
        }
    }

    /// Returns the normalized email address.
    pub fn email(&self) -> &str {
        &self.email
    }

    /// Whether a raw sender string (possibly `Name <addr>`) refers to this contact.
    pub fn matches_sender(&self, sender: &str) -> bool {
        !self.email.is_empty() && sender.to_lowercase().contains(&self.email)
    }
}

impl fmt::Display for Contact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.email)
    }
}

/// Normalizes an email address (lowercase, trim).
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Basic email validation.
pub fn is_valid_email(email: &str) -> bool {
    let email = email.trim();
    if email.is_empty() || email.chars().any(char::is_whitespace) {
        return false;
    }
    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 {
        return false;
    }
    let (local, domain) = (parts[0], parts[1]);
    !local.is_empty() && !domain.is_empty() && domain.contains('.')
}
