//! Core identifier types for domain entities.
//!
//! These newtype wrappers keep mailbox identifiers from being mixed up with
//! folder names and other plain strings.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Server-assigned identifier of a message within a folder (an IMAP UID).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub String);

impl MessageId {
    /// Parses the identifier as a numeric IMAP UID.
    pub fn as_uid(&self) -> Option<u32> {
        self.0.trim().parse().ok()
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for MessageId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for MessageId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<u32> for MessageId {
    fn from(uid: u32) -> Self {
        Self(uid.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_id_display() {
        let id = MessageId::from("123");
        assert_eq!(id.to_string(), "123");
    }

    #[test]
    fn message_id_uid_parsing() {
        assert_eq!(MessageId::from(42u32).as_uid(), Some(42));
        assert_eq!(MessageId::from(" 7 ").as_uid(), Some(7));
        assert_eq!(MessageId::from("abc").as_uid(), None);
    }

    #[test]
    fn message_id_hash() {
        use std::collections::HashSet;
        let mut set = HashSet::new();
        set.insert(MessageId::from("1"));
        assert!(set.contains(&MessageId::from("1".to_string())));
    }
}
