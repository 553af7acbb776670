//! Email domain types.
//!
//! Represents the message under triage and the lightweight summaries returned
//! by mailbox searches.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::MessageId;

/// The text of an email being triaged or answered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailInput {
    /// Subject line.
    pub subject: String,
    /// Plain text body.
    pub body: String,
    /// Sender, either a bare address or `Name <address>`.
    pub sender: String,
}

impl EmailInput {
    /// Creates a new email input.
    pub fn new(
        subject: impl Into<String>,
        body: impl Into<String>,
        sender: impl Into<String>,
    ) -> Self {
        Self {
            subject: subject.into(),
            body: body.into(),
            sender: sender.into(),
        }
    }

    /// Whether subject, body and sender are all blank.
    pub fn is_blank(&self) -> bool {
        self.subject.trim().is_empty() && self.body.trim().is_empty() && self.sender.trim().is_empty()
    }

    /// Extracts the bare address from the sender field.
    ///
    /// `"Jane <jane@example.com>"` yields `jane@example.com`.
    pub fn sender_address(&self) -> String {
        extract_address(&self.sender)
    }
}

/// A message as listed in a folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageSummary {
    /// Server-assigned message identifier.
    pub id: MessageId,
    /// Decoded subject line.
    pub subject: String,
    /// Sender in display form.
    pub sender: String,
    /// Date header, when present and parseable.
    pub date: Option<DateTime<Utc>>,
}

impl MessageSummary {
    /// One-line label used when listing messages.
    pub fn label(&self) -> String {
        format!("{} - From: {}", self.subject, self.sender)
    }
}

/// Pulls the address out of `Name <address>`, or returns the trimmed input.
pub fn extract_address(sender: &str) -> String {
    let sender = sender.trim();
    match (sender.rfind('<'), sender.rfind('>')) {
        (Some(start), Some(end)) if start < end => sender[start + 1..end].trim().to_string(),
        _ => sender.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_input_detection() {
        assert!(EmailInput::default().is_blank());
        assert!(EmailInput::new("  ", "\n", "").is_blank());
        assert!(!EmailInput::new("", "", "a@b.com").is_blank());
    }

    #[test]
    fn extract_address_variants() {
        assert_eq!(extract_address("Jane Doe <jane@example.com>"), "jane@example.com");
        assert_eq!(extract_address("  jane@example.com "), "jane@example.com");
        assert_eq!(extract_address("broken <jane@example.com"), "broken <jane@example.com");
    }

    #[test]
    fn summary_label() {
        let summary = MessageSummary {
            id: MessageId::from("5"),
            subject: "Hello".to_string(),
            sender: "a@b.com".to_string(),
            date: None,
        };
        assert_eq!(summary.label(), "Hello - From: a@b.com");
    }
}
