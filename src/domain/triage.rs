//! Triage domain types.
//!
//! A triage result routes a message: either into a folder or to the top of
//! the reading queue.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Category assigned to an email by triage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    /// From a known contact and using urgent language.
    Urgent,
    /// From a known contact, or using urgent language.
    Important,
    /// Mailing list or periodic update.
    Newsletter,
    /// Marketing and sales.
    Promotional,
    /// One-time passwords, receipts and invoices.
    OtpReceipt,
    /// Anything else.
    Other,
}

impl Category {
    /// All categories, in display order.
    pub const ALL: [Category; 6] = [
        Category::Urgent,
        Category::Important,
        Category::Newsletter,
        Category::Promotional,
        Category::OtpReceipt,
        Category::Other,
    ];

    /// Canonical upper-case name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Urgent => "URGENT",
            Category::Important => "IMPORTANT",
            Category::Newsletter => "NEWSLETTER",
            Category::Promotional => "PROMOTIONAL",
            Category::OtpReceipt => "OTP_RECEIPT",
            Category::Other => "OTHER",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown category: {}", s))
    }
}

/// Priority level for flagged messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Priority {
    High,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Priority::High => f.write_str("High"),
        }
    }
}

/// What to do with a triaged message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum TriageAction {
    /// File the message into a folder.
    MoveToFolder(String),
    /// Keep the message in place and flag it.
    FlagPriority(Priority),
}

impl fmt::Display for TriageAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TriageAction::MoveToFolder(folder) => write!(f, "MOVE_TO_FOLDER: {}", folder),
            TriageAction::FlagPriority(priority) => write!(f, "FLAG_PRIORITY: {}", priority),
        }
    }
}

/// Outcome of evaluating the triage rules against one email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriageResult {
    pub category: Category,
    pub action: TriageAction,
    /// One-sentence explanation of the decision.
    pub justification: String,
}
