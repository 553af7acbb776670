//! Domain layer types for MailBuddy.
//!
//! This module contains the core domain types used throughout the application:
//! contacts, email inputs and summaries, triage results, folder mapping and tone.

mod contact;
mod email;
mod folder;
mod tone;
mod triage;
mod types;

pub use contact::{is_valid_email, normalize_email, Contact};
pub use email::{extract_address, EmailInput, MessageSummary};
pub use folder::{FolderMapping, INBOX};
pub use tone::Tone;
pub use triage::{Category, Priority, TriageAction, TriageResult};
pub use types::MessageId;
