//! Business services layer.
//!
//! Services sit between the application layer and the providers:
//!
//! ```text
//! Application Layer (Orchestrator, Console)
//!          |
//!          v
//!    Services Layer  <-- You are here
//!          |
//!          v
//! Infrastructure (Providers, Storage)
//! ```
//!
//! # Services Overview
//!
//! - [`ContactService`]: the known-sender list
//! - [`TriageEngine`]: rule-based categorization
//! - [`ReplyGenerator`]: LLM reply drafting with a template fallback
//! - [`MailboxService`]: one-command-at-a-time mailbox access

mod contact_service;
mod mailbox_service;
mod reply_service;
mod triage_service;

pub use contact_service::{ContactError, ContactService, ContactStorage};
pub use mailbox_service::{ensure_folders_exist, MailboxService};
pub use reply_service::{build_prompt, template_reply, GeneratedReply, ReplyGenerator, ReplySource};
pub use triage_service::TriageEngine;
