//! Application layer.
//!
//! The session is driven by [`Command`]s. The [`Orchestrator`] applies each
//! one to a [`SessionState`] and reports back through [`Notice`]s; the
//! [`console`] module wraps that in an interactive loop.

mod actions;
pub mod bootstrap;
pub mod console;
mod events;
mod orchestrator;
mod state;

pub use actions::Command;
pub use events::{Notice, NoticeLevel};
pub use orchestrator::{Orchestrator, Transition};
pub use state::{DraftError, DraftPhase, ReplyDraft, SessionState};
