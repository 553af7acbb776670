//! mailbuddy - An email triage and reply assistant
//!
//! This crate reads mail over IMAP, sorts it with a fixed rule table, drafts
//! replies with a language model (falling back to templates) and sends them
//! over SMTP. The [`app`] layer drives everything through explicit commands
//! and session state.

pub mod app;
pub mod classifier;
pub mod config;
pub mod domain;
pub mod providers;
pub mod services;
pub mod storage;

pub use app::{Command, Notice, Orchestrator, SessionState};
