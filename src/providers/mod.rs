//! Email and AI provider implementations.
//!
//! This module contains provider traits and implementations for external services:
//!
//! - [`email`] - Mailbox (IMAP) and sender (SMTP) providers
//! - [`ai`] - LLM providers (Gemini, OpenAI-compatible)

pub mod ai;
pub mod email;
