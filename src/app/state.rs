//! Session state.
//!
//! Everything a session remembers between commands: the email being worked
//! on, the reply draft, the last triage result and what the mailbox showed.
//! The state is a plain value; handlers take it and hand back a new one.

use thiserror::Error;

use crate::domain::{EmailInput, MessageId, MessageSummary, Tone, TriageResult};

/// Errors from draft transitions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DraftError {
    #[error("There is no draft to edit; generate a reply first")]
    NothingToEdit,
}

/// Lifecycle phase of a reply draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DraftPhase {
    /// No draft.
    #[default]
    Empty,
    /// Fresh from the generator; editing text equals generated text.
    Drafted,
    /// The user has changed the editing text.
    Editing,
}

/// The reply being prepared.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReplyDraft {
    phase: DraftPhase,
    generated: String,
    editing: String,
}

impl ReplyDraft {
    pub fn phase(&self) -> DraftPhase {
        self.phase
    }

    /// Text as produced by the generator.
    pub fn generated(&self) -> &str {
        &self.generated
    }

    /// Text that will be sent.
    pub fn editing(&self) -> &str {
        &self.editing
    }

    pub fn is_empty(&self) -> bool {
        self.phase == DraftPhase::Empty
    }

    /// Stores a freshly generated reply as both generated and editing text.
    pub fn set_generated(&mut self, text: impl Into<String>) {
        let text = text.into();
        self.editing = text.clone();
        self.generated = text;
        self.phase = DraftPhase::Drafted;
    }

    /// Replaces the editing text.
    pub fn edit(&mut self, text: impl Into<String>) -> Result<(), DraftError> {
        if self.phase == DraftPhase::Empty {
            return Err(DraftError::NothingToEdit);
        }
        self.editing = text.into();
        self.phase = DraftPhase::Editing;
        Ok(())
    }

    /// Drops both texts.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// State threaded through every command of a session.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionState {
    /// Email under triage or reply.
    pub email: EmailInput,
    /// Extra facts the reply should mention.
    pub important_info: String,
    pub tone: Tone,
    pub draft: ReplyDraft,
    /// Result of the last `classify`.
    pub triage: Option<TriageResult>,
    /// Message loaded by `select`, if any.
    pub selected: Option<MessageId>,
    /// Messages from the last INBOX listing.
    pub recent: Vec<MessageSummary>,
    /// Set once folder setup has succeeded.
    pub mailbox_configured: bool,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Text handed to the reply generator: subject and body, blank parts skipped.
    pub fn reply_source_text(&self) -> String {
        let subject = self.email.subject.trim();
        let body = self.email.body.trim();
        match (subject.is_empty(), body.is_empty()) {
            (false, false) => format!("Subject: {}\n\n{}", subject, body),
            (false, true) => format!("Subject: {}", subject),
            (true, false) => body.to_string(),
            (true, true) => String::new(),
        }
    }

    /// Extra information, if the user gave any.
    pub fn important_info(&self) -> Option<&str> {
        Some(self.important_info.trim()).filter(|i| !i.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn generated_text_is_copied_to_editing() {
        let mut draft = ReplyDraft::default();
        draft.set_generated("Hello there");
        assert_eq!(draft.phase(), DraftPhase::Drafted);
        assert_eq!(draft.generated(), "Hello there");
        assert_eq!(draft.editing(), "Hello there");
    }

    #[test]
    fn edit_requires_a_draft() {
        let mut draft = ReplyDraft::default();
        assert_eq!(draft.edit("x"), Err(DraftError::NothingToEdit));
        assert!(draft.is_empty());
    }

    #[test]
    fn edit_then_regenerate_resyncs() {
        let mut draft = ReplyDraft::default();
        draft.set_generated("first");
        draft.edit("first, edited").unwrap();
        assert_eq!(draft.phase(), DraftPhase::Editing);
        assert_eq!(draft.generated(), "first");

        draft.set_generated("second");
        assert_eq!(draft.phase(), DraftPhase::Drafted);
        assert_eq!(draft.generated(), draft.editing());
    }

    #[test]
    fn clear_resets_both_texts() {
        let mut draft = ReplyDraft::default();
        draft.set_generated("text");
        draft.clear();
        assert_eq!(draft, ReplyDraft::default());
    }

    #[test]
    fn reply_source_text_skips_blank_parts() {
        let mut state = SessionState::new();
        assert_eq!(state.reply_source_text(), "");

        state.email.body = "Can we meet?".to_string();
        assert_eq!(state.reply_source_text(), "Can we meet?");

        state.email.subject = "Meeting".to_string();
        assert_eq!(state.reply_source_text(), "Subject: Meeting\n\nCan we meet?");
    }

    #[test]
    fn blank_important_info_is_none() {
        let mut state = SessionState::new();
        state.important_info = "   ".to_string();
        assert_eq!(state.important_info(), None);
    }
}
