//! Commands accepted by the orchestrator.
//!
//! Each variant maps to exactly one handler in
//! [`Orchestrator::dispatch`](super::Orchestrator::dispatch).

use std::path::PathBuf;

use crate::domain::{MessageId, Tone};

/// A user request.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    // Session input
    SetSubject(String),
    SetSender(String),
    SetBody(String),
    SetImportantInfo(String),
    SetTone(Tone),

    // Contacts
    AddContact(String),
    RemoveContact(String),
    ListContacts,

    // Triage
    /// Runs the triage rules on the current email.
    Classify,

    // Mailbox
    /// Connects, creates missing mapped folders, disconnects.
    ConfigureMailbox,
    /// Lists server folders next to the category mapping.
    ListFolders,
    /// Shows the newest messages of a folder.
    ListFolder {
        folder: String,
        limit: Option<usize>,
    },
    /// Shows and remembers the newest INBOX messages.
    ListRecent,
    /// Loads a message into the session.
    SelectEmail(MessageId),
    /// Files the selected message into the folder for its triage category.
    MoveSelected,
    /// Moves any message between folders.
    MoveMessage {
        id: MessageId,
        from: String,
        to: String,
    },

    // Reply lifecycle
    Generate,
    Edit(String),
    Regenerate,
    Clear,
    Send,

    // Model
    LoadModel(PathBuf),
    ClassifyWithModel(String),
}

impl Command {
    /// Stable name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Command::SetSubject(_) => "set_subject",
            Command::SetSender(_) => "set_sender",
            Command::SetBody(_) => "set_body",
            Command::SetImportantInfo(_) => "set_important_info",
            Command::SetTone(_) => "set_tone",
            Command::AddContact(_) => "add_contact",
            Command::RemoveContact(_) => "remove_contact",
            Command::ListContacts => "list_contacts",
            Command::Classify => "classify",
            Command::ConfigureMailbox => "configure_mailbox",
            Command::ListFolders => "list_folders",
            Command::ListFolder { .. } => "list_folder",
            Command::ListRecent => "list_recent",
            Command::SelectEmail(_) => "select_email",
            Command::MoveSelected => "move_selected",
            Command::MoveMessage { .. } => "move_message",
            Command::Generate => "generate",
            Command::Edit(_) => "edit",
            Command::Regenerate => "regenerate",
            Command::Clear => "clear",
            Command::Send => "send",
            Command::LoadModel(_) => "load_model",
            Command::ClassifyWithModel(_) => "classify_with_model",
        }
    }

    /// Whether the command talks to the mail server.
    pub fn uses_mailbox(&self) -> bool {
        matches!(
            self,
            Command::ConfigureMailbox
                | Command::ListFolders
                | Command::ListFolder { .. }
                | Command::ListRecent
                | Command::SelectEmail(_)
                | Command::MoveSelected
                | Command::MoveMessage { .. }
        )
    }
}
