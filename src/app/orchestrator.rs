//! Command dispatch and the reply lifecycle.
//!
//! The orchestrator owns the services; the caller owns the [`SessionState`].
//! Each [`Command`] is handled by one method that takes the state by value and
//! returns the next state plus the notices to show. Failures from services
//! become notices and never escape `dispatch`.
//!
//! Reply lifecycle:
//!
//! ```text
//! Empty --generate--> Drafted --edit--> Editing
//!   ^                  |   ^               |
//!   |                  |   +--regenerate---+
//!   +--send ok/clear---+-------------------+
//! ```

use std::path::Path;

use super::{Command, Notice, SessionState};
use crate::classifier::{ModelLoader, TextClassifier};
use crate::domain::{FolderMapping, MessageId, MessageSummary, Tone, INBOX};
use crate::providers::email::{MailSender, Mailbox, OutgoingReply, ProviderError};
use crate::services::{
    ContactError, ContactService, ContactStorage, MailboxService, ReplyGenerator, ReplySource,
    TriageEngine,
};

/// Result of handling one command.
#[derive(Debug, Clone)]
pub struct Transition {
    pub state: SessionState,
    pub notices: Vec<Notice>,
}

impl Transition {
    fn new(state: SessionState) -> Self {
        Self {
            state,
            notices: Vec::new(),
        }
    }

    fn with(state: SessionState, notice: Notice) -> Self {
        Self {
            state,
            notices: vec![notice],
        }
    }

    fn notice(mut self, notice: Notice) -> Self {
        self.notices.push(notice);
        self
    }
}

/// Dispatches commands to the contact, triage, reply, mailbox and model services.
pub struct Orchestrator<S: ContactStorage, M: Mailbox> {
    contacts: ContactService<S>,
    replies: ReplyGenerator,
    mailbox: MailboxService<M>,
    sender: Box<dyn MailSender>,
    folders: FolderMapping,
    classifier: Option<Box<dyn TextClassifier>>,
    search_limit: usize,
}

impl<S: ContactStorage, M: Mailbox> Orchestrator<S, M> {
    pub fn new(
        contacts: ContactService<S>,
        replies: ReplyGenerator,
        mailbox: M,
        sender: Box<dyn MailSender>,
    ) -> Self {
        Self {
            contacts,
            replies,
            mailbox: MailboxService::new(mailbox),
            sender,
            folders: FolderMapping::default(),
            classifier: None,
            search_limit: 5,
        }
    }

    pub fn with_folders(mut self, folders: FolderMapping) -> Self {
        self.folders = folders;
        self
    }

    pub fn with_search_limit(mut self, limit: usize) -> Self {
        self.search_limit = limit.max(1);
        self
    }

    pub fn with_classifier(mut self, classifier: Box<dyn TextClassifier>) -> Self {
        self.classifier = Some(classifier);
        self
    }

    pub fn contacts(&self) -> &ContactService<S> {
        &self.contacts
    }

    pub fn mailbox(&self) -> &M {
        self.mailbox.mailbox()
    }

    pub fn folders(&self) -> &FolderMapping {
        &self.folders
    }

    pub fn has_classifier(&self) -> bool {
        self.classifier.is_some()
    }

    /// Handles one command.
    pub async fn dispatch(&mut self, state: SessionState, command: Command) -> Transition {
        tracing::debug!(command = command.name(), "Dispatching command");

        let transition = match command {
            Command::SetSubject(subject) => Self::set_subject(state, subject),
            Command::SetSender(sender) => Self::set_sender(state, sender),
            Command::SetBody(body) => Self::set_body(state, body),
            Command::SetImportantInfo(info) => Self::set_important_info(state, info),
            Command::SetTone(tone) => Self::set_tone(state, tone),
            Command::AddContact(email) => self.add_contact(state, &email),
            Command::RemoveContact(email) => self.remove_contact(state, &email),
            Command::ListContacts => self.list_contacts(state),
            Command::Classify => self.classify(state),
            Command::ConfigureMailbox => self.configure_mailbox(state).await,
            Command::ListFolders => self.list_folders(state).await,
            Command::ListFolder { folder, limit } => self.list_folder(state, &folder, limit).await,
            Command::ListRecent => self.list_recent(state).await,
            Command::SelectEmail(id) => self.select_email(state, id).await,
            Command::MoveSelected => self.move_selected(state).await,
            Command::MoveMessage { id, from, to } => self.move_message(state, &id, &from, &to).await,
            Command::Generate => self.generate(state, false).await,
            Command::Regenerate => self.generate(state, true).await,
            Command::Edit(text) => Self::edit(state, text),
            Command::Clear => Self::clear(state),
            Command::Send => self.send(state).await,
            Command::LoadModel(path) => self.load_model(state, &path),
            Command::ClassifyWithModel(text) => self.classify_with_model(state, &text),
        };

        for notice in transition.notices.iter().filter(|n| n.is_problem()) {
            tracing::debug!(level = notice.level.tag(), message = %notice.message, "Command reported a problem");
        }
        transition
    }

    // ---- Session input ----

    fn set_subject(mut state: SessionState, subject: String) -> Transition {
        state.email.subject = subject;
        state.triage = None;
        Transition::new(state)
    }

    fn set_sender(mut state: SessionState, sender: String) -> Transition {
        state.email.sender = sender;
        state.triage = None;
        Transition::new(state)
    }

    fn set_body(mut state: SessionState, body: String) -> Transition {
        state.email.body = body;
        state.triage = None;
        Transition::new(state)
    }

    fn set_important_info(mut state: SessionState, info: String) -> Transition {
        state.important_info = info;
        Transition::new(state)
    }

    fn set_tone(mut state: SessionState, tone: Tone) -> Transition {
        state.tone = tone;
        Transition::with(state, Notice::info(format!("Tone set to {}", tone)))
    }

    // ---- Contacts ----

    fn add_contact(&mut self, state: SessionState, email: &str) -> Transition {
        let notice = match self.contacts.add(email) {
            Ok(contact) => Notice::success(format!("Added {}", contact)),
            Err(ContactError::InvalidEmail(_)) if email.trim().is_empty() => {
                Notice::warning("Contact already present or empty")
            }
            Err(ContactError::AlreadyExists(contact)) => {
                Notice::warning(format!("Contact already present: {}", contact))
            }
            Err(ContactError::InvalidEmail(raw)) => {
                Notice::warning(format!("Not a valid email address: {}", raw))
            }
            Err(e) => Notice::error(format!("Contact added but not saved: {}", e)),
        };
        Transition::with(state, notice)
    }

    fn remove_contact(&mut self, state: SessionState, email: &str) -> Transition {
        let notice = match self.contacts.remove(email) {
            Ok(contact) => Notice::success(format!("Removed {}", contact)),
            Err(ContactError::NotFound(contact)) => {
                Notice::warning(format!("No such contact: {}", contact))
            }
            Err(e) => Notice::error(format!("Contact removed but not saved: {}", e)),
        };
        Transition::with(state, notice)
    }

    fn list_contacts(&self, state: SessionState) -> Transition {
        let contacts = self.contacts.list();
        let notice = if contacts.is_empty() {
            Notice::info("No known contacts yet.")
        } else {
            let lines: Vec<String> = contacts.iter().map(|c| format!("- {}", c)).collect();
            Notice::info(format!("Known contacts ({}):\n{}", contacts.len(), lines.join("\n")))
        };
        Transition::with(state, notice)
    }

    // ---- Triage ----

    fn classify(&self, mut state: SessionState) -> Transition {
        if state.email.is_blank() {
            return Transition::with(
                state,
                Notice::warning(
                    "Please provide at least the subject, sender, or body to classify the email.",
                ),
            );
        }

        let engine = TriageEngine::new(self.contacts.list().iter().cloned());
        let result = engine.evaluate(&state.email);
        tracing::info!(category = %result.category, action = %result.action, "Classified email");

        let details = format!(
            "Category: {}\nAction: {}\nJustification: {}",
            result.category, result.action, result.justification
        );
        let mut transition = Transition::with(state.clone(), Notice::success("Classification complete"))
            .notice(Notice::info(details));

        if state.mailbox_configured && state.selected.is_some() {
            let folder = self.folders.folder_for(result.category);
            transition = transition.notice(Notice::info(format!(
                "The selected email can be moved to {}",
                folder
            )));
        }

        state.triage = Some(result);
        transition.state = state;
        transition
    }

    // ---- Mailbox ----

    async fn configure_mailbox(&mut self, mut state: SessionState) -> Transition {
        match self.mailbox.setup_folders(&self.folders).await {
            Ok(created) => {
                state.mailbox_configured = true;
                let mut transition = Transition::with(
                    state,
                    Notice::success("Successfully connected to email server!"),
                );
                if !created.is_empty() {
                    transition = transition
                        .notice(Notice::info(format!("Created folders: {}", created.join(", "))));
                }
                transition.notice(Notice::success("Email folders configured successfully!"))
            }
            Err(e) => Transition::with(
                state,
                Notice::error(format!("Error connecting to email server: {}", e)),
            ),
        }
    }

    async fn list_folders(&mut self, state: SessionState) -> Transition {
        let mapping: Vec<String> = self
            .folders
            .iter()
            .map(|(category, folder)| format!("{}: {}", category, folder))
            .collect();
        let transition = Transition::with(
            state,
            Notice::info(format!("Folder mapping:\n{}", mapping.join("\n"))),
        );

        match self.mailbox.list_folders().await {
            Ok(folders) => transition.notice(Notice::info(format!(
                "Server folders:\n{}",
                folders.join("\n")
            ))),
            Err(e) => transition.notice(Notice::error(format!(
                "Error connecting to email server: {}",
                e
            ))),
        }
    }

    async fn list_folder(
        &mut self,
        state: SessionState,
        folder: &str,
        limit: Option<usize>,
    ) -> Transition {
        let limit = limit.unwrap_or(self.search_limit);
        match self.mailbox.recent(folder, limit).await {
            Ok(messages) => Transition::with(state, listing_notice(folder, &messages)),
            Err(e) => Transition::with(
                state,
                Notice::error(format!("Error accessing folder {}: {}", folder, e)),
            ),
        }
    }

    async fn list_recent(&mut self, mut state: SessionState) -> Transition {
        match self.mailbox.recent(INBOX, self.search_limit).await {
            Ok(messages) => {
                let notice = listing_notice(INBOX, &messages);
                state.recent = messages;
                Transition::with(state, notice)
            }
            Err(e) => Transition::with(
                state,
                Notice::error(format!("Error accessing folder {}: {}", INBOX, e)),
            ),
        }
    }

    async fn select_email(&mut self, mut state: SessionState, id: MessageId) -> Transition {
        match self.mailbox.fetch(INBOX, &id).await {
            Ok(email) => {
                let notice = Notice::success(format!(
                    "Selected {}: {} - From: {}",
                    id, email.subject, email.sender
                ));
                state.email = email;
                state.selected = Some(id);
                state.triage = None;
                Transition::with(state, notice)
            }
            Err(ProviderError::NotFound(_)) => Transition::with(
                state,
                Notice::warning(format!("No email with id {} in {}", id, INBOX)),
            ),
            Err(e) => Transition::with(state, Notice::error(format!("Could not load email: {}", e))),
        }
    }

    async fn move_selected(&mut self, mut state: SessionState) -> Transition {
        let Some(id) = state.selected.clone() else {
            return Transition::with(state, Notice::warning("Select an email before moving it."));
        };
        let Some(category) = state.triage.as_ref().map(|t| t.category) else {
            return Transition::with(state, Notice::warning("Classify the email before moving it."));
        };

        let folder = self.folders.folder_for(category).to_string();
        match self.mailbox.move_message(&id, INBOX, &folder).await {
            Ok(()) => {
                state.selected = None;
                state.recent.retain(|m| m.id != id);
                Transition::with(state, Notice::success(format!("Moved email to {}", folder)))
            }
            Err(e) => Transition::with(state, move_failure(&id, &folder, &e)),
        }
    }

    async fn move_message(
        &mut self,
        mut state: SessionState,
        id: &MessageId,
        from: &str,
        to: &str,
    ) -> Transition {
        match self.mailbox.move_message(id, from, to).await {
            Ok(()) => {
                if from.eq_ignore_ascii_case(INBOX) {
                    state.recent.retain(|m| &m.id != id);
                }
                if state.selected.as_ref() == Some(id) {
                    state.selected = None;
                }
                Transition::with(state, Notice::success(format!("Moved email to {}", to)))
            }
            Err(e) => Transition::with(state, move_failure(id, to, &e)),
        }
    }

    // ---- Reply lifecycle ----

    async fn generate(&self, mut state: SessionState, regenerate: bool) -> Transition {
        let email_text = state.reply_source_text();
        if email_text.is_empty() {
            return Transition::with(
                state,
                Notice::warning("Please provide the email content to reply to."),
            );
        }

        let reply = self
            .replies
            .generate(&email_text, state.tone, state.important_info())
            .await;

        let provenance = match reply.source {
            ReplySource::Model { ref provider, ref model } => Notice::success(format!(
                "Reply {} with {} ({})",
                if regenerate { "regenerated" } else { "generated" },
                provider,
                model
            )),
            ReplySource::Template { ref reason } => Notice::info(format!(
                "Language model unavailable ({}); using a template reply.",
                reason
            )),
        };

        state.draft.set_generated(reply.text);
        let preview = Notice::info(state.draft.editing().to_string());
        Transition::with(state, provenance).notice(preview)
    }

    fn edit(mut state: SessionState, text: String) -> Transition {
        match state.draft.edit(text) {
            Ok(()) => Transition::with(state, Notice::info("Draft updated")),
            Err(e) => Transition::with(state, Notice::warning(e.to_string())),
        }
    }

    fn clear(mut state: SessionState) -> Transition {
        state.draft.clear();
        Transition::with(state, Notice::info("Draft cleared"))
    }

    async fn send(&self, mut state: SessionState) -> Transition {
        let recipient = state.email.sender_address();
        if recipient.is_empty() {
            return Transition::with(
                state,
                Notice::warning(
                    "Please enter the sender's email address (used as recipient for the reply).",
                ),
            );
        }
        if state.draft.editing().trim().is_empty() {
            return Transition::with(state, Notice::warning("There is no reply to send."));
        }

        let reply = OutgoingReply::reply_to(
            recipient.clone(),
            &state.email.subject,
            state.draft.editing(),
        );
        match self.sender.send(&reply).await {
            Ok(message_id) => {
                tracing::info!(to = %recipient, message_id = %message_id, "Reply sent");
                state.draft.clear();
                Transition::with(
                    state,
                    Notice::success(format!("Email sent successfully to {}", recipient)),
                )
            }
            Err(e) => {
                tracing::warn!(to = %recipient, error = %e, "Reply not sent");
                Transition::with(state, Notice::error(format!("Failed to send the email: {}", e)))
            }
        }
    }

    // ---- Model ----

    fn load_model(&mut self, state: SessionState, path: &Path) -> Transition {
        match ModelLoader::from_path(path) {
            Ok(model) => {
                let notice = Notice::success(format!(
                    "Loaded model with classes: {}",
                    model.labels().join(", ")
                ));
                self.classifier = Some(Box::new(model));
                Transition::with(state, notice)
            }
            Err(e) => Transition::with(
                state,
                Notice::error(format!("Could not load model {}: {}", path.display(), e)),
            ),
        }
    }

    fn classify_with_model(&self, state: SessionState, text: &str) -> Transition {
        let Some(model) = self.classifier.as_ref() else {
            return Transition::with(state, Notice::warning("No model loaded."));
        };
        if text.trim().is_empty() {
            return Transition::with(state, Notice::warning("Please provide text to classify."));
        }

        let notice = match model.predict(text) {
            Ok(prediction) => match prediction.confidence {
                Some(confidence) => Notice::success(format!(
                    "Predicted: {} (confidence {:.2})",
                    prediction.label, confidence
                )),
                None => Notice::success(format!("Predicted: {}", prediction.label)),
            },
            Err(e) => Notice::error(format!("Classification failed: {}", e)),
        };
        Transition::with(state, notice)
    }
}

fn listing_notice(folder: &str, messages: &[MessageSummary]) -> Notice {
    if messages.is_empty() {
        return Notice::info(format!("No recent emails in {}", folder));
    }
    let lines: Vec<String> = messages
        .iter()
        .map(|m| match m.date {
            Some(date) => format!("[{}] {} ({})", m.id, m.label(), date.format("%Y-%m-%d %H:%M")),
            None => format!("[{}] {}", m.id, m.label()),
        })
        .collect();
    Notice::info(format!("Recent emails in {}:\n{}", folder, lines.join("\n")))
}

fn move_failure(id: &MessageId, folder: &str, error: &ProviderError) -> Notice {
    match error {
        ProviderError::NotFound(_) => {
            Notice::warning(format!("Could not move {} to {}: {}", id, folder, error))
        }
        _ => Notice::error(format!("Could not move {} to {}: {}", id, folder, error)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::NoticeLevel;
    use crate::classifier::{LinearModelArtifact, MODEL_FORMAT};
    use crate::domain::{Category, Contact, EmailInput};
    use crate::providers::email::{InMemoryMailbox, MockMailSender};
    use pretty_assertions::assert_eq;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct MemoryStorage {
        saved: Arc<Mutex<Vec<Contact>>>,
    }

    impl ContactStorage for MemoryStorage {
        fn load(&self) -> Result<Vec<Contact>, ContactError> {
            Ok(self.saved.lock().unwrap().clone())
        }

        fn save_all(&self, contacts: &[Contact]) -> Result<(), ContactError> {
            *self.saved.lock().unwrap() = contacts.to_vec();
            Ok(())
        }
    }

    fn orchestrator(
        mailbox: InMemoryMailbox,
        sender: MockMailSender,
    ) -> Orchestrator<MemoryStorage, InMemoryMailbox> {
        Orchestrator::new(
            ContactService::open(MemoryStorage::default()),
            ReplyGenerator::template_only(),
            mailbox,
            Box::new(sender),
        )
    }

    fn idle() -> Orchestrator<MemoryStorage, InMemoryMailbox> {
        orchestrator(InMemoryMailbox::new(), MockMailSender::new())
    }

    fn levels(transition: &Transition) -> Vec<NoticeLevel> {
        transition.notices.iter().map(|n| n.level).collect()
    }

    async fn with_draft(orch: &mut Orchestrator<MemoryStorage, InMemoryMailbox>) -> SessionState {
        let state = SessionState::new();
        let state = orch.dispatch(state, Command::SetSender("Sam <sam@example.com>".into())).await.state;
        let state = orch.dispatch(state, Command::SetSubject("Lunch".into())).await.state;
        let state = orch.dispatch(state, Command::SetBody("Are you free Friday?".into())).await.state;
        orch.dispatch(state, Command::Generate).await.state
    }

    #[tokio::test]
    async fn generate_requires_content() {
        let mut orch = idle();
        let t = orch.dispatch(SessionState::new(), Command::Generate).await;
        assert_eq!(levels(&t), vec![NoticeLevel::Warning]);
        assert!(t.state.draft.is_empty());
    }

    #[tokio::test]
    async fn generate_fills_both_texts() {
        let mut orch = idle();
        let state = with_draft(&mut orch).await;
        assert!(!state.draft.generated().is_empty());
        assert_eq!(state.draft.generated(), state.draft.editing());
    }

    #[tokio::test]
    async fn edit_without_draft_is_rejected() {
        let mut orch = idle();
        let t = orch.dispatch(SessionState::new(), Command::Edit("hi".into())).await;
        assert_eq!(levels(&t), vec![NoticeLevel::Warning]);
        assert!(t.state.draft.is_empty());
    }

    #[tokio::test]
    async fn regenerate_discards_edits() {
        let mut orch = idle();
        let state = with_draft(&mut orch).await;
        let state = orch.dispatch(state, Command::Edit("My own words".into())).await.state;
        assert_eq!(state.draft.editing(), "My own words");

        let state = orch.dispatch(state, Command::Regenerate).await.state;
        assert_eq!(state.draft.generated(), state.draft.editing());
        assert_ne!(state.draft.editing(), "My own words");
    }

    #[tokio::test]
    async fn send_uses_edited_text_and_clears() {
        let mut sender = MockMailSender::new();
        sender
            .expect_send()
            .withf(|reply| {
                reply.to == "sam@example.com" && reply.subject == "Re: Lunch" && reply.body == "See you Friday"
            })
            .times(1)
            .returning(|_| Ok("<id@example.com>".to_string()));

        let mut orch = orchestrator(InMemoryMailbox::new(), sender);
        let state = with_draft(&mut orch).await;
        let state = orch.dispatch(state, Command::Edit("See you Friday".into())).await.state;

        let t = orch.dispatch(state, Command::Send).await;
        assert_eq!(levels(&t), vec![NoticeLevel::Success]);
        assert!(t.state.draft.is_empty());
        assert_eq!(t.state.draft.editing(), "");
    }

    #[tokio::test]
    async fn failed_send_keeps_state() {
        let mut sender = MockMailSender::new();
        sender
            .expect_send()
            .returning(|_| Err(ProviderError::Authentication("no password".to_string())));

        let mut orch = orchestrator(InMemoryMailbox::new(), sender);
        let before = with_draft(&mut orch).await;

        let t = orch.dispatch(before.clone(), Command::Send).await;
        assert_eq!(levels(&t), vec![NoticeLevel::Error]);
        assert_eq!(t.state, before);
    }

    #[tokio::test]
    async fn send_requires_recipient() {
        let mut sender = MockMailSender::new();
        sender.expect_send().times(0);
        let mut orch = orchestrator(InMemoryMailbox::new(), sender);

        let state = orch.dispatch(SessionState::new(), Command::SetBody("Hello".into())).await.state;
        let state = orch.dispatch(state, Command::Generate).await.state;
        let t = orch.dispatch(state.clone(), Command::Send).await;
        assert_eq!(levels(&t), vec![NoticeLevel::Warning]);
        assert_eq!(t.state, state);
    }

    #[tokio::test]
    async fn classify_blank_email_warns() {
        let mut orch = idle();
        let t = orch.dispatch(SessionState::new(), Command::Classify).await;
        assert_eq!(levels(&t), vec![NoticeLevel::Warning]);
        assert!(t.state.triage.is_none());
    }

    #[tokio::test]
    async fn classify_uses_current_contacts() {
        let mut orch = idle();
        let state = orch.dispatch(SessionState::new(), Command::AddContact("boss@work.com".into())).await.state;
        let state = orch.dispatch(state, Command::SetSender("Boss <boss@work.com>".into())).await.state;
        let state = orch.dispatch(state, Command::SetBody("Need this ASAP".into())).await.state;

        let t = orch.dispatch(state, Command::Classify).await;
        assert_eq!(t.state.triage.unwrap().category, Category::Urgent);
    }

    #[tokio::test]
    async fn changing_input_drops_stale_triage() {
        let mut orch = idle();
        let state = orch.dispatch(SessionState::new(), Command::SetSubject("Weekly update".into())).await.state;
        let state = orch.dispatch(state, Command::Classify).await.state;
        assert!(state.triage.is_some());

        let state = orch.dispatch(state, Command::SetBody("changed".into())).await.state;
        assert!(state.triage.is_none());
    }

    #[tokio::test]
    async fn duplicate_contact_warns() {
        let mut orch = idle();
        let state = orch.dispatch(SessionState::new(), Command::AddContact("a@b.com".into())).await.state;
        let t = orch.dispatch(state, Command::AddContact(" A@B.com ".into())).await;
        assert_eq!(levels(&t), vec![NoticeLevel::Warning]);
        assert_eq!(orch.contacts().count(), 1);

        let t = orch.dispatch(t.state, Command::AddContact("".into())).await;
        assert_eq!(t.notices[0].message, "Contact already present or empty");
    }

    #[tokio::test]
    async fn select_classify_and_move() {
        let mut mailbox = InMemoryMailbox::new();
        let id = mailbox.deliver(INBOX, EmailInput::new("Your invoice", "Amount due", "billing@shop.com"));
        let mut orch = orchestrator(mailbox, MockMailSender::new());

        let state = orch.dispatch(SessionState::new(), Command::ConfigureMailbox).await.state;
        assert!(state.mailbox_configured);

        let state = orch.dispatch(state, Command::ListRecent).await.state;
        assert_eq!(state.recent.len(), 1);

        let state = orch.dispatch(state, Command::SelectEmail(id.clone())).await.state;
        assert_eq!(state.email.subject, "Your invoice");
        assert_eq!(state.selected, Some(id));

        let state = orch.dispatch(state, Command::Classify).await.state;
        let t = orch.dispatch(state, Command::MoveSelected).await;
        assert_eq!(levels(&t), vec![NoticeLevel::Success]);
        assert!(t.state.selected.is_none());
        assert!(t.state.recent.is_empty());
        assert_eq!(orch.mailbox().count("Receipts"), 1);
        assert_eq!(orch.mailbox().count(INBOX), 0);
    }

    #[tokio::test]
    async fn move_requires_selection_and_triage() {
        let mut orch = idle();
        let t = orch.dispatch(SessionState::new(), Command::MoveSelected).await;
        assert_eq!(t.notices[0].message, "Select an email before moving it.");

        let mut state = SessionState::new();
        state.selected = Some(MessageId::from("1"));
        let t = orch.dispatch(state, Command::MoveSelected).await;
        assert_eq!(t.notices[0].message, "Classify the email before moving it.");
    }

    #[tokio::test]
    async fn move_missing_message_leaves_inbox() {
        let mut mailbox = InMemoryMailbox::new();
        mailbox.deliver(INBOX, EmailInput::new("Hi", "there", "a@b.com"));
        let mut orch = orchestrator(mailbox, MockMailSender::new());
        let state = orch.dispatch(SessionState::new(), Command::ConfigureMailbox).await.state;

        let t = orch
            .dispatch(
                state,
                Command::MoveMessage {
                    id: MessageId::from("123"),
                    from: INBOX.to_string(),
                    to: "Receipts".to_string(),
                },
            )
            .await;
        assert_eq!(levels(&t), vec![NoticeLevel::Warning]);
        assert_eq!(orch.mailbox().count(INBOX), 1);
    }

    #[tokio::test]
    async fn refused_login_is_reported() {
        let mut orch = orchestrator(InMemoryMailbox::new().refusing_login(), MockMailSender::new());
        let t = orch.dispatch(SessionState::new(), Command::ConfigureMailbox).await;
        assert_eq!(levels(&t), vec![NoticeLevel::Error]);
        assert!(!t.state.mailbox_configured);
    }

    #[tokio::test]
    async fn classify_with_model() {
        let mut orch = idle();
        let t = orch.dispatch(SessionState::new(), Command::ClassifyWithModel("free prize".into())).await;
        assert_eq!(t.notices[0].message, "No model loaded.");

        let artifact = LinearModelArtifact {
            format: MODEL_FORMAT.to_string(),
            classes: vec!["ham".to_string(), "spam".to_string()],
            vocabulary: [("free".to_string(), 0), ("prize".to_string(), 1)].into_iter().collect(),
            coefficients: vec![vec![2.0, 2.0]],
            intercepts: vec![0.0],
            idf: None,
            lowercase: true,
            probability: true,
        };
        let model = ModelLoader::from_artifact(artifact).unwrap();
        let mut orch = idle().with_classifier(Box::new(model));

        let t = orch.dispatch(t.state, Command::ClassifyWithModel("Free prize inside".into())).await;
        assert_eq!(levels(&t), vec![NoticeLevel::Success]);
        assert!(t.notices[0].message.starts_with("Predicted: spam"));
    }

    #[tokio::test]
    async fn bad_model_path_is_an_error_notice() {
        let mut orch = idle();
        let t = orch
            .dispatch(SessionState::new(), Command::LoadModel("/no/such/model.json".into()))
            .await;
        assert_eq!(levels(&t), vec![NoticeLevel::Error]);
        assert!(!orch.has_classifier());
    }
}
