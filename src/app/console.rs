//! Interactive session.
//!
//! Reads one line at a time, turns it into a [`Command`] and prints the
//! resulting notices. `body`, `info` and `edit` given without text read a
//! multi-line block terminated by a line holding a single `.`.

use std::io::Write;
use std::path::PathBuf;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use super::{Command, Orchestrator, SessionState};
use crate::domain::{MessageId, Tone, INBOX};
use crate::providers::email::Mailbox;
use crate::services::ContactStorage;

pub const HELP: &str = "\
Email input
  subject <text>          set the subject
  sender <address>        set the sender (the reply goes here)
  body [text]             set the body (no text: multi-line, end with '.')
  info [text]             extra information for the reply
  tone <name>             professional | friendly | apologetic | persuasive
Contacts
  contacts                list known contacts
  contact add <address>   add a known contact
  contact rm <address>    remove a known contact
Triage and mailbox
  classify                run the triage rules
  setup                   connect and create the mapped folders
  folders                 list server folders and the category mapping
  recent                  list the newest INBOX messages
  list <folder> [n]       list the newest messages of a folder
  select <id>             load an INBOX message
  move                    move the selected message to its category folder
  move <id> <from> <to>   move any message
Replies
  generate | regenerate   draft a reply
  edit [text]             replace the draft text (no text: multi-line)
  clear                   drop the draft
  send                    send the draft to the sender
Model
  model load <path>       load a classifier artifact
  model predict <text>    classify text with the loaded model
Other
  show                    print the current email and draft
  help                    this text
  quit                    leave the session";

/// What a line of input asks for.
#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleInput {
    Command(Command),
    /// Needs a multi-line block; the block becomes the command's text.
    Block(BlockTarget),
    Show,
    Help,
    Quit,
    Empty,
}

/// Commands that accept a multi-line block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockTarget {
    Body,
    Info,
    Edit,
}

impl BlockTarget {
    fn into_command(self, text: String) -> Command {
        match self {
            BlockTarget::Body => Command::SetBody(text),
            BlockTarget::Info => Command::SetImportantInfo(text),
            BlockTarget::Edit => Command::Edit(text),
        }
    }
}

/// Parses one line of console input.
pub fn parse_line(line: &str) -> Result<ConsoleInput, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(ConsoleInput::Empty);
    }

    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };
    let text = || rest.to_string();

    let command = match word.to_lowercase().as_str() {
        "quit" | "exit" => return Ok(ConsoleInput::Quit),
        "help" | "?" => return Ok(ConsoleInput::Help),
        "show" => return Ok(ConsoleInput::Show),

        "subject" => Command::SetSubject(text()),
        "sender" | "from" => Command::SetSender(text()),
        "body" if rest.is_empty() => return Ok(ConsoleInput::Block(BlockTarget::Body)),
        "body" => Command::SetBody(text()),
        "info" if rest.is_empty() => return Ok(ConsoleInput::Block(BlockTarget::Info)),
        "info" => Command::SetImportantInfo(text()),
        "tone" => Command::SetTone(rest.parse::<Tone>()?),

        "contacts" => Command::ListContacts,
        "contact" => parse_contact(rest)?,

        "classify" | "triage" => Command::Classify,
        "setup" => Command::ConfigureMailbox,
        "folders" => Command::ListFolders,
        "recent" => Command::ListRecent,
        "list" => parse_list(rest)?,
        "select" if !rest.is_empty() => Command::SelectEmail(MessageId::from(rest)),
        "select" => return Err("usage: select <id>".to_string()),
        "move" => parse_move(rest)?,

        "generate" => Command::Generate,
        "regenerate" => Command::Regenerate,
        "edit" if rest.is_empty() => return Ok(ConsoleInput::Block(BlockTarget::Edit)),
        "edit" => Command::Edit(text()),
        "clear" => Command::Clear,
        "send" => Command::Send,

        "model" => parse_model(rest)?,

        other => return Err(format!("unknown command '{}', try 'help'", other)),
    };

    Ok(ConsoleInput::Command(command))
}

fn parse_contact(rest: &str) -> Result<Command, String> {
    match rest.split_once(char::is_whitespace) {
        Some(("add", address)) => Ok(Command::AddContact(address.trim().to_string())),
        Some(("rm" | "remove", address)) => Ok(Command::RemoveContact(address.trim().to_string())),
        _ if rest == "add" => Ok(Command::AddContact(String::new())),
        _ => Err("usage: contact add|rm <address>".to_string()),
    }
}

fn parse_list(rest: &str) -> Result<Command, String> {
    let mut parts = rest.split_whitespace();
    let folder = parts.next().unwrap_or(INBOX).to_string();
    let limit = match parts.next() {
        Some(n) => Some(n.parse::<usize>().map_err(|_| format!("not a number: {}", n))?),
        None => None,
    };
    Ok(Command::ListFolder { folder, limit })
}

fn parse_move(rest: &str) -> Result<Command, String> {
    let parts: Vec<&str> = rest.split_whitespace().collect();
    match parts.as_slice() {
        [] => Ok(Command::MoveSelected),
        [id, from, to] => Ok(Command::MoveMessage {
            id: MessageId::from(*id),
            from: from.to_string(),
            to: to.to_string(),
        }),
        _ => Err("usage: move | move <id> <from> <to>".to_string()),
    }
}

fn parse_model(rest: &str) -> Result<Command, String> {
    match rest.split_once(char::is_whitespace) {
        Some(("load", path)) => Ok(Command::LoadModel(PathBuf::from(path.trim()))),
        Some(("predict", text)) => Ok(Command::ClassifyWithModel(text.trim().to_string())),
        _ => Err("usage: model load <path> | model predict <text>".to_string()),
    }
}

/// Renders the current email and draft for `show`.
pub fn describe(state: &SessionState) -> String {
    let or_dash = |s: &str| if s.trim().is_empty() { "-".to_string() } else { s.to_string() };
    let mut out = format!(
        "Subject: {}\nSender:  {}\nTone:    {}\nBody:\n{}\n",
        or_dash(state.email.subject.as_str()),
        or_dash(state.email.sender.as_str()),
        state.tone,
        or_dash(state.email.body.as_str()),
    );
    if let Some(info) = state.important_info() {
        out.push_str(&format!("Extra information:\n{}\n", info));
    }
    if let Some(ref id) = state.selected {
        out.push_str(&format!("Selected message: {}\n", id));
    }
    if let Some(ref triage) = state.triage {
        out.push_str(&format!("Triage: {} / {}\n", triage.category, triage.action));
    }
    if state.draft.is_empty() {
        out.push_str("Draft: none\n");
    } else {
        out.push_str(&format!("Draft ({:?}):\n{}\n", state.draft.phase(), state.draft.editing()));
    }
    out
}

/// Runs the interactive loop until `quit` or end of input, starting from
/// `state`. Returns the final state.
pub async fn run<S, M, R, W>(
    orchestrator: &mut Orchestrator<S, M>,
    mut state: SessionState,
    input: R,
    out: &mut W,
) -> std::io::Result<SessionState>
where
    S: ContactStorage,
    M: Mailbox,
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut lines = input.lines();

    writeln!(out, "MailBuddy session. Type 'help' for commands.")?;
    loop {
        write!(out, "> ")?;
        out.flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };

        let command = match parse_line(&line) {
            Ok(ConsoleInput::Command(command)) => command,
            Ok(ConsoleInput::Block(target)) => {
                writeln!(out, "(end with a line containing only '.')")?;
                let mut block = Vec::new();
                while let Some(line) = lines.next_line().await? {
                    if line.trim() == "." {
                        break;
                    }
                    block.push(line);
                }
                target.into_command(block.join("\n"))
            }
            Ok(ConsoleInput::Show) => {
                write!(out, "{}", describe(&state))?;
                continue;
            }
            Ok(ConsoleInput::Help) => {
                writeln!(out, "{}", HELP)?;
                continue;
            }
            Ok(ConsoleInput::Quit) => break,
            Ok(ConsoleInput::Empty) => continue,
            Err(message) => {
                writeln!(out, "[warn] {}", message)?;
                continue;
            }
        };

        if command.uses_mailbox() {
            writeln!(out, "Connecting to the mail server...")?;
        }
        let transition = orchestrator.dispatch(state, command).await;
        for notice in &transition.notices {
            writeln!(out, "{}", notice)?;
        }
        state = transition.state;
    }

    Ok(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Contact;
    use crate::providers::email::{InMemoryMailbox, MockMailSender};
    use crate::services::{ContactError, ContactService, ReplyGenerator};
    use pretty_assertions::assert_eq;

    struct NullStorage;

    impl ContactStorage for NullStorage {
        fn load(&self) -> Result<Vec<Contact>, ContactError> {
            Ok(Vec::new())
        }

        fn save_all(&self, _contacts: &[Contact]) -> Result<(), ContactError> {
            Ok(())
        }
    }

    fn command(line: &str) -> Command {
        match parse_line(line).unwrap() {
            ConsoleInput::Command(command) => command,
            other => panic!("expected a command, got {:?}", other),
        }
    }

    #[test]
    fn parses_input_setters() {
        assert_eq!(command("subject  Lunch plans "), Command::SetSubject("Lunch plans".into()));
        assert_eq!(command("sender a@b.com"), Command::SetSender("a@b.com".into()));
        assert_eq!(command("tone Friendly"), Command::SetTone(Tone::Friendly));
        assert!(parse_line("tone sarcastic").is_err());
    }

    #[test]
    fn bare_body_starts_a_block() {
        assert_eq!(parse_line("body").unwrap(), ConsoleInput::Block(BlockTarget::Body));
        assert_eq!(command("body Hello"), Command::SetBody("Hello".into()));
        assert_eq!(parse_line("edit").unwrap(), ConsoleInput::Block(BlockTarget::Edit));
    }

    #[test]
    fn parses_mailbox_commands() {
        assert_eq!(
            command("list Receipts 3"),
            Command::ListFolder {
                folder: "Receipts".into(),
                limit: Some(3)
            }
        );
        assert_eq!(
            command("list"),
            Command::ListFolder {
                folder: INBOX.into(),
                limit: None
            }
        );
        assert_eq!(command("move"), Command::MoveSelected);
        assert_eq!(
            command("move 7 INBOX Archive"),
            Command::MoveMessage {
                id: MessageId::from("7"),
                from: INBOX.into(),
                to: "Archive".into()
            }
        );
        assert!(parse_line("move 7 INBOX").is_err());
        assert!(parse_line("list INBOX many").is_err());
    }

    #[test]
    fn parses_contact_and_model_commands() {
        assert_eq!(command("contact add x@y.com"), Command::AddContact("x@y.com".into()));
        assert_eq!(command("contact rm x@y.com"), Command::RemoveContact("x@y.com".into()));
        assert_eq!(
            command("model load ./spam.json"),
            Command::LoadModel(PathBuf::from("./spam.json"))
        );
        assert_eq!(
            command("model predict win a prize"),
            Command::ClassifyWithModel("win a prize".into())
        );
        assert!(parse_line("contact list").is_err());
    }

    #[test]
    fn control_words() {
        assert_eq!(parse_line("  ").unwrap(), ConsoleInput::Empty);
        assert_eq!(parse_line("QUIT").unwrap(), ConsoleInput::Quit);
        assert_eq!(parse_line("help").unwrap(), ConsoleInput::Help);
        assert!(parse_line("frobnicate").is_err());
    }

    #[tokio::test]
    async fn scripted_session() {
        let mut orchestrator = Orchestrator::new(
            ContactService::open(NullStorage),
            ReplyGenerator::template_only(),
            InMemoryMailbox::new(),
            Box::new(MockMailSender::new()),
        );
        let script = "sender a@b.com\nbody\nHello,\ncan we talk?\n.\ngenerate\nedit Sure thing\nshow\nquit\n";
        let mut out = Vec::new();

        let state = run(&mut orchestrator, SessionState::new(), script.as_bytes(), &mut out).await.unwrap();

        assert_eq!(state.email.body, "Hello,\ncan we talk?");
        assert_eq!(state.draft.editing(), "Sure thing");
        let printed = String::from_utf8(out).unwrap();
        assert!(printed.contains("[info] Language model unavailable"));
        assert!(printed.contains("Draft (Editing):\nSure thing"));
    }
}
