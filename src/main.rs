//! mailbuddy - command-line entry point

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};

use mailbuddy::app::{bootstrap, console, Command, Orchestrator, SessionState};
use mailbuddy::config::{SecretStore, Secrets, Settings};
use mailbuddy::domain::{MessageId, Tone, INBOX};
use mailbuddy::providers::email::ImapMailbox;
use mailbuddy::storage::{Credential, JsonFileStorage, KeychainAccess};

type LiveOrchestrator = Orchestrator<JsonFileStorage, ImapMailbox>;

#[derive(Debug, Parser)]
#[command(name = "mailbuddy", version, about = "Triage email and draft replies")]
struct Cli {
    /// Settings file to use instead of the one in the config directory.
    #[arg(long, global = true, env = "MAILBUDDY_CONFIG")]
    config: Option<PathBuf>,

    /// Known-contacts file to use instead of the configured one.
    #[arg(long, global = true)]
    contacts: Option<PathBuf>,

    #[command(subcommand)]
    command: Cmd,
}

#[derive(Debug, Subcommand)]
enum Cmd {
    /// Manage known contacts.
    Contacts {
        #[command(subcommand)]
        action: ContactsCmd,
    },
    /// Run the triage rules on an email.
    Triage {
        #[arg(long, default_value = "")]
        subject: String,
        /// Body text, or `-` to read it from stdin.
        #[arg(long, default_value = "")]
        body: String,
        #[arg(long, default_value = "")]
        sender: String,
    },
    /// Mailbox folders.
    Folders {
        #[command(subcommand)]
        action: FoldersCmd,
    },
    /// Move a message to another folder.
    Move {
        id: String,
        to: String,
        #[arg(long, default_value = INBOX)]
        from: String,
    },
    /// Draft a reply and optionally send it.
    Reply {
        #[arg(long, default_value = "")]
        subject: String,
        /// Body text, or `-` to read it from stdin.
        #[arg(long)]
        body: String,
        /// Original sender; the reply goes to this address.
        #[arg(long, default_value = "")]
        sender: String,
        #[arg(long, default_value_t = Tone::Professional)]
        tone: Tone,
        /// Extra information the reply should include.
        #[arg(long)]
        info: Option<String>,
        /// Send the draft right away.
        #[arg(long)]
        send: bool,
    },
    /// Classify text with a trained model artifact.
    Classify {
        #[arg(long)]
        model: PathBuf,
        #[arg(required = true)]
        text: Vec<String>,
    },
    /// Start an interactive session.
    Session {
        /// Model artifact to load at startup.
        #[arg(long)]
        model: Option<PathBuf>,
    },
    /// Store or delete credentials in the OS keychain.
    Secret {
        #[command(subcommand)]
        action: SecretCmd,
    },
}

#[derive(Debug, Subcommand)]
enum ContactsCmd {
    List,
    Add { address: String },
    Remove { address: String },
}

#[derive(Debug, Subcommand)]
enum FoldersCmd {
    /// Create any missing category folders.
    Setup,
    /// List server folders and the category mapping.
    List,
    /// Show the newest messages in a folder.
    Show {
        #[arg(default_value = INBOX)]
        folder: String,
        #[arg(long)]
        limit: Option<usize>,
    },
}

#[derive(Debug, Subcommand)]
enum SecretCmd {
    /// Read a secret from stdin and store it.
    Set { kind: SecretKind },
    Delete { kind: SecretKind },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SecretKind {
    /// Mailbox password (IMAP and SMTP).
    Mail,
    /// API key for the configured AI provider.
    Ai,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let mut settings = match cli.config {
        Some(ref path) => Settings::load_from(path),
        None => Settings::load(),
    }
    .context("loading settings")?;
    settings.apply_env(|key| std::env::var(key).ok())?;
    if let Some(path) = cli.contacts {
        settings.contacts_path = Some(path);
    }
    settings.validate()?;

    let keychain = KeychainAccess::new();

    match cli.command {
        Cmd::Secret { action } => manage_secret(&settings, &keychain, action).await,
        Cmd::Session { model } => {
            let mut orchestrator = open(&settings, &keychain).await?;
            let mut state = SessionState::new();
            if let Some(path) = model {
                state = run_script(&mut orchestrator, state, vec![Command::LoadModel(path)])
                    .await
                    .0;
            }

            let stdin = BufReader::new(tokio::io::stdin());
            console::run(&mut orchestrator, state, stdin, &mut std::io::stdout()).await?;
            Ok(ExitCode::SUCCESS)
        }
        other => {
            let commands = one_shot(other).await?;
            let mut orchestrator = open(&settings, &keychain).await?;
            let (_, ok) = run_script(&mut orchestrator, SessionState::new(), commands).await;
            Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
        }
    }
}

async fn open(settings: &Settings, keychain: &KeychainAccess) -> Result<LiveOrchestrator> {
    let secrets = Secrets::resolve(settings, Some(keychain as &dyn SecretStore)).await;
    let contacts = JsonFileStorage::new(settings.contacts_path()?);
    tracing::debug!(contacts = %contacts.path().display(), "Opening contacts");
    Ok(bootstrap::orchestrator(settings, &secrets, contacts))
}

/// Translates a subcommand into the commands it runs.
async fn one_shot(command: Cmd) -> Result<Vec<Command>> {
    let commands = match command {
        Cmd::Contacts { action } => match action {
            ContactsCmd::List => vec![Command::ListContacts],
            ContactsCmd::Add { address } => vec![Command::AddContact(address)],
            ContactsCmd::Remove { address } => vec![Command::RemoveContact(address)],
        },
        Cmd::Triage {
            subject,
            body,
            sender,
        } => vec![
            Command::SetSubject(subject),
            Command::SetBody(read_body(body).await?),
            Command::SetSender(sender),
            Command::Classify,
        ],
        Cmd::Folders { action } => match action {
            FoldersCmd::Setup => vec![Command::ConfigureMailbox],
            FoldersCmd::List => vec![Command::ListFolders],
            FoldersCmd::Show { folder, limit } => vec![Command::ListFolder { folder, limit }],
        },
        Cmd::Move { id, to, from } => vec![Command::MoveMessage {
            id: MessageId::from(id),
            from,
            to,
        }],
        Cmd::Reply {
            subject,
            body,
            sender,
            tone,
            info,
            send,
        } => {
            let mut commands = vec![
                Command::SetSubject(subject),
                Command::SetBody(read_body(body).await?),
                Command::SetSender(sender),
                Command::SetTone(tone),
                Command::SetImportantInfo(info.unwrap_or_default()),
                Command::Generate,
            ];
            if send {
                commands.push(Command::Send);
            }
            commands
        }
        Cmd::Classify { model, text } => vec![
            Command::LoadModel(model),
            Command::ClassifyWithModel(text.join(" ")),
        ],
        Cmd::Session { .. } | Cmd::Secret { .. } => bail!("not a one-shot command"),
    };
    Ok(commands)
}

/// Dispatches `commands` in order, printing notices. Stops at the first
/// warning or error and reports whether every command went through.
async fn run_script(
    orchestrator: &mut LiveOrchestrator,
    mut state: SessionState,
    commands: Vec<Command>,
) -> (SessionState, bool) {
    for command in commands {
        let transition = orchestrator.dispatch(state, command).await;
        let mut failed = false;
        for notice in &transition.notices {
            if notice.is_problem() {
                failed = true;
                eprintln!("{}", notice);
            } else {
                println!("{}", notice);
            }
        }
        state = transition.state;
        if failed {
            return (state, false);
        }
    }
    (state, true)
}

async fn read_body(body: String) -> Result<String> {
    if body != "-" {
        return Ok(body);
    }
    let mut buf = String::new();
    tokio::io::stdin()
        .read_to_string(&mut buf)
        .await
        .context("reading body from stdin")?;
    Ok(buf)
}

async fn manage_secret(
    settings: &Settings,
    keychain: &KeychainAccess,
    action: SecretCmd,
) -> Result<ExitCode> {
    let credential = |kind: SecretKind| -> Result<Credential> {
        match kind {
            SecretKind::Mail => {
                if !settings.mail.has_account() {
                    bail!("set mail.address in settings or MAILBUDDY_EMAIL first");
                }
                Ok(Credential::mail_password(&settings.mail.address))
            }
            SecretKind::Ai => Ok(Credential::api_key(settings.ai.provider.as_str())),
        }
    };

    match action {
        SecretCmd::Set { kind } => {
            let credential = credential(kind)?;
            eprintln!("Enter the {} and press enter:", credential);
            let mut line = String::new();
            BufReader::new(tokio::io::stdin())
                .read_line(&mut line)
                .await
                .context("reading secret from stdin")?;
            let value = line.trim();
            if value.is_empty() {
                bail!("empty value, nothing stored");
            }
            keychain.store(&credential, value).await?;
            println!("Stored {}", credential);
        }
        SecretCmd::Delete { kind } => {
            let credential = credential(kind)?;
            keychain.delete(&credential).await?;
            println!("Deleted {}", credential);
        }
    }
    Ok(ExitCode::SUCCESS)
}
