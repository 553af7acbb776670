//! Application settings and configuration types.
//!
//! Settings are persisted to `settings.json` in the user's config directory
//! (`~/.config/mailbuddy` or the platform equivalent) and loaded at startup.
//! Every section has defaults, so a partial or missing file is fine.

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::domain::FolderMapping;

/// Name of the settings file inside the config directory.
pub const SETTINGS_FILE: &str = "settings.json";

/// Name of the contacts file inside the data directory.
pub const CONTACTS_FILE: &str = "known_contacts.json";

/// Errors that can occur while loading or saving settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Failed to read settings: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid settings file {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Invalid value for {key}: {value}")]
    InvalidEnv { key: String, value: String },

    #[error("Invalid AI base URL {url}: {message}")]
    InvalidUrl { url: String, message: String },

    #[error("Could not determine a home directory")]
    NoHomeDirectory,
}

/// Result type for settings operations.
pub type Result<T> = std::result::Result<T, SettingsError>;

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("io", "mailbuddy", "mailbuddy")
}

/// Top-level application settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Mail account and server settings.
    pub mail: MailSettings,
    /// Language model configuration.
    pub ai: AiSettings,
    /// Where known contacts are stored. Defaults to the data directory.
    pub contacts_path: Option<PathBuf>,
    /// Category to folder mapping used by triage moves.
    pub folder_mapping: FolderMapping,
    /// How many messages a folder listing shows.
    pub search_limit: usize,
    /// Upper bound for every network call, in seconds.
    pub request_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            mail: MailSettings::default(),
            ai: AiSettings::default(),
            contacts_path: None,
            folder_mapping: FolderMapping::default(),
            search_limit: 5,
            request_timeout_secs: 30,
        }
    }
}

impl Settings {
    /// Default location of the settings file.
    pub fn default_path() -> Result<PathBuf> {
        project_dirs()
            .map(|dirs| dirs.config_dir().join(SETTINGS_FILE))
            .ok_or(SettingsError::NoHomeDirectory)
    }

    /// Loads settings from the default location.
    pub fn load() -> Result<Self> {
        Self::load_from(Self::default_path()?)
    }

    /// Loads settings from `path`. A missing file yields defaults.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No settings file, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(e.into()),
        };

        serde_json::from_str(&contents).map_err(|e| SettingsError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Writes settings as pretty JSON, creating parent directories.
    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|e| SettingsError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Applies environment overrides using the process environment.
    pub fn with_env(mut self) -> Result<Self> {
        self.apply_env(|key| std::env::var(key).ok())?;
        Ok(self)
    }

    /// Applies overrides from `lookup`, which maps a variable name to its value.
    ///
    /// Recognized variables: `MAILBUDDY_EMAIL` (or `SENDER_EMAIL`),
    /// `MAILBUDDY_IMAP_SERVER`, `MAILBUDDY_IMAP_PORT`, `MAILBUDDY_SMTP_SERVER`
    /// (or `SMTP_SERVER`), `MAILBUDDY_SMTP_PORT` (or `SMTP_PORT`),
    /// `OPENAI_MODEL` and `OPENAI_BASE_URL`. Secrets are handled by
    /// [`Secrets`](super::Secrets).
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        let get = |keys: &[&str]| {
            keys.iter()
                .find_map(|key| {
                    lookup(*key)
                        .map(|v| v.trim().to_string())
                        .filter(|v| !v.is_empty())
                        .map(|v| (key.to_string(), v))
                })
        };

        if let Some((_, address)) = get(&["MAILBUDDY_EMAIL", "SENDER_EMAIL"]) {
            self.mail.address = address;
        }
        if let Some((_, host)) = get(&["MAILBUDDY_IMAP_SERVER"]) {
            self.mail.imap_server = host;
        }
        if let Some((key, port)) = get(&["MAILBUDDY_IMAP_PORT"]) {
            self.mail.imap_port = parse_port(&key, &port)?;
        }
        if let Some((_, host)) = get(&["MAILBUDDY_SMTP_SERVER", "SMTP_SERVER"]) {
            self.mail.smtp_server = host;
        }
        if let Some((key, port)) = get(&["MAILBUDDY_SMTP_PORT", "SMTP_PORT"]) {
            self.mail.smtp_port = parse_port(&key, &port)?;
        }

        if let Some((_, model)) = get(&["OPENAI_MODEL"]) {
            if self.ai.provider == AiProviderKind::OpenAi {
                self.ai.model = Some(model);
            }
        }
        if let Some((_, base_url)) = get(&["OPENAI_BASE_URL"]) {
            if self.ai.provider == AiProviderKind::OpenAi {
                self.ai.base_url = Some(base_url);
            }
        }

        Ok(())
    }

    /// Checks values serde cannot check on its own.
    pub fn validate(&self) -> Result<()> {
        if let Some(ref base_url) = self.ai.base_url {
            let parsed = url::Url::parse(base_url).map_err(|e| SettingsError::InvalidUrl {
                url: base_url.clone(),
                message: e.to_string(),
            })?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(SettingsError::InvalidUrl {
                    url: base_url.clone(),
                    message: format!("unsupported scheme '{}'", parsed.scheme()),
                });
            }
        }
        Ok(())
    }

    /// Resolved contacts file location.
    pub fn contacts_path(&self) -> Result<PathBuf> {
        if let Some(ref path) = self.contacts_path {
            return Ok(path.clone());
        }
        project_dirs()
            .map(|dirs| dirs.data_dir().join(CONTACTS_FILE))
            .ok_or(SettingsError::NoHomeDirectory)
    }

    /// Request timeout as a [`Duration`].
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}

fn parse_port(key: &str, value: &str) -> Result<u16> {
    value.parse().map_err(|_| SettingsError::InvalidEnv {
        key: key.to_string(),
        value: value.to_string(),
    })
}

/// Mail account configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MailSettings {
    /// Account address, used as the IMAP/SMTP login and the sender.
    pub address: String,
    /// IMAP host (implicit TLS).
    pub imap_server: String,
    pub imap_port: u16,
    /// SMTP host.
    pub smtp_server: String,
    /// 465 means implicit TLS; anything else uses STARTTLS.
    pub smtp_port: u16,
    /// Name shown in the `From` header.
    pub display_name: Option<String>,
}

impl Default for MailSettings {
    fn default() -> Self {
        Self {
            address: String::new(),
            imap_server: "imap.gmail.com".to_string(),
            imap_port: 993,
            smtp_server: "smtp.gmail.com".to_string(),
            smtp_port: 465,
            display_name: None,
        }
    }
}

impl MailSettings {
    /// Whether an account address has been configured.
    pub fn has_account(&self) -> bool {
        !self.address.trim().is_empty()
    }
}

/// Which language model backend drafts replies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AiProviderKind {
    /// Google Gemini.
    #[default]
    Gemini,
    /// OpenAI or any OpenAI-compatible endpoint.
    #[serde(rename = "openai")]
    OpenAi,
}

impl AiProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AiProviderKind::Gemini => "gemini",
            AiProviderKind::OpenAi => "openai",
        }
    }
}

impl std::str::FromStr for AiProviderKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "gemini" | "google" => Ok(AiProviderKind::Gemini),
            "openai" => Ok(AiProviderKind::OpenAi),
            other => Err(format!("unknown AI provider '{}'", other)),
        }
    }
}

/// Language model settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AiSettings {
    /// Backend used for reply drafting.
    pub provider: AiProviderKind,
    /// Model identifier; the provider default when unset.
    pub model: Option<String>,
    /// Custom API base URL (OpenAI-compatible endpoints, proxies).
    pub base_url: Option<String>,
    /// Sampling temperature (0.0 - 1.0).
    pub temperature: f32,
    /// Maximum tokens to generate.
    pub max_tokens: Option<usize>,
}

impl Default for AiSettings {
    fn default() -> Self {
        Self {
            provider: AiProviderKind::Gemini,
            model: None,
            base_url: None,
            temperature: 0.7,
            max_tokens: None,
        }
    }
}
