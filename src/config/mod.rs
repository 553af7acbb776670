//! Configuration and settings management.
//!
//! Settings are stored in the user's config directory as JSON and can be
//! overridden from the environment. Credentials are resolved separately by
//! [`Secrets`] so they never end up in the settings file.

mod secrets;
mod settings;

pub use secrets::{
    SecretStore, Secrets, GOOGLE_API_KEY_VAR, OPENAI_API_KEY_VAR, PASSWORD_VARS,
};
pub use settings::{
    AiProviderKind, AiSettings, MailSettings, Result, Settings, SettingsError, CONTACTS_FILE,
    SETTINGS_FILE,
};
