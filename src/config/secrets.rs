//! Credential resolution.
//!
//! Secrets come from the environment first and the OS keychain second. A
//! secret that is found nowhere stays `None`; callers decide what that means
//! (template replies without an API key, an authentication error without a
//! mail password).

use async_trait::async_trait;

use super::{AiProviderKind, Settings};
use crate::storage::{Credential, KeychainAccess, KeychainError};

/// Environment variables holding the mailbox password, in lookup order.
pub const PASSWORD_VARS: &[&str] = &["MAILBUDDY_PASSWORD", "EMAIL_PASSWORD"];

/// Environment variable holding the Gemini API key.
pub const GOOGLE_API_KEY_VAR: &str = "GOOGLE_API_KEY";

/// Environment variable holding the OpenAI API key.
pub const OPENAI_API_KEY_VAR: &str = "OPENAI_API_KEY";

/// Read access to a secret store.
#[async_trait]
pub trait SecretStore: Send + Sync {
    async fn retrieve(&self, credential: &Credential) -> Result<Option<String>, KeychainError>;
}

#[async_trait]
impl SecretStore for KeychainAccess {
    async fn retrieve(&self, credential: &Credential) -> Result<Option<String>, KeychainError> {
        KeychainAccess::retrieve(self, credential).await
    }
}

/// Credentials needed at runtime.
#[derive(Clone, Default)]
pub struct Secrets {
    pub mail_password: Option<String>,
    pub ai_api_key: Option<String>,
}

impl std::fmt::Debug for Secrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Secrets")
            .field("mail_password", &self.mail_password.as_ref().map(|_| "***"))
            .field("ai_api_key", &self.ai_api_key.as_ref().map(|_| "***"))
            .finish()
    }
}

impl Secrets {
    /// Resolves secrets from the process environment, then `store`.
    pub async fn resolve(settings: &Settings, store: Option<&dyn SecretStore>) -> Self {
        Self::resolve_with(settings, |key| std::env::var(key).ok(), store).await
    }

    /// Resolves secrets from `lookup`, then `store`.
    pub async fn resolve_with(
        settings: &Settings,
        lookup: impl Fn(&str) -> Option<String>,
        store: Option<&dyn SecretStore>,
    ) -> Self {
        let from_env = |vars: &[&str]| {
            vars.iter()
                .filter_map(|var| lookup(*var))
                .map(|v| v.trim().to_string())
                .find(|v| !v.is_empty())
        };

        let mut mail_password = from_env(PASSWORD_VARS);
        if mail_password.is_none() && settings.mail.has_account() {
            let credential = Credential::mail_password(&settings.mail.address);
            mail_password = from_store(store, &credential).await;
        }

        let provider = settings.ai.provider;
        let var = match provider {
            AiProviderKind::Gemini => GOOGLE_API_KEY_VAR,
            AiProviderKind::OpenAi => OPENAI_API_KEY_VAR,
        };
        let mut ai_api_key = from_env(&[var]);
        if ai_api_key.is_none() {
            let credential = Credential::api_key(provider.as_str());
            ai_api_key = from_store(store, &credential).await;
        }

        tracing::debug!(
            mail_password = mail_password.is_some(),
            ai_api_key = ai_api_key.is_some(),
            provider = provider.as_str(),
            "Resolved credentials"
        );

        Self {
            mail_password,
            ai_api_key,
        }
    }
}

async fn from_store(store: Option<&dyn SecretStore>, credential: &Credential) -> Option<String> {
    let store = store?;
    match store.retrieve(credential).await {
        Ok(value) => value.filter(|v| !v.is_empty()),
        Err(e) => {
            tracing::warn!(credential = %credential, error = %e, "Keychain lookup failed");
            None
        }
    }
}
