//! OS keychain storage for the mailbox password and AI API keys.
//!
//! Each [`Credential`] maps to one keyring entry under the MailBuddy service
//! name. The platform backends are synchronous, so every call runs on the
//! blocking pool.

use std::fmt;

use thiserror::Error;

/// Errors that can occur during keychain operations.
#[derive(Debug, Error)]
pub enum KeychainError {
    #[error("keychain error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("no {0} stored in the keychain")]
    NotFound(Credential),

    #[error("keychain task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Result type for keychain operations.
pub type Result<T> = std::result::Result<T, KeychainError>;

/// A secret MailBuddy keeps in the keychain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credential {
    /// Password of a mail account, shared by IMAP and SMTP.
    MailPassword { address: String },
    /// API key of a language model provider.
    ApiKey { provider: String },
}

impl Credential {
    pub fn mail_password(address: &str) -> Self {
        Credential::MailPassword {
            address: address.trim().to_lowercase(),
        }
    }

    pub fn api_key(provider: &str) -> Self {
        Credential::ApiKey {
            provider: provider.trim().to_lowercase(),
        }
    }

    /// Keyring account name the credential is stored under.
    pub fn entry_name(&self) -> String {
        match self {
            Credential::MailPassword { address } => format!("mail.password.{}", address),
            Credential::ApiKey { provider } => format!("ai.api_key.{}", provider),
        }
    }
}

impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credential::MailPassword { address } => write!(f, "mail password for {}", address),
            Credential::ApiKey { provider } => write!(f, "{} API key", provider),
        }
    }
}

/// Handle on the MailBuddy keyring service.
#[derive(Debug, Clone)]
pub struct KeychainAccess {
    service: String,
}

impl Default for KeychainAccess {
    fn default() -> Self {
        Self::new()
    }
}

impl KeychainAccess {
    /// Keyring service name for MailBuddy credentials.
    pub const SERVICE: &'static str = "io.mailbuddy.cli";

    pub fn new() -> Self {
        Self {
            service: Self::SERVICE.to_string(),
        }
    }

    #[cfg(all(test, feature = "keychain-integration-tests"))]
    fn with_service(service: &str) -> Self {
        Self {
            service: service.to_string(),
        }
    }

    /// Runs `op` against the credential's keyring entry on the blocking pool.
    async fn with_entry<T, F>(&self, credential: &Credential, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(keyring::Entry) -> Result<T> + Send + 'static,
    {
        let service = self.service.clone();
        let name = credential.entry_name();
        tokio::task::spawn_blocking(move || op(keyring::Entry::new(&service, &name)?)).await?
    }

    /// Stores a credential, replacing any previous value.
    pub async fn store(&self, credential: &Credential, value: &str) -> Result<()> {
        let value = value.to_string();
        self.with_entry(credential, move |entry| Ok(entry.set_password(&value)?))
            .await?;
        tracing::info!(credential = %credential, "Stored credential in keychain");
        Ok(())
    }

    /// Reads a credential; `None` when nothing is stored.
    pub async fn retrieve(&self, credential: &Credential) -> Result<Option<String>> {
        self.with_entry(credential, |entry| match entry.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e.into()),
        })
        .await
    }

    /// Removes a credential.
    ///
    /// # Errors
    ///
    /// Returns [`KeychainError::NotFound`] when nothing is stored for it.
    pub async fn delete(&self, credential: &Credential) -> Result<()> {
        let missing = credential.clone();
        self.with_entry(credential, move |entry| match entry.delete_credential() {
            Ok(()) => Ok(()),
            Err(keyring::Error::NoEntry) => Err(KeychainError::NotFound(missing)),
            Err(e) => Err(e.into()),
        })
        .await?;
        tracing::info!(credential = %credential, "Deleted credential from keychain");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn mail_password_is_normalized() {
        let credential = Credential::mail_password(" Me@Example.com ");
        assert_eq!(credential.entry_name(), "mail.password.me@example.com");
        assert_eq!(credential.to_string(), "mail password for me@example.com");
    }

    #[test]
    fn api_key_entry_name() {
        let credential = Credential::api_key("Gemini");
        assert_eq!(credential.entry_name(), "ai.api_key.gemini");
        assert_eq!(credential.to_string(), "gemini API key");
    }

    #[test]
    fn not_found_names_the_credential() {
        let err = KeychainError::NotFound(Credential::api_key("openai"));
        assert_eq!(err.to_string(), "no openai API key stored in the keychain");
    }

    // Hits the real OS keychain; needs OS permissions.
    // Run with: cargo test --features keychain-integration-tests -- --ignored
    #[cfg(feature = "keychain-integration-tests")]
    mod integration {
        use super::*;

        #[tokio::test]
        #[ignore = "requires OS keychain access"]
        async fn store_retrieve_delete_cycle() {
            let keychain = KeychainAccess::with_service("io.mailbuddy.test");
            let credential = Credential::mail_password("test@example.com");

            keychain.store(&credential, "test-secret-value").await.unwrap();
            let retrieved = keychain.retrieve(&credential).await.unwrap();
            assert_eq!(retrieved.as_deref(), Some("test-secret-value"));

            keychain.delete(&credential).await.unwrap();
            assert_eq!(keychain.retrieve(&credential).await.unwrap(), None);
            assert!(matches!(
                keychain.delete(&credential).await,
                Err(KeychainError::NotFound(_))
            ));
        }
    }
}
