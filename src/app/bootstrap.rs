//! Builds the services from settings and credentials.

use std::sync::Arc;

use super::Orchestrator;
use crate::config::{AiProviderKind, Secrets, Settings};
use crate::providers::ai::{
    GeminiProvider, LlmProvider, OpenAiCompatibleProvider, DEFAULT_GEMINI_MODEL,
    DEFAULT_OPENAI_MODEL,
};
use crate::providers::email::{ImapConfig, ImapMailbox, SmtpConfig, SmtpSender, SMTPS_PORT};
use crate::services::{ContactService, ReplyGenerator};
use crate::storage::JsonFileStorage;

/// IMAP settings for the configured account.
pub fn imap_config(settings: &Settings, secrets: &Secrets) -> ImapConfig {
    let mail = &settings.mail;
    let config = ImapConfig::tls(&mail.imap_server, &mail.address)
        .with_port(mail.imap_port)
        .with_timeout(settings.request_timeout());
    match secrets.mail_password {
        Some(ref password) => config.with_password(password),
        None => config,
    }
}

/// SMTP settings for the configured account.
pub fn smtp_config(settings: &Settings, secrets: &Secrets) -> SmtpConfig {
    let mail = &settings.mail;
    let base = if mail.smtp_port == SMTPS_PORT {
        SmtpConfig::tls(&mail.smtp_server, &mail.address)
    } else {
        SmtpConfig::starttls(&mail.smtp_server, &mail.address)
    };

    let mut config = base
        .with_port(mail.smtp_port)
        .with_timeout(settings.request_timeout());
    if let Some(ref name) = mail.display_name {
        config = config.with_display_name(name);
    }
    if let Some(ref password) = secrets.mail_password {
        config = config.with_password(password);
    }
    config
}

/// The configured language model, or `None` when no API key is available.
pub fn llm_provider(settings: &Settings, secrets: &Secrets) -> Option<Arc<dyn LlmProvider>> {
    let Some(api_key) = secrets.ai_api_key.clone() else {
        tracing::info!(
            provider = settings.ai.provider.as_str(),
            "No API key found, replies will use templates"
        );
        return None;
    };
    let ai = &settings.ai;

    let provider: Arc<dyn LlmProvider> = match ai.provider {
        AiProviderKind::Gemini => {
            let model = ai.model.as_deref().unwrap_or(DEFAULT_GEMINI_MODEL);
            let provider = GeminiProvider::new(api_key, model);
            match ai.base_url {
                Some(ref url) => Arc::new(provider.with_base_url(url)),
                None => Arc::new(provider),
            }
        }
        AiProviderKind::OpenAi => {
            let model = ai.model.as_deref().unwrap_or(DEFAULT_OPENAI_MODEL);
            match ai.base_url {
                Some(ref url) => Arc::new(OpenAiCompatibleProvider::custom(url, Some(api_key), model)),
                None => Arc::new(OpenAiCompatibleProvider::openai(api_key, model)),
            }
        }
    };

    tracing::info!(provider = provider.name(), model = provider.model(), "Language model configured");
    Some(provider)
}

/// Reply generator with the settings' sampling options.
pub fn reply_generator(settings: &Settings, secrets: &Secrets) -> ReplyGenerator {
    ReplyGenerator::new(llm_provider(settings, secrets))
        .with_timeout(settings.request_timeout())
        .with_temperature(settings.ai.temperature)
        .with_max_tokens(settings.ai.max_tokens)
}

/// Wires a full orchestrator against the real mail servers.
pub fn orchestrator(
    settings: &Settings,
    secrets: &Secrets,
    contacts: JsonFileStorage,
) -> Orchestrator<JsonFileStorage, ImapMailbox> {
    Orchestrator::new(
        ContactService::open(contacts),
        reply_generator(settings, secrets),
        ImapMailbox::new(imap_config(settings, secrets)),
        Box::new(SmtpSender::new(smtp_config(settings, secrets))),
    )
    .with_folders(settings.folder_mapping.clone())
    .with_search_limit(settings.search_limit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn settings() -> Settings {
        let mut settings = Settings::default();
        settings.mail.address = "me@example.com".to_string();
        settings.request_timeout_secs = 12;
        settings
    }

    fn secrets(password: Option<&str>, key: Option<&str>) -> Secrets {
        Secrets {
            mail_password: password.map(str::to_string),
            ai_api_key: key.map(str::to_string),
        }
    }

    #[test]
    fn imap_config_uses_account_and_timeout() {
        let config = imap_config(&settings(), &secrets(Some("pw"), None));
        assert_eq!(config.host, "imap.gmail.com");
        assert_eq!(config.port, 993);
        assert_eq!(config.username, "me@example.com");
        assert_eq!(config.password.as_deref(), Some("pw"));
        assert_eq!(config.timeout, Duration::from_secs(12));
    }

    #[test]
    fn smtp_port_selects_tls_mode() {
        let implicit = smtp_config(&settings(), &secrets(None, None));
        assert!(implicit.uses_implicit_tls());
        assert!(implicit.password.is_none());

        let mut submission = settings();
        submission.mail.smtp_port = 587;
        submission.mail.display_name = Some("Me".to_string());
        let config = smtp_config(&submission, &secrets(Some("pw"), None));
        assert!(!config.uses_implicit_tls());
        assert_eq!(config.port, 587);
        assert_eq!(config.display_name.as_deref(), Some("Me"));
    }

    #[test]
    fn no_api_key_means_no_provider() {
        assert!(llm_provider(&settings(), &secrets(None, None)).is_none());
        assert!(reply_generator(&settings(), &secrets(None, None))
            .provider_label()
            .is_none());
    }

    #[test]
    fn provider_defaults_follow_kind() {
        let gemini = llm_provider(&settings(), &secrets(None, Some("key"))).unwrap();
        assert_eq!(gemini.name(), "gemini");
        assert_eq!(gemini.model(), DEFAULT_GEMINI_MODEL);

        let mut openai = settings();
        openai.ai.provider = AiProviderKind::OpenAi;
        openai.ai.model = Some("gpt-4o-mini".to_string());
        let provider = llm_provider(&openai, &secrets(None, Some("key"))).unwrap();
        assert_eq!(provider.model(), "gpt-4o-mini");
    }
}
