//! Reply drafting.
//!
//! [`ReplyGenerator`] asks the configured language model for a reply and falls
//! back to a canned, tone-specific template whenever the model is missing or
//! the call fails. Drafting therefore never errors.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::domain::Tone;
use crate::providers::ai::{CompletionRequest, LlmError, LlmProvider};

/// Where a generated reply came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReplySource {
    /// Produced by a language model.
    Model { provider: String, model: String },
    /// Produced by the built-in template.
    Template { reason: String },
}

impl ReplySource {
    pub fn is_template(&self) -> bool {
        matches!(self, ReplySource::Template { .. })
    }
}

/// A drafted reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedReply {
    pub text: String,
    pub source: ReplySource,
}

/// Builds the prompt sent to the model.
pub fn build_prompt(email_text: &str, tone: Tone, important_info: Option<&str>) -> String {
    let tone = tone.as_str().to_lowercase();
    let mut prompt = format!(
        "Write a reply to the following email using a {tone} tone. \
         Make sure the response is professional and contextually appropriate.\n\n\
         Email content to respond to:\n{email_text}\n\n\
         Instructions:\n\
         1. Use a {tone} tone throughout the response\n\
         2. Ensure the response is clear and concise\n\
         3. Address all points from the original email\n\
         4. Include an appropriate greeting and closing\n"
    );

    if let Some(info) = important_info.map(str::trim).filter(|i| !i.is_empty()) {
        prompt.push_str(&format!(
            "\nAdditional important information to include in the reply:\n{}\n",
            info
        ));
    }

    prompt
}

/// Deterministic reply used when no model output is available.
pub fn template_reply(tone: Tone, important_info: Option<&str>) -> String {
    let (greeting, message, closing) = match tone {
        Tone::Professional => (
            "Hello,",
            "Thank you for your email. I have received your message and will follow up with a detailed response shortly.",
            "Best regards,",
        ),
        Tone::Friendly => (
            "Hi there,",
            "Thanks so much for reaching out! I got your message and will get back to you soon.",
            "Cheers,",
        ),
        Tone::Apologetic => (
            "Hello,",
            "Thank you for your email, and I apologize for any inconvenience this may have caused. I am looking into it and will follow up shortly.",
            "Sincerely,",
        ),
        Tone::Persuasive => (
            "Hello,",
            "Thank you for your email. I am confident we can find an approach that works well for everyone, and I would welcome the chance to discuss next steps.",
            "Best regards,",
        ),
    };

    let mut reply = format!("{}\n\n{}", greeting, message);
    if let Some(info) = important_info.map(str::trim).filter(|i| !i.is_empty()) {
        reply.push_str("\n\n");
        reply.push_str(info);
    }
    reply.push_str("\n\n");
    reply.push_str(closing);
    reply
}

/// Drafts replies with an optional LLM provider.
pub struct ReplyGenerator {
    provider: Option<Arc<dyn LlmProvider>>,
    timeout: Duration,
    temperature: f32,
    max_tokens: Option<usize>,
}

impl ReplyGenerator {
    /// Creates a generator. `None` means every reply uses the template.
    pub fn new(provider: Option<Arc<dyn LlmProvider>>) -> Self {
        Self {
            provider,
            timeout: Duration::from_secs(30),
            temperature: 0.7,
            max_tokens: None,
        }
    }

    /// Creates a generator that only uses the template.
    pub fn template_only() -> Self {
        Self::new(None)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: Option<usize>) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Name and model of the configured provider, if any.
    pub fn provider_label(&self) -> Option<String> {
        self.provider
            .as_ref()
            .map(|p| format!("{} ({})", p.name(), p.model()))
    }

    /// Drafts a reply. Never fails; see [`ReplySource`] for provenance.
    pub async fn generate(
        &self,
        email_text: &str,
        tone: Tone,
        important_info: Option<&str>,
    ) -> GeneratedReply {
        let Some(provider) = self.provider.as_ref() else {
            tracing::warn!("No language model configured, using template reply");
            return Self::fallback(tone, important_info, "no language model configured".to_string());
        };

        match self.call_model(provider.as_ref(), email_text, tone, important_info).await {
            Ok(text) => GeneratedReply {
                text,
                source: ReplySource::Model {
                    provider: provider.name().to_string(),
                    model: provider.model().to_string(),
                },
            },
            Err(e) => {
                tracing::warn!(provider = provider.name(), error = %e, "Reply generation failed, using template");
                Self::fallback(tone, important_info, e.to_string())
            }
        }
    }

    async fn call_model(
        &self,
        provider: &dyn LlmProvider,
        email_text: &str,
        tone: Tone,
        important_info: Option<&str>,
    ) -> Result<String, LlmError> {
        let mut request = CompletionRequest::new(build_prompt(email_text, tone, important_info))
            .with_temperature(self.temperature);
        if let Some(max_tokens) = self.max_tokens {
            request = request.with_max_tokens(max_tokens);
        }

        let response = tokio::time::timeout(self.timeout, provider.complete(&request))
            .await
            .map_err(|_| LlmError::Timeout(self.timeout.as_secs()))??;

        let text = response.text.trim();
        if text.is_empty() {
            return Err(LlmError::InvalidResponse("model returned no text".to_string()));
        }
        Ok(text.to_string())
    }

    fn fallback(tone: Tone, important_info: Option<&str>, reason: String) -> GeneratedReply {
        GeneratedReply {
            text: template_reply(tone, important_info),
            source: ReplySource::Template { reason },
        }
    }
}
