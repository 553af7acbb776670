//! AI/LLM provider implementations.
//!
//! This module provides a unified interface for the language models used to
//! draft replies.
//!
//! # Supported Providers
//!
//! - **Gemini**: Google's `generateContent` API
//! - **OpenAI-compatible**: OpenAI and any endpoint exposing `/chat/completions`
//!
//! # Example
//!
//! ```rust,no_run
//! use mailbuddy::providers::ai::{
//!     CompletionRequest, GeminiProvider, LlmProvider, DEFAULT_GEMINI_MODEL,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let gemini = GeminiProvider::new("AIza...", DEFAULT_GEMINI_MODEL);
//!
//! let request = CompletionRequest::new("Hello!");
//! let response = gemini.complete(&request).await?;
//! println!("Response: {}", response.text);
//! # Ok(())
//! # }
//! ```

mod gemini;
mod openai;
mod traits;

pub use gemini::{GeminiProvider, DEFAULT_GEMINI_MODEL};
pub use openai::{OpenAiCompatibleProvider, DEFAULT_OPENAI_MODEL, OPENAI_BASE_URL};
pub use traits::{
    CompletionRequest, CompletionResponse, FinishReason, LlmError, LlmProvider, LlmResult,
    TokenUsage,
};
