//! Generative-text backends used to draft commit messages and PR content.
//!
//! Every backend implements [`TextGenerator`]. Failures are [`GenerationError`]s,
//! which the workflow always treats as retryable.

mod anthropic;
mod ollama;
mod openai;
pub mod prompt;

pub use anthropic::AnthropicClient;
pub use ollama::OllamaClient;
pub use openai::OpenAiClient;

use std::time::Duration;

use async_trait::async_trait;

use crate::config::{Config, Provider};
use crate::Result;

/// Hosted backends answer well within this.
pub const HOSTED_TIMEOUT: Duration = Duration::from_secs(30);
/// Local models are slower to warm up.
pub const LOCAL_TIMEOUT: Duration = Duration::from_secs(60);

pub const COMMIT_MAX_TOKENS: u32 = 1024;
pub const PR_MAX_TOKENS: u32 = 2048;

/// One generation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub prompt: String,
    pub model: String,
    pub max_tokens: u32,
}

#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("Error making request: {0}")]
    Request(String),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("API error ({status}): {body}")]
    Status { status: u16, body: String },

    #[error("Error parsing response: {0}")]
    Parse(String),

    #[error("No content in API response")]
    EmptyResponse,

    #[error("Error getting git log: {0}")]
    Context(String),
}

impl From<reqwest::Error> for GenerationError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            GenerationError::Parse(err.to_string())
        } else {
            GenerationError::Request(err.to_string())
        }
    }
}

/// A provider-agnostic text generation backend.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> std::result::Result<String, GenerationError>;

    /// Upper bound on one `generate` call.
    fn timeout(&self) -> Duration {
        HOSTED_TIMEOUT
    }

    fn name(&self) -> &str;
}

/// Build the backend selected by the effective configuration.
///
/// Fails only on setup problems, like a missing API key for a hosted provider.
pub fn from_config(config: &Config) -> Result<Box<dyn TextGenerator>> {
    Ok(match config.provider {
        Provider::Anthropic => Box::new(AnthropicClient::from_env()?),
        Provider::Ollama => Box::new(OllamaClient::new(&config.ollama_url)),
        Provider::OpenAi => {
            let key = config
                .openai_api_key
                .clone()
                .filter(|k| !k.is_empty())
                .or_else(|| std::env::var("OPENAI_API_KEY").ok());
            Box::new(OpenAiClient::new(config.openai_url(), key))
        }
    })
}

/// Trim and reject empty completions.
pub(crate) fn non_empty_text(text: &str) -> std::result::Result<String, GenerationError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(GenerationError::EmptyResponse);
    }
    Ok(trimmed.to_string())
}
