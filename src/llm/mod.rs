//! Text-generation clients.
//!
//! The report generator only needs "prompt in, text out". Each provider
//! implements [`TextGenerator`]; [`ModelClient`] picks one from config.

pub mod gemini;
pub mod ollama;

pub use gemini::GeminiClient;
pub use ollama::OllamaClient;

use crate::config::{ModelConfig, Provider};
use crate::error::Result;
use tracing::info;

/// A single-shot text-generation service.
#[allow(async_fn_in_trait)]
pub trait TextGenerator {
    /// Send one prompt and return the raw text the model produced.
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Model identifier, recorded in report metadata.
    fn model_name(&self) -> &str;
}

/// The configured provider.
pub enum ModelClient {
    Gemini(GeminiClient),
    Ollama(OllamaClient),
}

impl ModelClient {
    /// Build the client for `config.provider`.
    ///
    /// Fails with a configuration error when credentials are missing.
    pub fn from_config(config: &ModelConfig) -> Result<Self> {
        info!(
            "Initializing {:?} client with model {}",
            config.provider, config.name
        );

        match config.provider {
            Provider::Gemini => Ok(ModelClient::Gemini(GeminiClient::from_config(config)?)),
            Provider::Ollama => Ok(ModelClient::Ollama(OllamaClient::from_config(config)?)),
        }
    }
}

impl TextGenerator for ModelClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        match self {
            ModelClient::Gemini(client) => client.generate(prompt).await,
            ModelClient::Ollama(client) => client.generate(prompt).await,
        }
    }

    fn model_name(&self) -> &str {
        match self {
            ModelClient::Gemini(client) => client.model_name(),
            ModelClient::Ollama(client) => client.model_name(),
        }
    }
}

/// Build the shared reqwest client used by every provider.
pub(crate) fn http_client(timeout_seconds: u64) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_seconds))
        .build()
        .map_err(|e| crate::error::Error::Configuration(format!("HTTP client: {}", e)))
}
