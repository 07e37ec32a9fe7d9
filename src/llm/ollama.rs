//! Ollama chat client.
//!
//! Non-streaming `/api/chat` with JSON output requested.

use super::{http_client, TextGenerator};
use crate::config::ModelConfig;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Message in the chat history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

/// Ollama chat API request.
#[derive(Debug, Serialize)]
struct OllamaChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    stream: bool,
    format: &'static str,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
}

/// Ollama chat API response.
#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    message: ChatMessage,
}

/// Client for an Ollama server.
pub struct OllamaClient {
    http_client: reqwest::Client,
    base_url: String,
    model: String,
    temperature: f32,
    timeout_seconds: u64,
}

impl OllamaClient {
    pub fn from_config(config: &ModelConfig) -> Result<Self> {
        Ok(Self {
            http_client: http_client(config.timeout_seconds)?,
            base_url: config.effective_base_url(),
            model: config.name.clone(),
            temperature: config.temperature,
            timeout_seconds: config.timeout_seconds,
        })
    }

    fn build_request(&self, prompt: &str) -> OllamaChatRequest {
        OllamaChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: prompt.to_string(),
                },
            ],
            stream: false,
            format: "json",
            options: OllamaOptions {
                temperature: self.temperature,
            },
        }
    }
}

impl TextGenerator for OllamaClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/api/chat", self.base_url);
        let request = self.build_request(prompt);

        debug!("Sending Ollama request ({} prompt bytes)", prompt.len());

        let response = self
            .http_client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::from_transport(e, &self.base_url, self.timeout_seconds))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Service(format!("Ollama API error {}: {}", status, body)));
        }

        let chat_response: OllamaChatResponse = response
            .json()
            .await
            .map_err(|e| Error::Service(format!("Failed to decode Ollama response: {}", e)))?;

        Ok(chat_response.message.content)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// System prompt; the user prompt carries the data and schema.
const SYSTEM_PROMPT: &str = "You are an educational data analyst. \
Only output valid JSON, no explanations or markdown.";

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Provider;

    fn test_config(url: &str) -> ModelConfig {
        ModelConfig {
            provider: Provider::Ollama,
            name: "llama3.2:latest".to_string(),
            base_url: Some(url.to_string()),
            timeout_seconds: 2,
            ..ModelConfig::default()
        }
    }

    #[test]
    fn test_request_shape() {
        let client = OllamaClient::from_config(&test_config("http://localhost:11434")).unwrap();
        let json = serde_json::to_value(client.build_request("grades")).unwrap();

        assert_eq!(json["model"], "llama3.2:latest");
        assert_eq!(json["stream"], false);
        assert_eq!(json["format"], "json");
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "grades");
    }

    #[test]
    fn test_response_decoding() {
        let body: OllamaChatResponse = serde_json::from_str(
            r#"{"model":"m","message":{"role":"assistant","content":"{}"},"done":true}"#,
        )
        .unwrap();
        assert_eq!(body.message.content, "{}");
    }

    #[test]
    fn test_unreachable_server_is_service_error() {
        let client = OllamaClient::from_config(&test_config("http://127.0.0.1:9")).unwrap();
        let result = tokio_test::block_on(client.generate("prompt"));
        assert!(matches!(result, Err(Error::Service(_))));
    }
}
