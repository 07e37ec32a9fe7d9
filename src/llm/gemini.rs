//! Google Gemini `generateContent` client.

use super::{http_client, TextGenerator};
use crate::config::ModelConfig;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Gemini API request.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    response_mime_type: &'static str,
}

/// Gemini API response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

impl GenerateResponse {
    /// Concatenated text parts of the first candidate.
    fn into_text(self) -> Result<String> {
        let Some(candidate) = self.candidates.into_iter().next() else {
            let reason = self
                .prompt_feedback
                .and_then(|f| f.block_reason)
                .unwrap_or_else(|| "none given".to_string());
            return Err(Error::MalformedResponse(format!(
                "no candidates returned (block reason: {})",
                reason
            )));
        };

        Ok(candidate
            .content
            .map(|c| {
                c.parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default())
    }
}

/// Client for the Gemini REST API.
pub struct GeminiClient {
    http_client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
    temperature: f32,
    timeout_seconds: u64,
}

impl GeminiClient {
    /// Build a client, reading the API key from the configured env var.
    pub fn from_config(config: &ModelConfig) -> Result<Self> {
        let api_key = config.api_key()?;
        Self::with_api_key(config, api_key)
    }

    pub fn with_api_key(config: &ModelConfig, api_key: String) -> Result<Self> {
        Ok(Self {
            http_client: http_client(config.timeout_seconds)?,
            base_url: config.effective_base_url(),
            model: config.name.clone(),
            api_key,
            temperature: config.temperature,
            timeout_seconds: config.timeout_seconds,
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }
}

impl TextGenerator for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let url = self.endpoint();

        let request = GenerateRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![Part { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: self.temperature,
                response_mime_type: "application/json",
            },
        };

        debug!("Sending Gemini request ({} prompt bytes)", prompt.len());

        let response = self
            .http_client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::from_transport(e, &self.base_url, self.timeout_seconds))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Service(format!("Gemini API error {}: {}", status, body)));
        }

        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|e| Error::Service(format!("Failed to decode Gemini response: {}", e)))?;

        let text = body.into_text()?;
        debug!("Gemini returned {} bytes", text.len());
        Ok(text)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> ModelConfig {
        ModelConfig {
            base_url: Some("http://127.0.0.1:9".to_string()),
            timeout_seconds: 2,
            ..ModelConfig::default()
        }
    }

    #[test]
    fn test_endpoint() {
        let client = GeminiClient::with_api_key(&ModelConfig::default(), "k".to_string()).unwrap();
        assert_eq!(
            client.endpoint(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent"
        );
    }

    #[test]
    fn test_request_shape() {
        let request = GenerateRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![Part { text: "hello" }],
            }],
            generation_config: GenerationConfig {
                temperature: 0.5,
                response_mime_type: "application/json",
            },
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["contents"][0]["parts"][0]["text"], "hello");
        assert_eq!(json["generationConfig"]["temperature"], 0.5);
        assert_eq!(
            json["generationConfig"]["responseMimeType"],
            "application/json"
        );
    }

    #[test]
    fn test_response_text_joins_parts() {
        let body: GenerateResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"{\"analysis\":"},{"text":"\"ok\"}"}]}}]}"#,
        )
        .unwrap();
        assert_eq!(body.into_text().unwrap(), r#"{"analysis":"ok"}"#);
    }

    #[test]
    fn test_blocked_response_is_malformed() {
        let body: GenerateResponse =
            serde_json::from_str(r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#).unwrap();
        let err = body.into_text().unwrap_err();
        assert!(matches!(err, Error::MalformedResponse(ref m) if m.contains("SAFETY")));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_service_error() {
        let client = GeminiClient::with_api_key(&test_config(), "k".to_string()).unwrap();
        let err = client.generate("prompt").await.unwrap_err();
        assert!(matches!(err, Error::Service(_)));
    }
}
