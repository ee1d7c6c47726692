//! OpenAI-compatible chat completions backend

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use lingua_tutor_core::{Error, GenerateRequest, GenerateResponse, LanguageModel, Message, Result};

/// Backend configuration
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    /// API base URL, without a trailing slash
    pub base_url: String,
    /// Bearer token
    pub api_key: String,
    /// Model identifier
    pub model: String,
    /// Request timeout
    pub timeout: Duration,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: String::new(),
            model: "gpt-4o-mini".to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Chat-completions client
///
/// Constructed once at startup and injected wherever a model is needed; the
/// inner `reqwest::Client` is pooled and thread-safe.
pub struct OpenAiBackend {
    client: reqwest::Client,
    config: OpenAiConfig,
}

impl OpenAiBackend {
    /// Create a backend from config
    pub fn new(config: OpenAiConfig) -> Result<Self> {
        if config.api_key.is_empty() {
            return Err(Error::Config("OpenAI API key is empty".to_string()));
        }

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
    #[serde(default)]
    model: Option<String>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[async_trait]
impl LanguageModel for OpenAiBackend {
    async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse> {
        let body = ChatCompletionRequest {
            model: &self.config.model,
            messages: &request.messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            response_format: request.json_output.then_some(ResponseFormat {
                format_type: "json_object",
            }),
        };

        let response = self
            .client
            .post(self.completions_url())
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::unavailable(format!("model request timed out: {}", e))
                } else {
                    Error::unavailable(format!("model request failed: {}", e))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            tracing::warn!(%status, "model API returned an error");
            return Err(Error::unavailable(format!(
                "model API returned {}: {}",
                status,
                detail.chars().take(200).collect::<String>()
            )));
        }

        let parsed: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| Error::unavailable(format!("unreadable model API response: {}", e)))?;

        let text = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| Error::unavailable("model API returned no completion"))?;

        Ok(GenerateResponse {
            text,
            model: parsed.model,
        })
    }

    fn name(&self) -> &str {
        &self.config.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_empty_api_key() {
        let config = OpenAiConfig::default();
        assert!(matches!(OpenAiBackend::new(config), Err(Error::Config(_))));
    }

    #[test]
    fn test_completions_url_normalizes_slash() {
        let backend = OpenAiBackend::new(OpenAiConfig {
            api_key: "k".into(),
            base_url: "https://example.test/v1/".into(),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(backend.completions_url(), "https://example.test/v1/chat/completions");
    }

    #[test]
    fn test_request_serialization() {
        let messages = vec![Message::system("s"), Message::user("u")];
        let body = ChatCompletionRequest {
            model: "test-model",
            messages: &messages,
            temperature: Some(0.2),
            max_tokens: None,
            response_format: Some(ResponseFormat {
                format_type: "json_object",
            }),
        };

        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["model"], "test-model");
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["response_format"]["type"], "json_object");
        assert!(json.get("max_tokens").is_none());
    }
}
