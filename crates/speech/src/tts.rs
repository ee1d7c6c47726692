//! Hosted text-to-speech client

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use lingua_tutor_core::{Error, Language, Result, TextToSpeech};

/// TTS client configuration
#[derive(Debug, Clone)]
pub struct TtsConfig {
    /// API base URL, without a trailing slash
    pub base_url: String,
    /// Bearer token
    pub api_key: String,
    /// Synthesis model identifier
    pub model: String,
    /// Voice name
    pub voice: String,
    /// Request timeout
    pub timeout: Duration,
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: String::new(),
            model: "tts-1".to_string(),
            voice: "alloy".to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Speech synthesis client
pub struct HostedTts {
    client: reqwest::Client,
    config: TtsConfig,
}

#[derive(Serialize)]
struct SpeechRequest<'a> {
    model: &'a str,
    input: &'a str,
    voice: &'a str,
}

impl HostedTts {
    /// Create a client from config
    pub fn new(config: TtsConfig) -> Result<Self> {
        if config.api_key.is_empty() {
            return Err(Error::Config("TTS API key is empty".to_string()));
        }

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    fn speech_url(&self) -> String {
        format!("{}/audio/speech", self.config.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl TextToSpeech for HostedTts {
    async fn synthesize(&self, text: &str, language: Language) -> Result<Vec<u8>> {
        if text.trim().is_empty() {
            return Err(Error::input("synthesis text is empty"));
        }

        let body = SpeechRequest {
            model: &self.config.model,
            input: text,
            voice: &self.config.voice,
        };

        let response = self
            .client
            .post(self.speech_url())
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::unavailable(format!("synthesis request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(Error::Speech(format!(
                "synthesis API returned {}: {}",
                status,
                detail.chars().take(200).collect::<String>()
            )));
        }

        let audio = response
            .bytes()
            .await
            .map_err(|e| Error::Speech(format!("unreadable synthesis response: {}", e)))?;

        tracing::debug!(bytes = audio.len(), %language, "synthesis received");

        Ok(audio.to_vec())
    }

    fn content_type(&self) -> &'static str {
        "audio/mpeg"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_empty_api_key() {
        assert!(matches!(
            HostedTts::new(TtsConfig::default()),
            Err(Error::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_rejects_empty_text() {
        let tts = HostedTts::new(TtsConfig {
            api_key: "k".into(),
            ..Default::default()
        })
        .unwrap();

        let err = tts.synthesize("  ", Language::French).await.unwrap_err();
        assert!(matches!(err, Error::Input(_)));
    }
}
