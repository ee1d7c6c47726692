//! Hosted speech-to-text client

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use lingua_tutor_core::{Error, Language, Result, SpeechToText};

/// STT client configuration
#[derive(Debug, Clone)]
pub struct SttConfig {
    /// API base URL, without a trailing slash
    pub base_url: String,
    /// Bearer token
    pub api_key: String,
    /// Transcription model identifier
    pub model: String,
    /// Request timeout
    pub timeout: Duration,
}

impl Default for SttConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: String::new(),
            model: "whisper-1".to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Whisper-style transcription client
pub struct HostedStt {
    client: reqwest::Client,
    config: SttConfig,
}

#[derive(Deserialize)]
struct TranscriptionResponse {
    text: String,
}

impl HostedStt {
    /// Create a client from config
    pub fn new(config: SttConfig) -> Result<Self> {
        if config.api_key.is_empty() {
            return Err(Error::Config("STT API key is empty".to_string()));
        }

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    fn transcriptions_url(&self) -> String {
        format!(
            "{}/audio/transcriptions",
            self.config.base_url.trim_end_matches('/')
        )
    }
}

#[async_trait]
impl SpeechToText for HostedStt {
    async fn transcribe(&self, audio: Vec<u8>, language: Language) -> Result<String> {
        if audio.is_empty() {
            return Err(Error::input("audio payload is empty"));
        }

        let file_part = reqwest::multipart::Part::bytes(audio)
            .file_name("audio.wav")
            .mime_str("audio/wav")
            .map_err(|e| Error::Speech(format!("invalid audio part: {}", e)))?;

        let form = reqwest::multipart::Form::new()
            .part("file", file_part)
            .text("model", self.config.model.clone())
            .text("language", language.code().to_string());

        let response = self
            .client
            .post(self.transcriptions_url())
            .bearer_auth(&self.config.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| Error::unavailable(format!("transcription request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(Error::Speech(format!(
                "transcription API returned {}: {}",
                status,
                detail.chars().take(200).collect::<String>()
            )));
        }

        let parsed: TranscriptionResponse = response
            .json()
            .await
            .map_err(|e| Error::Speech(format!("unreadable transcription response: {}", e)))?;

        tracing::debug!(chars = parsed.text.len(), %language, "transcription received");

        Ok(parsed.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_empty_api_key() {
        assert!(matches!(
            HostedStt::new(SttConfig::default()),
            Err(Error::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_rejects_empty_audio() {
        let stt = HostedStt::new(SttConfig {
            api_key: "k".into(),
            ..Default::default()
        })
        .unwrap();

        let err = stt.transcribe(Vec::new(), Language::English).await.unwrap_err();
        assert!(matches!(err, Error::Input(_)));
    }
}
