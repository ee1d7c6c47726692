//! Collaborator traits
//!
//! All external services are consumed through these traits so the scoring
//! pipeline and dialogue orchestrator stay fully unit-testable without
//! network access. Concrete clients are constructed at startup and injected
//! as `Arc<dyn ...>` — no module-scope singletons.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::Result;
use crate::language::Language;

/// Message role for model requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::System => write!(f, "system"),
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// Chat message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Request to a language model backend
#[derive(Debug, Clone, Default)]
pub struct GenerateRequest {
    /// Conversation to complete
    pub messages: Vec<Message>,

    /// Maximum tokens to generate
    pub max_tokens: Option<u32>,

    /// Sampling temperature
    pub temperature: Option<f32>,

    /// Ask the backend for a JSON object response
    pub json_output: bool,
}

/// Response from a language model backend
#[derive(Debug, Clone)]
pub struct GenerateResponse {
    /// Generated text
    pub text: String,

    /// Model identifier reported by the backend, if any
    pub model: Option<String>,
}

/// Language model abstraction
///
/// Call failures (network, auth, timeout) surface as `Error::Unavailable`.
/// The caller owns interpretation of the generated text.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Generate a completion for the given request
    async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse>;

    /// Backend name for logging
    fn name(&self) -> &str;
}

/// Speech-to-text abstraction
#[async_trait]
pub trait SpeechToText: Send + Sync {
    /// Transcribe raw audio bytes into text
    async fn transcribe(&self, audio: Vec<u8>, language: Language) -> Result<String>;
}

/// Text-to-speech abstraction
#[async_trait]
pub trait TextToSpeech: Send + Sync {
    /// Synthesize text into audio bytes
    async fn synthesize(&self, text: &str, language: Language) -> Result<Vec<u8>>;

    /// MIME type of the produced audio
    fn content_type(&self) -> &'static str;
}

/// A gated feature of the practice server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    /// Single-sentence pronunciation scoring
    SentencePractice,
    /// Scripted dialogue sessions
    Dialogue,
    /// Free-form conversational replies
    Conversation,
    /// STT/TTS proxying
    Speech,
}

impl Feature {
    pub fn as_str(&self) -> &'static str {
        match self {
            Feature::SentencePractice => "sentence_practice",
            Feature::Dialogue => "dialogue",
            Feature::Conversation => "conversation",
            Feature::Speech => "speech",
        }
    }
}

/// Entitlement gate, evaluated before the core pipeline runs
#[async_trait]
pub trait EntitlementCheck: Send + Sync {
    /// Whether the learner may use the given feature
    async fn has_access(&self, learner_id: &str, feature: Feature) -> Result<bool>;
}
