//! Core types and traits for the lingua-tutor practice server
//!
//! This crate provides foundational types used across all other crates:
//! - Target-language handling
//! - Utterance pairs and pronunciation feedback
//! - Error types
//! - Collaborator traits (language model, speech, entitlements)

pub mod error;
pub mod feedback;
pub mod language;
pub mod traits;
pub mod utterance;

pub use error::{Error, Result};
pub use feedback::{PronunciationFeedback, WordScore};
pub use language::Language;
pub use traits::{
    EntitlementCheck, Feature, GenerateRequest, GenerateResponse, LanguageModel, Message, Role,
    SpeechToText, TextToSpeech,
};
pub use utterance::UtterancePair;
