//! Speech services
//!
//! Hosted HTTP clients implementing the core `SpeechToText` and
//! `TextToSpeech` traits, plus simulated stand-ins so the rest of the server
//! works without API keys.

pub mod simulated;
pub mod stt;
pub mod tts;

pub use simulated::SimulatedSpeech;
pub use stt::{HostedStt, SttConfig};
pub use tts::{HostedTts, TtsConfig};
