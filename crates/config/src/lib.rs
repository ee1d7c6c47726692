//! Configuration for the lingua-tutor practice server
//!
//! Settings are layered: `config/default` file, then an optional
//! environment-specific file, then `LINGUA_TUTOR`-prefixed environment
//! variables with `__` as the section separator.

mod settings;

pub use settings::{
    load_settings, AuthConfig, FeatureFlags, LlmConfig, LlmProvider, ObservabilityConfig,
    RateLimitConfig, ScoringConfig, ScyllaSettings, ServerConfig, Settings, SpeechConfig,
    SpeechProvider, StorageConfig, StorageProvider, SttSettings, TtsSettings,
};

use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}
