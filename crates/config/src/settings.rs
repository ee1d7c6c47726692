//! Main settings module

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Pronunciation scoring configuration
    #[serde(default)]
    pub scoring: ScoringConfig,

    /// Language model backend
    #[serde(default)]
    pub llm: LlmConfig,

    /// Speech service backends
    #[serde(default)]
    pub speech: SpeechConfig,

    /// Storage backend
    #[serde(default)]
    pub storage: StorageConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,

    /// Feature flags
    #[serde(default)]
    pub features: FeatureFlags,
}

impl Settings {
    /// Create default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.scoring.pass_threshold > 100 {
            return Err(ConfigError::InvalidValue {
                field: "scoring.pass_threshold".to_string(),
                message: "pass threshold is a score in [0, 100]".to_string(),
            });
        }

        if self.scoring.model_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "scoring.model_timeout_secs".to_string(),
                message: "model timeout must be at least 1 second".to_string(),
            });
        }

        if self.server.rate_limit.burst_multiplier < 1.0 {
            return Err(ConfigError::InvalidValue {
                field: "server.rate_limit.burst_multiplier".to_string(),
                message: "burst multiplier below 1.0 would shrink the base rate".to_string(),
            });
        }

        if matches!(self.llm.provider, LlmProvider::OpenAi) && self.llm.api_key.is_none() {
            tracing::warn!(
                "llm.provider is openai but llm.api_key is unset; \
                 model-backed scoring will be unavailable"
            );
        }

        Ok(())
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP server host
    #[serde(default = "default_host")]
    pub host: String,

    /// HTTP server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Maximum concurrent dialogue sessions
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,

    /// Idle session timeout in seconds
    #[serde(default = "default_session_timeout")]
    pub session_timeout_seconds: u64,

    /// Enable CORS
    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// CORS allowed origins; empty means none are allowed
    #[serde(default)]
    pub cors_origins: Vec<String>,

    /// Rate limiting configuration
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Authentication configuration
    #[serde(default)]
    pub auth: AuthConfig,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_max_sessions() -> usize {
    500
}
fn default_session_timeout() -> u64 {
    3600
}
fn default_true() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_sessions: default_max_sessions(),
            session_timeout_seconds: default_session_timeout(),
            cors_enabled: default_true(),
            // Must be explicitly configured for production
            cors_origins: Vec::new(),
            rate_limit: RateLimitConfig::default(),
            auth: AuthConfig::default(),
        }
    }
}

/// Authentication configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Enable API-key authentication (off by default for development)
    #[serde(default)]
    pub enabled: bool,

    /// API key (set via LINGUA_TUTOR__SERVER__AUTH__API_KEY)
    #[serde(default)]
    pub api_key: Option<String>,

    /// Paths that bypass authentication
    #[serde(default = "default_public_paths")]
    pub public_paths: Vec<String>,
}

fn default_public_paths() -> Vec<String> {
    vec![
        "/health".to_string(),
        "/ready".to_string(),
        "/metrics".to_string(),
    ]
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_key: None,
            public_paths: default_public_paths(),
        }
    }
}

/// Rate limiting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Enable rate limiting
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Maximum scoring/turn requests per second per session
    #[serde(default = "default_requests_per_second")]
    pub requests_per_second: u32,

    /// Maximum audio upload bytes per second per session
    #[serde(default = "default_audio_bytes_per_second")]
    pub audio_bytes_per_second: u32,

    /// Burst allowance (multiple of the base rate)
    #[serde(default = "default_burst_multiplier")]
    pub burst_multiplier: f32,
}

fn default_requests_per_second() -> u32 {
    10
}

fn default_audio_bytes_per_second() -> u32 {
    // 16 kHz * 2 bytes with headroom for container overhead
    64000
}

fn default_burst_multiplier() -> f32 {
    2.0
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            requests_per_second: default_requests_per_second(),
            audio_bytes_per_second: default_audio_bytes_per_second(),
            burst_multiplier: default_burst_multiplier(),
        }
    }
}

/// Pronunciation scoring configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Minimum overall score required to advance a dialogue turn
    #[serde(default = "default_pass_threshold")]
    pub pass_threshold: u8,

    /// Model call timeout in seconds; expiry is treated as unavailable
    #[serde(default = "default_model_timeout")]
    pub model_timeout_secs: u64,

    /// Sampling temperature for the assessment prompt
    #[serde(default = "default_scoring_temperature")]
    pub temperature: f32,

    /// Token budget for the assessment response
    #[serde(default = "default_scoring_max_tokens")]
    pub max_tokens: u32,
}

fn default_pass_threshold() -> u8 {
    70
}
fn default_model_timeout() -> u64 {
    20
}
fn default_scoring_temperature() -> f32 {
    0.2
}
fn default_scoring_max_tokens() -> u32 {
    512
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            pass_threshold: default_pass_threshold(),
            model_timeout_secs: default_model_timeout(),
            temperature: default_scoring_temperature(),
            max_tokens: default_scoring_max_tokens(),
        }
    }
}

/// Language model providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    /// OpenAI-compatible chat completions API
    #[default]
    OpenAi,
    /// No model backend; scoring uses the deterministic path only
    Disabled,
}

/// Language model backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Which provider to use
    #[serde(default)]
    pub provider: LlmProvider,

    /// API base URL
    #[serde(default = "default_llm_base_url")]
    pub base_url: String,

    /// API key (set via LINGUA_TUTOR__LLM__API_KEY)
    #[serde(default)]
    pub api_key: Option<String>,

    /// Model identifier
    #[serde(default = "default_llm_model")]
    pub model: String,

    /// Request timeout in seconds for non-scoring calls
    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,
}

fn default_llm_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}
fn default_llm_model() -> String {
    "gpt-4o-mini".to_string()
}
fn default_llm_timeout() -> u64 {
    30
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::default(),
            base_url: default_llm_base_url(),
            api_key: None,
            model: default_llm_model(),
            timeout_secs: default_llm_timeout(),
        }
    }
}

/// Speech service providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SpeechProvider {
    /// Hosted STT/TTS HTTP APIs
    Hosted,
    /// Local stand-ins for development and tests
    #[default]
    Simulated,
}

/// Speech-to-text backend settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SttSettings {
    #[serde(default = "default_stt_base_url")]
    pub base_url: String,

    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_stt_model")]
    pub model: String,
}

fn default_stt_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}
fn default_stt_model() -> String {
    "whisper-1".to_string()
}

impl Default for SttSettings {
    fn default() -> Self {
        Self {
            base_url: default_stt_base_url(),
            api_key: None,
            model: default_stt_model(),
        }
    }
}

/// Text-to-speech backend settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TtsSettings {
    #[serde(default = "default_tts_base_url")]
    pub base_url: String,

    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_tts_model")]
    pub model: String,

    #[serde(default = "default_tts_voice")]
    pub voice: String,
}

fn default_tts_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}
fn default_tts_model() -> String {
    "tts-1".to_string()
}
fn default_tts_voice() -> String {
    "alloy".to_string()
}

impl Default for TtsSettings {
    fn default() -> Self {
        Self {
            base_url: default_tts_base_url(),
            api_key: None,
            model: default_tts_model(),
            voice: default_tts_voice(),
        }
    }
}

/// Speech services configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SpeechConfig {
    /// Which provider to use
    #[serde(default)]
    pub provider: SpeechProvider,

    /// STT backend
    #[serde(default)]
    pub stt: SttSettings,

    /// TTS backend
    #[serde(default)]
    pub tts: TtsSettings,
}

/// Storage providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageProvider {
    /// ScyllaDB cluster
    Scylla,
    /// In-process stores for development and tests
    #[default]
    Memory,
}

/// ScyllaDB settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScyllaSettings {
    #[serde(default = "default_scylla_hosts")]
    pub hosts: Vec<String>,

    #[serde(default = "default_keyspace")]
    pub keyspace: String,

    #[serde(default = "default_replication_factor")]
    pub replication_factor: u8,
}

fn default_scylla_hosts() -> Vec<String> {
    vec!["127.0.0.1:9042".to_string()]
}
fn default_keyspace() -> String {
    "lingua_tutor".to_string()
}
fn default_replication_factor() -> u8 {
    1
}

impl Default for ScyllaSettings {
    fn default() -> Self {
        Self {
            hosts: default_scylla_hosts(),
            keyspace: default_keyspace(),
            replication_factor: default_replication_factor(),
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StorageConfig {
    /// Which provider to use
    #[serde(default)]
    pub provider: StorageProvider,

    /// ScyllaDB settings, used when provider = scylla
    #[serde(default)]
    pub scylla: ScyllaSettings,
}

/// Observability configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default)]
    pub log_json: bool,

    /// Enable tracing export
    #[serde(default = "default_true")]
    pub tracing_enabled: bool,

    /// OTLP endpoint for traces
    #[serde(default)]
    pub otlp_endpoint: Option<String>,

    /// Enable Prometheus metrics
    #[serde(default = "default_true")]
    pub metrics_enabled: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_json: false,
            tracing_enabled: true,
            otlp_endpoint: None,
            metrics_enabled: true,
        }
    }
}

/// Feature flags
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureFlags {
    /// Enable scripted dialogue sessions
    #[serde(default = "default_true")]
    pub dialogue: bool,

    /// Enable free-form conversational replies between scored turns
    #[serde(default = "default_true")]
    pub conversation_replies: bool,

    /// Enable the STT/TTS proxy endpoints
    #[serde(default = "default_true")]
    pub speech_proxy: bool,

    /// Record attempts to the progress store
    #[serde(default = "default_true")]
    pub record_attempts: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            dialogue: true,
            conversation_replies: true,
            speech_proxy: true,
            record_attempts: true,
        }
    }
}

/// Load settings from files and environment
///
/// Priority (highest to lowest):
/// 1. Environment variables (LINGUA_TUTOR prefix, `__` separator)
/// 2. config/{env} (if env specified)
/// 3. config/default
pub fn load_settings(env: Option<&str>) -> Result<Settings, ConfigError> {
    let mut builder = Config::builder();

    builder = builder.add_source(File::with_name("config/default").required(false));

    if let Some(env_name) = env {
        builder = builder.add_source(File::with_name(&format!("config/{}", env_name)).required(false));
    }

    builder = builder.add_source(
        Environment::with_prefix("LINGUA_TUTOR")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;
    let settings: Settings = config.try_deserialize()?;

    settings.validate()?;

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.scoring.pass_threshold, 70);
        assert!(matches!(settings.storage.provider, StorageProvider::Memory));
    }

    #[test]
    fn test_validation_rejects_bad_threshold() {
        let mut settings = Settings::default();
        settings.scoring.pass_threshold = 130;
        assert!(settings.validate().is_err());

        settings.scoring.pass_threshold = 70;
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_zero_timeout() {
        let mut settings = Settings::default();
        settings.scoring.model_timeout_secs = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_shrinking_burst() {
        let mut settings = Settings::default();
        settings.server.rate_limit.burst_multiplier = 0.5;
        assert!(settings.validate().is_err());
    }
}
