//! Error types for the lingua-tutor server

use thiserror::Error;

/// Result type alias using our Error
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the practice server
///
/// Only `Input` and `Unavailable` are expected to cross the HTTP boundary as
/// failures; `MalformedOutput` is recovered locally by the fallback scorer.
#[derive(Error, Debug)]
pub enum Error {
    /// Caller submitted an empty or otherwise unusable utterance
    #[error("input error: {0}")]
    Input(String),

    /// An upstream service call failed outright (network, auth, timeout)
    #[error("service unavailable: {0}")]
    Unavailable(String),

    /// The model responded, but its output failed schema validation
    #[error("malformed model output: {0}")]
    MalformedOutput(String),

    /// Speech transcription or synthesis failed
    #[error("speech processing error: {0}")]
    Speech(String),

    /// Storage layer failure
    #[error("persistence error: {0}")]
    Persistence(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an input error from a string
    pub fn input<S: Into<String>>(msg: S) -> Self {
        Error::Input(msg.into())
    }

    /// Create an unavailable error from a string
    pub fn unavailable<S: Into<String>>(msg: S) -> Self {
        Error::Unavailable(msg.into())
    }

    /// Create a malformed-output error from a string
    pub fn malformed<S: Into<String>>(msg: S) -> Self {
        Error::MalformedOutput(msg.into())
    }

    /// Create a generic error from a string
    pub fn other<S: Into<String>>(msg: S) -> Self {
        Error::Other(msg.into())
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Other(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Other(s.to_string())
    }
}
