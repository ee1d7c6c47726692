//! lingua-tutor HTTP server
//!
//! Exposes the scoring pipeline, dialogue sessions, and speech proxying over
//! an axum HTTP API.

pub mod http;
pub mod metrics;
pub mod rate_limit;
pub mod session;
pub mod state;

pub use self::http::create_router;
pub use self::metrics::init_metrics;
pub use rate_limit::{RateLimitError, RateLimiter};
pub use session::{DialogueSession, SessionManager};
pub use state::AppState;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use lingua_tutor_dialogue::DialogueError;

/// Server errors
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Session error: {0}")]
    Session(String),

    #[error("Scenario not found: {0}")]
    ScenarioNotFound(String),

    #[error("Learner not found: {0}")]
    LearnerNotFound(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Feature not available: {0}")]
    Entitlement(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Rate limit exceeded")]
    RateLimit,

    #[error("Speech backend error: {0}")]
    Speech(String),

    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<ServerError> for StatusCode {
    fn from(err: ServerError) -> Self {
        (&err).into()
    }
}

impl From<&ServerError> for StatusCode {
    fn from(err: &ServerError) -> Self {
        match err {
            ServerError::Session(_)
            | ServerError::ScenarioNotFound(_)
            | ServerError::LearnerNotFound(_) => StatusCode::NOT_FOUND,
            ServerError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::Auth(_) => StatusCode::UNAUTHORIZED,
            ServerError::Entitlement(_) => StatusCode::PAYMENT_REQUIRED,
            ServerError::Conflict(_) => StatusCode::CONFLICT,
            ServerError::RateLimit => StatusCode::TOO_MANY_REQUESTS,
            ServerError::Speech(_) => StatusCode::BAD_GATEWAY,
            ServerError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ServerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status: StatusCode = (&self).into();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

impl From<lingua_tutor_core::Error> for ServerError {
    fn from(err: lingua_tutor_core::Error) -> Self {
        use lingua_tutor_core::Error as CoreError;
        match err {
            CoreError::Input(msg) => ServerError::InvalidRequest(msg),
            CoreError::Unavailable(msg) => ServerError::Unavailable(msg),
            CoreError::Speech(msg) => ServerError::Speech(msg),
            other => ServerError::Internal(other.to_string()),
        }
    }
}

impl From<DialogueError> for ServerError {
    fn from(err: DialogueError) -> Self {
        match err {
            DialogueError::OutOfRange { .. } => {
                ServerError::Conflict("dialogue is already complete".to_string())
            }
            DialogueError::InvalidTransition(msg) => ServerError::Conflict(msg),
            DialogueError::Scoring(core) => core.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            StatusCode::from(ServerError::RateLimit),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            StatusCode::from(ServerError::Entitlement("dialogue".into())),
            StatusCode::PAYMENT_REQUIRED
        );
        assert_eq!(
            StatusCode::from(ServerError::Unavailable("llm".into())),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_core_error_mapping() {
        let err: ServerError = lingua_tutor_core::Error::input("empty").into();
        assert_eq!(StatusCode::from(err), StatusCode::BAD_REQUEST);

        let err: ServerError = lingua_tutor_core::Error::unavailable("down").into();
        assert_eq!(StatusCode::from(err), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_dialogue_error_mapping() {
        let err: ServerError = DialogueError::OutOfRange { index: 4, len: 4 }.into();
        assert_eq!(StatusCode::from(err), StatusCode::CONFLICT);
    }
}
