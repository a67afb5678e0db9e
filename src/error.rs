//! Tolk error types

use std::time::Duration;

/// Tolk error types
#[derive(Debug, thiserror::Error)]
pub enum TolkError {
    // Backend/network errors
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Option<Duration> },

    #[error("authentication failed")]
    AuthenticationFailed,

    #[error("model not found: {0}")]
    ModelNotFound(String),

    // Task processing errors
    /// The catalog has no model for this pair.
    ///
    /// Surfaced to clients as a completed translation carrying this message,
    /// never as a failed task.
    #[error("Translation not available for {from} to {to}.")]
    UnsupportedLanguagePair { from: String, to: String },

    /// The model could not be obtained after the backend's retry policy was exhausted.
    #[error("model {model_id} unavailable: {reason}")]
    ModelUnavailable { model_id: String, reason: String },

    #[error("translation failed: {0}")]
    Translation(String),

    /// A job blew up at the loop level. Clients only ever see the generic text.
    #[error("server error")]
    WorkerLoop(String),

    #[error("empty response from model")]
    EmptyResponse,

    // Facade errors
    #[error("No task ID provided")]
    MissingTaskId,

    #[error("task not found: {0}")]
    TaskNotFound(String),

    #[error("translation service is not running")]
    ServiceStopped,

    // Data errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    // Configuration errors
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl TolkError {
    /// Whether retrying the same operation may succeed.
    ///
    /// Network hiccups, rate limits and 5xx responses (including HuggingFace's
    /// 503 "model is loading") are transient. Everything else is permanent.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http(_) | Self::RateLimited { .. } => true,
            Self::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Provider-supplied backoff hint, if any.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { retry_after } => *retry_after,
            _ => None,
        }
    }
}

/// Result type alias for Tolk operations
pub type Result<T> = std::result::Result<T, TolkError>;
