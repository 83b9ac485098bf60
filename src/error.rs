//! promptc error types

use std::time::Duration;

/// promptc error types
#[derive(Debug, thiserror::Error)]
pub enum PromptcError {
    // Backend errors
    /// Call quota exhausted, either by the adapter's own rate window or
    /// signalled by the backend (HTTP 429).
    #[error("{backend}: rate limit exceeded, retry after {retry_after:?}")]
    RateLimited {
        backend: String,
        retry_after: Option<Duration>,
    },

    #[error("{backend} error: {message}")]
    Backend { backend: String, message: String },

    // Output errors
    #[error("missing required element: {element}")]
    ValidationFailed { element: String },

    #[error("empty response from model")]
    EmptyResponse,

    // Cache errors
    #[error("cache error: {0}")]
    Cache(String),

    // Input errors
    #[error("template error: {0}")]
    Template(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    // Configuration errors
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("operation not implemented: {0}")]
    NotImplemented(&'static str),

    // Plumbing
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PromptcError {
    /// Whether re-invoking the same operation later can succeed.
    ///
    /// Only rate limiting qualifies; backend failures are surfaced to the
    /// caller and never retried by the pipeline itself.
    pub fn is_transient(&self) -> bool {
        matches!(self, PromptcError::RateLimited { .. })
    }

    /// Retry delay hint carried by `RateLimited`, if any.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            PromptcError::RateLimited { retry_after, .. } => *retry_after,
            _ => None,
        }
    }
}

impl From<minijinja::Error> for PromptcError {
    fn from(err: minijinja::Error) -> Self {
        PromptcError::Template(err.to_string())
    }
}

/// Result type alias for promptc operations
pub type Result<T> = std::result::Result<T, PromptcError>;
