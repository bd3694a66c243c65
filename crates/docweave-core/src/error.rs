//! Error types for the documentation pipeline.

use thiserror::Error;

/// Result type alias for pipeline operations.
pub type DocResult<T> = Result<T, DocError>;

/// Errors that can occur while analyzing or fixing a document.
#[derive(Debug, Error)]
pub enum DocError {
    /// The C# grammar could not be loaded or the parser gave up.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// The generation service failed (network, authentication, rate limit).
    #[error("generation service error: {message}")]
    Service { message: String },
}

impl DocError {
    /// Create a parse error.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }

    /// Create a service error.
    pub fn service(message: impl Into<String>) -> Self {
        Self::Service {
            message: message.into(),
        }
    }

    /// Whether retrying the same fix later may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, DocError::Service { .. })
    }
}
