//! Error types
//!
//! A single error enum is shared by every layer of the client. Remote failures are
//! surfaced synchronously; nothing in the crate retries on the caller's behalf.

use thiserror::Error;

/// Errors returned by client operations
#[derive(Debug, Error)]
pub enum ApiError {
    /// Path or identifier does not resolve
    #[error("Not found: {0}")]
    NotFound(String),

    /// Expected a file and found a folder (or the reverse), including ancestor segments
    #[error("Type conflict: {0}")]
    TypeConflict(String),

    /// A cached field has an unexpected shape
    #[error("Invalid type: {0}")]
    InvalidType(String),

    /// Path already resolves to a record
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    /// Transport failure, timeout, or non-success status from the remote store
    #[error("Remote unavailable: {0}")]
    RemoteUnavailable(String),

    /// Malformed payload from the remote store
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl ApiError {
    /// Whether repeating the same call may succeed without any local change
    pub fn is_retryable(&self) -> bool {
        matches!(self, ApiError::RemoteUnavailable(_))
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::RemoteUnavailable(format!("request timed out: {}", err))
        } else if err.is_decode() {
            ApiError::InvalidResponse(err.to_string())
        } else {
            ApiError::RemoteUnavailable(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::InvalidResponse(err.to_string())
    }
}

impl From<config::ConfigError> for ApiError {
    fn from(err: config::ConfigError) -> Self {
        ApiError::ConfigError(err.to_string())
    }
}
