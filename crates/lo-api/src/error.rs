//! Error types for lo-api

use thiserror::Error;

/// Platform API errors
#[derive(Error, Debug)]
pub enum ApiError {
    /// Transport failure (A001): connection refused, reset, or request timeout
    #[error("[A001] Transport error: {0}")]
    Transport(String),

    /// Non-success HTTP status (A002)
    #[error("[A002] API request failed with status {status}: {body}")]
    Http { status: u16, body: String },

    /// Unexpected response payload (A003)
    #[error("[A003] Failed to decode API response: {0}")]
    Decode(String),

    /// Invalid client configuration (A004): bad base URL or token
    #[error("[A004] Invalid client configuration: {0}")]
    Config(String),
}

/// Result type alias for ApiError
pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    /// Whether retrying the request might succeed.
    ///
    /// Transport failures and 5xx statuses are transient. Client errors,
    /// decode failures, and configuration problems are terminal.
    pub fn is_retryable(&self) -> bool {
        match self {
            ApiError::Transport(_) => true,
            ApiError::Http { status, .. } => *status >= 500,
            ApiError::Decode(_) | ApiError::Config(_) => false,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        // reqwest does not expose a structured variant for every failure.
        // Body-decode errors are classified first; anything carrying a status
        // came from an HTTP response; the rest is transport.
        if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            ApiError::Http {
                status: status.as_u16(),
                body: err.to_string(),
            }
        } else {
            ApiError::Transport(err.to_string())
        }
    }
}
