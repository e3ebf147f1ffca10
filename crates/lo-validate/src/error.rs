//! Error types for lo-validate

use lo_api::ApiError;
use thiserror::Error;

/// Validation engine errors
#[derive(Error, Debug)]
pub enum ValidateError {
    /// Discovery failure (V001): the model cannot be validated as requested
    #[error("[V001] Discovery failed: {0}")]
    Discovery(String),

    /// Platform API failure (V002)
    #[error("[V002] {0}")]
    Api(#[from] ApiError),
}

/// Result type alias for ValidateError
pub type ValidateResult<T> = Result<T, ValidateError>;

/// Why a probe query could not reach a terminal outcome.
///
/// Retries happen inside the executor; whatever escapes here is terminal
/// for that probe. The isolation engine turns these into `Incomplete` or
/// `Cancelled` explore results with the findings gathered so far.
#[derive(Error, Debug)]
pub enum ExecutorError {
    /// Transport retries exhausted (V003)
    #[error("[V003] Query transport failed: {0}")]
    Transport(#[source] ApiError),

    /// The query expired and used up its resubmissions (V004)
    #[error("[V004] Query timed out after {elapsed_secs:.0}s in the expired state")]
    Timeout { elapsed_secs: f64 },

    /// The run was cancelled while the query was pending (V005)
    #[error("[V005] Query cancelled")]
    Cancelled,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_in_messages() {
        let err = ValidateError::Discovery("no explores matched".to_string());
        assert!(err.to_string().starts_with("[V001]"));

        let err = ExecutorError::Cancelled;
        assert!(err.to_string().starts_with("[V005]"));
    }

    #[test]
    fn test_api_error_converts() {
        let err: ValidateError = ApiError::Transport("connection reset".to_string()).into();
        assert!(matches!(err, ValidateError::Api(_)));
        assert!(err.to_string().contains("[A001]"));
    }

    #[test]
    fn test_timeout_message_has_elapsed_seconds() {
        let err = ExecutorError::Timeout {
            elapsed_secs: 301.4,
        };
        assert!(err.to_string().contains("301s"));
    }
}
