//! Error types for lo-core

use thiserror::Error;

/// Core error type for Lookout
#[derive(Error, Debug)]
pub enum CoreError {
    /// E001: A strongly-typed name was built from an empty string
    #[error("[E001] {kind} must not be empty")]
    EmptyName { kind: &'static str },

    /// E002: Invalid explore selector
    #[error("[E002] Invalid selector '{selector}': {reason}")]
    InvalidSelector { selector: String, reason: String },
}

/// Result type alias for CoreError
pub type CoreResult<T> = Result<T, CoreError>;
