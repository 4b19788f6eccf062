//! Error types for local storage operations

/// Errors from reading or writing local storage.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(String),

    #[error("storage parse error: {0}")]
    Parse(String),

    #[error("invalid value for key {key}: {reason}")]
    InvalidValue { key: String, reason: String },
}

/// Result alias for storage operations.
pub type Result<T> = std::result::Result<T, Error>;
