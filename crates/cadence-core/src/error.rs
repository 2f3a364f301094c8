//! Error types for cadence.

use thiserror::Error;

/// Result type alias using cadence's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for cadence operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation failed (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Missing or malformed input (window bounds, scope action, rule fields)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Target record absent or not owned by the caller
    #[error("Not found: {0}")]
    NotFound(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Recalculation queue error
    #[error("Queue error: {0}")]
    Queue(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
