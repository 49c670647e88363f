//! Storage-specific error types.
//!
//! All persistence operations return [`StorageError`] on failure. Callers can
//! use [`StorageError::is_unavailable`] to tell a backend outage apart from a
//! rejected write (malformed artifact name or content).

use thiserror::Error;

/// Errors that can occur in the storage layer.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Backend could not be reached or did not answer.
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// Backend refused the write (bad artifact name, malformed artifact).
    #[error("storage rejected write: {0}")]
    Rejected(String),

    /// Filesystem I/O failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV encoding/decoding error.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// Database operation failed (sqlx error).
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl StorageError {
    /// Whether the failure is an outage rather than a rejected write.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable(_) | Self::Io(_) | Self::Database(_))
    }
}
