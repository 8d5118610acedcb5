//! Persistence error types

use thiserror::Error;

/// Errors raised by durable storage backends
///
/// Only writes and removals surface these to callers; failed reads fall back
/// to the slot default and are reported on the diagnostics channel.
#[derive(Error, Debug)]
pub enum PersistenceError {
    /// File I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// SQLite error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Key cannot be used as a storage name
    #[error("Invalid key: {0}")]
    InvalidKey(String),
}
