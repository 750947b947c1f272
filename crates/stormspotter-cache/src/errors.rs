//! Errors raised by the Record Store adapter.

use thiserror::Error;

/// Failures the SQLite-backed record store can surface.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("failed to open or create database file: {0}")]
    ConnectionFailed(String),

    #[error("failed to run schema migration: {0}")]
    MigrationFailed(String),

    #[error("failed to encode or decode a record: {0}")]
    SerializationError(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
