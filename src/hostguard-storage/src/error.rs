//! Error types for hostguard-storage.

use std::path::PathBuf;
use thiserror::Error;

/// Storage error types.
#[derive(Debug, Error)]
pub enum StorageError {
    /// IO error during file operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// SQLite error.
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Invalid database path.
    #[error("Invalid path: {0}")]
    InvalidPath(PathBuf),
}

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;
