//! Storage error types

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during journal operations
#[derive(Debug, Error)]
pub enum JournalError {
    #[error("Timed out after {waited_ms}ms waiting for lock on {path}")]
    LockTimeout { path: PathBuf, waited_ms: u64 },

    #[error("Journal path has no parent directory: {0}")]
    InvalidPath(PathBuf),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl JournalError {
    pub fn is_lock_timeout(&self) -> bool {
        matches!(self, Self::LockTimeout { .. })
    }
}

/// Result type for journal operations
pub type JournalResult<T> = Result<T, JournalError>;
