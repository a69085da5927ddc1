//! Error types for the storage backends and the task store

use crate::record::TaskId;
use thiserror::Error;

/// Errors raised by a storage backend
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Invalid slot key: {0}")]
    InvalidKey(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Errors raised by `TaskStore` operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Task {0} not found")]
    NotFound(TaskId),

    #[error("Storage error: {0}")]
    Backend(#[from] BackendError),

    #[error("Failed to encode tasks: {0}")]
    Encode(#[from] serde_json::Error),
}

impl StoreError {
    /// Check if this is a missing-task error
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
