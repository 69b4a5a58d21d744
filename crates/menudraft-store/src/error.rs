//! Error types for storage operations

use menudraft_domain::InvalidTransition;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Record not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid data format
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Status change not allowed by the job state machine
    #[error(transparent)]
    InvalidTransition(#[from] InvalidTransition),

    /// Storage location escapes the attachments root
    #[error("Invalid storage location: {0}")]
    InvalidLocation(String),

    /// Filesystem error while reading attachment bytes
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
