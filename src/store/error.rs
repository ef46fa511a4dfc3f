//! Store error types
//!
//! Defines all errors that can occur in the document store layer.

use thiserror::Error;

/// Errors that can occur in the document store
#[derive(Error, Debug)]
pub enum StoreError {
    /// I/O operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization failed
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Snapshot compression or decompression failed
    #[error("Compression error: {0}")]
    Compression(String),

    /// Data corruption detected (checksum mismatch, unreadable snapshot)
    #[error("Corrupt data: {0}")]
    Corruption(String),

    /// Path failed validation (forbidden characters, empty segment, too deep)
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// Journal format or recovery error
    #[error("Journal error: {0}")]
    Journal(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

/// Result type alias for store operations
pub type StoreResult<T> = Result<T, StoreError>;
