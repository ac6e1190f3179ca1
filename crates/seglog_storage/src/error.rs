//! Error types for storage operations.

use std::io;
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// No data exists at the requested location, or the index has no room
    /// for another entry.
    ///
    /// Callers tell these apart by the operation that failed: from
    /// [`Index::write`](crate::Index::write) it means the segment is full,
    /// from a read it means there is no such record.
    #[error("end of stream")]
    EndOfStream,

    /// The store is closed.
    #[error("storage is closed")]
    Closed,

    /// A configuration value was rejected.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The file on disk does not match the expected layout.
    #[error("storage corrupted: {0}")]
    Corrupted(String),
}

impl StorageError {
    /// Returns `true` for [`StorageError::EndOfStream`].
    #[must_use]
    pub fn is_end_of_stream(&self) -> bool {
        matches!(self, Self::EndOfStream)
    }
}
