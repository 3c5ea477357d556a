//! Storage traits and error types
//!
//! This module defines the trait interface for record stores and the
//! associated error types.

use crate::record::Record;
use thiserror::Error;

/// Errors that can occur during storage operations
///
/// Unlike fetch or extraction failures these are fatal to a crawl: a record
/// that cannot be written would otherwise be lost silently.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StorageError {
    pub(crate) fn io(path: impl Into<String>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| Self::Io { path, source }
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for record store implementations
///
/// A store is owned by exactly one writer (the sink task); implementations
/// need no internal locking.
pub trait RecordStore: Send + 'static {
    /// Durably appends one completed record
    ///
    /// Returns `Ok(false)` without writing when a record with the same URL is
    /// already stored, so repeating an append is harmless.
    fn append_record(&mut self, record: Record) -> StorageResult<bool>;

    /// Overwrites the aggregate view with every record stored so far
    fn snapshot(&mut self) -> StorageResult<()>;

    /// Number of records currently held
    fn len(&self) -> usize;

    /// Returns true if no record is held
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
