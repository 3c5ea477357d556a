//! Storage module for persisting harvested records
//!
//! This module handles:
//! - The [`RecordStore`] interface and its JSON-lines implementation
//! - The single-writer sink task that owns the store during a crawl
//! - Resuming from an existing record log

mod json_store;
mod sink;
mod traits;

pub use json_store::JsonFileStore;
pub use sink::{spawn_sink, SinkCommand, SinkHandle, SinkReport};
pub use traits::{RecordStore, StorageError, StorageResult};
