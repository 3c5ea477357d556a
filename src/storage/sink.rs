//! Single-writer record sink
//!
//! Detail workers never touch the store. They send commands over a bounded
//! channel to one blocking task that owns the store, so appends and snapshots
//! are serialized without a lock. When the store fails the task ends with the
//! error and every later send fails, which the crawl treats as fatal.

use crate::record::Record;
use crate::storage::traits::{RecordStore, StorageResult};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Work accepted by the sink task
#[derive(Debug)]
pub enum SinkCommand {
    /// Persist one completed record
    Append(Box<Record>),

    /// Rewrite the aggregate snapshot
    Snapshot,
}

/// What the sink did over its lifetime
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SinkReport {
    pub records_written: usize,
    pub duplicates_skipped: usize,
    pub snapshots_written: usize,

    /// Records in the store when the sink stopped, including resumed ones
    pub total_records: usize,
}

/// Handle to the running sink task
pub type SinkHandle = JoinHandle<StorageResult<SinkReport>>;

/// Starts the sink task on the blocking pool
///
/// The task runs until every sender is dropped or the store fails. `buffer`
/// bounds the number of queued commands (at least one).
pub fn spawn_sink<S: RecordStore>(mut store: S, buffer: usize) -> (mpsc::Sender<SinkCommand>, SinkHandle) {
    let (tx, mut rx) = mpsc::channel(buffer.max(1));

    let handle = tokio::task::spawn_blocking(move || {
        let mut report = SinkReport::default();

        while let Some(command) = rx.blocking_recv() {
            match command {
                SinkCommand::Append(record) => {
                    let url = record.url().to_string();
                    if store.append_record(*record)? {
                        report.records_written += 1;
                        tracing::debug!("Stored {}", url);
                    } else {
                        report.duplicates_skipped += 1;
                    }
                }
                SinkCommand::Snapshot => {
                    store.snapshot()?;
                    report.snapshots_written += 1;
                    tracing::info!("Snapshot written ({} records)", store.len());
                }
            }
        }

        report.total_records = store.len();
        Ok(report)
    });

    (tx, handle)
}
