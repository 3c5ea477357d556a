//! Bounded pool of detail-page workers
//!
//! One batch is the set of stubs found on one index page. Every stub becomes
//! a unit (fetch, extract, hand the record to the sink) and at most
//! `capacity` units run at once. [`DetailPool::run_batch`] returns only after
//! every unit of the batch has finished, so the caller gets a clean boundary
//! before it moves to the next page.

use crate::config::CrawlerConfig;
use crate::crawler::detail_parser::extract_detail;
use crate::crawler::fetcher::PageFetcher;
use crate::crawler::retry::{fetch_with_retry, RetryPolicy};
use crate::record::Record;
use crate::storage::SinkCommand;
use crate::{FetchError, HarvestError};
use std::sync::Arc;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;

/// Counts for one finished batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    pub dispatched: usize,
    pub completed: usize,
    pub failed: usize,
}

/// Fixed-capacity worker pool for detail pages
///
/// The fetcher's connection pool is shared read-only by every unit; each
/// unit owns its record until it is sent to the sink.
#[derive(Debug, Clone)]
pub struct DetailPool {
    fetcher: PageFetcher,
    semaphore: Arc<Semaphore>,
    capacity: usize,
    retry: RetryPolicy,
}

impl DetailPool {
    /// Creates a pool running at most `capacity` units at once
    ///
    /// # Arguments
    ///
    /// * `fetcher` - Shared HTTP session for detail pages
    /// * `capacity` - Worker capacity (at least one)
    /// * `retry` - How transient fetch failures are repeated
    pub fn new(fetcher: PageFetcher, capacity: usize, retry: RetryPolicy) -> Self {
        let capacity = capacity.max(1);
        Self {
            fetcher,
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
            retry,
        }
    }

    pub fn from_config(fetcher: PageFetcher, config: &CrawlerConfig) -> Self {
        Self::new(
            fetcher,
            config.max_concurrent_details as usize,
            RetryPolicy::from_config(config),
        )
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Processes every stub and waits for all of them
    ///
    /// Unit failures are logged and counted; they never cancel sibling units.
    ///
    /// # Returns
    ///
    /// * `Ok(BatchOutcome)` - Every unit has finished
    /// * `Err(HarvestError::SinkClosed)` - The sink stopped accepting records;
    ///   the batch was still drained before returning
    pub async fn run_batch(
        &self,
        stubs: Vec<Record>,
        sink: &mpsc::Sender<SinkCommand>,
    ) -> Result<BatchOutcome, HarvestError> {
        let mut outcome = BatchOutcome::default();
        let mut units = JoinSet::new();

        for stub in stubs {
            // The semaphore is never closed
            let Ok(permit) = self.semaphore.clone().acquire_owned().await else {
                break;
            };

            let fetcher = self.fetcher.clone();
            let sink = sink.clone();
            let retry = self.retry;

            units.spawn(async move {
                let _permit = permit;
                process_listing(&fetcher, stub, retry, &sink).await
            });
            outcome.dispatched += 1;
        }

        let mut sink_closed = false;
        while let Some(joined) = units.join_next().await {
            match joined {
                Ok(Ok(())) => outcome.completed += 1,
                Ok(Err(HarvestError::SinkClosed)) => {
                    sink_closed = true;
                    outcome.failed += 1;
                }
                Ok(Err(e)) => {
                    log_unit_failure(&e);
                    outcome.failed += 1;
                }
                Err(e) => {
                    tracing::error!("Detail worker aborted: {}", e);
                    outcome.failed += 1;
                }
            }
        }

        tracing::debug!(
            "Batch finished: {} dispatched, {} completed, {} failed",
            outcome.dispatched,
            outcome.completed,
            outcome.failed
        );

        if sink_closed {
            return Err(HarvestError::SinkClosed);
        }
        Ok(outcome)
    }
}

/// One unit: fetch the detail page, fill the stub, hand it to the sink
async fn process_listing(
    fetcher: &PageFetcher,
    mut record: Record,
    retry: RetryPolicy,
    sink: &mpsc::Sender<SinkCommand>,
) -> Result<(), HarvestError> {
    let page = fetch_with_retry(fetcher, record.url(), retry).await?;
    let stats = extract_detail(&page.body, &mut record)?;

    tracing::trace!(
        "{}: {} payload fields, {} table rows ({} unmatched)",
        record.url(),
        stats.payload_fields,
        stats.matched_rows,
        stats.unmatched_rows
    );

    sink.send(SinkCommand::Append(Box::new(record)))
        .await
        .map_err(|_| HarvestError::SinkClosed)
}

fn log_unit_failure(error: &HarvestError) {
    match error {
        HarvestError::Fetch(e @ FetchError::Status { .. }) if e.is_client_error() => {
            tracing::info!("Skipping removed listing: {}", e)
        }
        HarvestError::Fetch(e @ FetchError::Status { .. }) => {
            tracing::warn!("Skipping listing after server error: {}", e)
        }
        HarvestError::Fetch(e) => tracing::warn!("Skipping unreachable listing: {}", e),
        e => tracing::warn!("Skipping listing: {}", e),
    }
}
