//! Crawl orchestration
//!
//! The harvester owns everything that lives for the whole crawl: the HTTP
//! session, the detail worker pool and the record store. It starts the sink
//! task, walks each configured category in order, and writes a final
//! snapshot before shutting the sink down.

use crate::config::Config;
use crate::crawler::fetcher::PageFetcher;
use crate::crawler::paginator::Paginator;
use crate::crawler::pool::DetailPool;
use crate::output::CrawlSummary;
use crate::storage::{spawn_sink, JsonFileStore, RecordStore, SinkCommand};
use crate::Result;
use chrono::Utc;

/// Top-level crawl driver
pub struct Harvester {
    config: Config,
    fetcher: PageFetcher,
    pool: DetailPool,
    store: JsonFileStore,
}

impl Harvester {
    /// Creates a harvester and opens the record store
    ///
    /// # Arguments
    ///
    /// * `config` - The validated configuration
    /// * `fresh` - Truncate the record log instead of resuming from it
    ///
    /// # Returns
    ///
    /// * `Ok(Harvester)` - Ready to run
    /// * `Err(HarvestError)` - The HTTP client or the store could not be set up
    pub fn new(config: Config, fresh: bool) -> Result<Self> {
        let fetcher = PageFetcher::new(&config.site, &config.crawler)?;
        let pool = DetailPool::from_config(fetcher.clone(), &config.crawler);
        let store = JsonFileStore::open(&config.output, fresh)?;

        if !store.is_empty() {
            tracing::info!("{} records already collected", store.len());
        }

        Ok(Self {
            config,
            fetcher,
            pool,
            store,
        })
    }

    /// Crawls every configured category and returns the summary
    ///
    /// Page and listing failures are absorbed along the way. A store failure
    /// stops the crawl and is returned as the error.
    pub async fn run(self) -> Result<CrawlSummary> {
        let Self {
            config,
            fetcher,
            pool,
            store,
        } = self;

        let started_at = Utc::now();
        tracing::info!(
            "Starting harvest of {} categories with {} detail workers",
            config.crawler.categories.len(),
            pool.capacity()
        );

        let (tx, sink) = spawn_sink(store, pool.capacity() * 2);

        let mut categories = Vec::with_capacity(config.crawler.categories.len());
        for &category in &config.crawler.categories {
            let report = Paginator::new(category, &config, &fetcher, &pool, &tx)
                .run()
                .await;
            categories.push(report);

            if tx.is_closed() {
                tracing::error!("Record sink stopped, abandoning remaining categories");
                break;
            }
        }

        if tx.send(SinkCommand::Snapshot).await.is_err() {
            tracing::debug!("Record sink closed before the final snapshot");
        }
        drop(tx);

        let sink_report = sink.await??;

        let pages_processed = categories.iter().map(|c| c.pages_processed).sum();
        let errors = categories.iter().map(|c| c.errors()).sum();

        let summary = CrawlSummary {
            records_written: sink_report.records_written,
            total_records: sink_report.total_records,
            duplicates_skipped: sink_report.duplicates_skipped,
            snapshots_written: sink_report.snapshots_written,
            pages_processed,
            errors,
            categories,
            started_at,
            finished_at: Utc::now(),
        };

        tracing::info!(
            "Harvest finished: {} new records ({} total), {} pages, {} errors",
            summary.records_written,
            summary.total_records,
            summary.pages_processed,
            summary.errors
        );
        if summary.stopped_categories() > 0 {
            tracing::warn!(
                "{} of {} categories stopped before their page cap",
                summary.stopped_categories(),
                summary.categories.len()
            );
        }

        Ok(summary)
    }
}

/// Runs a complete crawl, resuming from the existing record log
///
/// # Arguments
///
/// * `config` - The crawler configuration
///
/// # Returns
///
/// * `Ok(CrawlSummary)` - Every category ran to a terminal state
/// * `Err(HarvestError)` - Setup failed or the record sink failed
pub async fn run_crawl(config: Config) -> Result<CrawlSummary> {
    Harvester::new(config, false)?.run().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CrawlerConfig, OutputConfig, SiteConfig};
    use crate::state::{Category, PaginationState};
    use tempfile::TempDir;

    fn offline_config(dir: &TempDir) -> Config {
        Config {
            crawler: CrawlerConfig {
                max_pages: 2,
                ..CrawlerConfig::default()
            },
            site: SiteConfig {
                base_url: "http://127.0.0.1:1".to_string(),
                search_url: "http://127.0.0.1:1/en/search/house-and-apartment".to_string(),
                ..SiteConfig::default()
            },
            output: OutputConfig {
                records_path: dir.path().join("houses.jsonl").display().to_string(),
                snapshot_path: dir.path().join("houses.json").display().to_string(),
                csv_path: dir.path().join("houses.csv").display().to_string(),
            },
        }
    }

    #[tokio::test]
    async fn test_unreachable_site_completes_with_errors() {
        let dir = TempDir::new().unwrap();
        let summary = Harvester::new(offline_config(&dir), true)
            .unwrap()
            .run()
            .await
            .unwrap();

        assert_eq!(summary.records_written, 0);
        assert_eq!(summary.pages_processed, 0);
        assert_eq!(summary.errors, 4);
        assert_eq!(summary.snapshots_written, 1);

        let order: Vec<Category> = summary.categories.iter().map(|c| c.category).collect();
        assert_eq!(order, vec![Category::Sale, Category::Rent]);
        assert_eq!(summary.stopped_categories(), 0);
        assert!(summary
            .categories
            .iter()
            .all(|c| c.final_state == PaginationState::Exhausted));

        let snapshot = std::fs::read_to_string(dir.path().join("houses.json")).unwrap();
        assert_eq!(snapshot.trim(), "[]");
    }

    #[tokio::test]
    async fn test_bad_category_url_does_not_stop_others() {
        let dir = TempDir::new().unwrap();
        let mut config = offline_config(&dir);
        config.crawler.max_pages = 1;
        config.site.search_url = "relative/path".to_string();

        let summary = Harvester::new(config, true).unwrap().run().await.unwrap();

        assert_eq!(summary.categories.len(), 2);
        assert_eq!(summary.stopped_categories(), 2);
        assert!(summary
            .categories
            .iter()
            .all(|c| c.final_state == PaginationState::Failed));
    }
}
