//! Pagination driver for one listing category
//!
//! The driver walks index pages 1, 2, ... of a category as an explicit state
//! machine:
//!
//! - `Fetching`: request the current index page. A failed request is logged
//!   and the page is treated as empty (`Advancing`) rather than retried in
//!   place, so a dead page can never stall the crawl.
//! - `Dispatching`: extract the listing URLs and run them through the detail
//!   pool, waiting for the whole batch.
//! - `Advancing`: checkpoint on every `snapshot-every`th page, then move to
//!   the next page, or to `Exhausted` once the page cap is passed.
//!
//! The site offers no reliable "last page" signal, so the page cap is the
//! only way a category ends normally. Listings beyond the cap are not seen.

use crate::config::{Config, SiteConfig};
use crate::crawler::fetcher::PageFetcher;
use crate::crawler::index_parser::{extract_listing_cards, stub_for, ListingCard};
use crate::crawler::pool::DetailPool;
use crate::crawler::retry::{fetch_with_retry, RetryPolicy};
use crate::output::CategoryReport;
use crate::state::{Category, PaginationState};
use crate::storage::SinkCommand;
use crate::HarvestError;
use std::time::Duration;
use tokio::sync::mpsc;
use url::Url;

/// Builds the index URL of one category page
///
/// The query carries `countries`, `page` and `orderBy`, plus `priceType` for
/// rentals.
pub fn build_index_url(site: &SiteConfig, category: Category, page: u32) -> Result<Url, url::ParseError> {
    let mut url = Url::parse(&format!(
        "{}/{}",
        site.search_url.trim_end_matches('/'),
        category.path_segment()
    ))?;

    {
        let mut query = url.query_pairs_mut();
        query
            .append_pair("countries", &site.countries)
            .append_pair("page", &page.to_string())
            .append_pair("orderBy", &site.order_by);
        if category.needs_price_type() {
            query.append_pair("priceType", &site.rent_price_type);
        }
    }

    Ok(url)
}

/// Drives the index pages of one category
pub struct Paginator<'a> {
    category: Category,
    config: &'a Config,
    fetcher: &'a PageFetcher,
    pool: &'a DetailPool,
    sink: &'a mpsc::Sender<SinkCommand>,
    retry: RetryPolicy,
    state: PaginationState,
    page: u32,
    pending: Vec<ListingCard>,
    report: CategoryReport,
}

impl<'a> Paginator<'a> {
    /// Creates a driver positioned at page 1 in `Fetching`
    ///
    /// # Arguments
    ///
    /// * `category` - The listing category to walk
    /// * `config` - Crawl and site configuration
    /// * `fetcher` - Session used for index pages
    /// * `pool` - Worker pool for the detail pages of each index page
    /// * `sink` - Channel to the record sink, used for snapshots
    pub fn new(
        category: Category,
        config: &'a Config,
        fetcher: &'a PageFetcher,
        pool: &'a DetailPool,
        sink: &'a mpsc::Sender<SinkCommand>,
    ) -> Self {
        Self {
            category,
            config,
            fetcher,
            pool,
            sink,
            retry: RetryPolicy::from_config(&config.crawler),
            state: PaginationState::Fetching,
            page: 1,
            pending: Vec::new(),
            report: CategoryReport::new(category),
        }
    }

    pub fn state(&self) -> PaginationState {
        self.state
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    /// Runs until `Exhausted` or `Failed`
    pub async fn run(mut self) -> CategoryReport {
        tracing::info!(
            "Crawling {} listings (up to {} pages)",
            self.category,
            self.config.crawler.max_pages
        );

        let base_url = match Url::parse(&self.config.site.base_url) {
            Ok(url) => url,
            Err(e) => {
                self.fail(HarvestError::InvalidStartUrl {
                    category: self.category.to_string(),
                    message: format!("base URL: {}", e),
                });
                return self.finish();
            }
        };

        while !self.state.is_terminal() {
            match self.state {
                PaginationState::Fetching => self.fetch_index(&base_url).await,
                PaginationState::Dispatching => self.dispatch().await,
                PaginationState::Advancing => self.advance().await,
                PaginationState::Exhausted | PaginationState::Failed => {}
            }
        }

        self.finish()
    }

    async fn fetch_index(&mut self, base_url: &Url) {
        let url = match build_index_url(&self.config.site, self.category, self.page) {
            Ok(url) => url,
            Err(e) => {
                self.fail(HarvestError::InvalidStartUrl {
                    category: self.category.to_string(),
                    message: e.to_string(),
                });
                return;
            }
        };

        tracing::debug!("Fetching {} index page {}: {}", self.category, self.page, url);

        match fetch_with_retry(self.fetcher, url.as_str(), self.retry).await {
            Ok(page) => {
                self.pending = extract_listing_cards(&page.body, base_url);
                self.transition(PaginationState::Dispatching);
            }
            Err(e) => {
                tracing::warn!(
                    "Skipping {} index page {}: {}",
                    self.category,
                    self.page,
                    e
                );
                self.report.page_failures += 1;
                self.transition(PaginationState::Advancing);
            }
        }
    }

    async fn dispatch(&mut self) {
        let stubs = std::mem::take(&mut self.pending)
            .iter()
            .map(stub_for)
            .collect::<Vec<_>>();
        let found = stubs.len();

        match self.pool.run_batch(stubs, self.sink).await {
            Ok(outcome) => {
                self.report.pages_processed += 1;
                self.report.listings_found += found;
                self.report.details_completed += outcome.completed;
                self.report.details_failed += outcome.failed;
                tracing::info!(
                    "{} page {}: {} listings, {} stored, {} skipped",
                    self.category,
                    self.page,
                    found,
                    outcome.completed,
                    outcome.failed
                );
                self.transition(PaginationState::Advancing);
            }
            Err(e) => self.fail(e),
        }
    }

    async fn advance(&mut self) {
        let crawler = &self.config.crawler;

        if self.page % crawler.snapshot_every.max(1) == 0
            && self.sink.send(SinkCommand::Snapshot).await.is_err()
        {
            self.fail(HarvestError::SinkClosed);
            return;
        }

        self.page += 1;
        if self.page > crawler.max_pages {
            self.transition(PaginationState::Exhausted);
            return;
        }

        if crawler.page_delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(crawler.page_delay_ms)).await;
        }
        self.transition(PaginationState::Fetching);
    }

    fn transition(&mut self, next: PaginationState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "{} -> {}",
            self.state,
            next
        );
        tracing::trace!("{}: {} -> {}", self.category, self.state, next);
        self.state = next;
    }

    fn fail(&mut self, error: HarvestError) {
        tracing::error!("{} listings stopped: {}", self.category, error);
        self.report.failure = Some(error.to_string());
        // Failure is reachable from every active state
        self.state = PaginationState::Failed;
    }

    fn finish(mut self) -> CategoryReport {
        self.report.final_state = self.state;
        tracing::info!(
            "{} listings {}: {} pages, {} page failures, {} records, {} detail failures",
            self.category,
            self.state,
            self.report.pages_processed,
            self.report.page_failures,
            self.report.details_completed,
            self.report.details_failed
        );
        self.report
    }
}
