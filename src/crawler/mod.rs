//! Crawler module for listing discovery and extraction
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with optional retry of transient failures
//! - Index page parsing into listing URLs and stub records
//! - Detail page extraction (embedded payload and attribute tables)
//! - The bounded detail worker pool
//! - Per-category pagination and overall crawl orchestration

mod detail_parser;
mod fetcher;
mod harvester;
mod index_parser;
mod labels;
mod paginator;
mod pool;
pub mod retry;

pub use detail_parser::{extract_detail, DetailStats, PAYLOAD_MARKER, TABLE_ROW_SELECTOR};
pub use fetcher::{build_http_client, FetchedPage, PageFetcher};
pub use harvester::{run_crawl, Harvester};
pub use index_parser::{
    extract_listing_cards, stub_for, ListingCard, CARD_LINK_SELECTOR, CARD_PRICE_SELECTOR,
    CARD_SELECTOR,
};
pub use labels::{match_label, LabelMatch, LabelRule, LABEL_RULES};
pub use paginator::{build_index_url, Paginator};
pub use pool::{BatchOutcome, DetailPool};
pub use retry::{fetch_with_retry, RetryPolicy};
