use crate::state::Category;
use serde::Deserialize;

/// Main configuration structure for Immo-Harvest
///
/// Every section has defaults, so an empty file is a valid configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub crawler: CrawlerConfig,
    pub site: SiteConfig,
    pub output: OutputConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CrawlerConfig {
    /// Number of detail pages fetched concurrently
    pub max_concurrent_details: u32,

    /// Hard cap on index pages crawled per category
    pub max_pages: u32,

    /// A snapshot is written every this many index pages
    pub snapshot_every: u32,

    /// Fixed pause between two index pages (milliseconds)
    pub page_delay_ms: u64,

    /// Total per-request timeout (seconds)
    pub request_timeout_secs: u64,

    /// Connection establishment timeout (seconds)
    pub connect_timeout_secs: u64,

    /// Extra attempts for transient failures; 0 disables retrying
    pub retry_attempts: u32,

    /// Base delay between retries, multiplied by the attempt number (milliseconds)
    pub retry_backoff_ms: u64,

    /// Listing categories crawled, in order
    pub categories: Vec<Category>,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_details: 16,
            max_pages: 333,
            snapshot_every: 10,
            page_delay_ms: 0,
            request_timeout_secs: 30,
            connect_timeout_secs: 10,
            retry_attempts: 0,
            retry_backoff_ms: 1000,
            categories: vec![Category::Sale, Category::Rent],
        }
    }
}

/// Target site configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct SiteConfig {
    /// Base URL relative card links are resolved against
    pub base_url: String,

    /// Search endpoint; the category path segment is appended to it
    pub search_url: String,

    /// Value of the `countries` query parameter
    pub countries: String,

    /// Value of the `orderBy` query parameter
    pub order_by: String,

    /// Value of the `priceType` query parameter for rentals
    pub rent_price_type: String,

    /// Browser-like User-Agent; the site rejects other clients
    pub user_agent: String,

    /// Referer header sent with every request
    pub referer: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.immoweb.be".to_string(),
            search_url: "https://www.immoweb.be/en/search/house-and-apartment".to_string(),
            countries: "BE".to_string(),
            order_by: "relevance".to_string(),
            rent_price_type: "MONTHLY_RENTAL_PRICE".to_string(),
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36"
                .to_string(),
            referer: "https://www.immoweb.be/en/search/".to_string(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct OutputConfig {
    /// Append-only JSON-lines record log
    pub records_path: String,

    /// Full-collection JSON array snapshot
    pub snapshot_path: String,

    /// Flattened CSV export
    pub csv_path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            records_path: "data/houses.jsonl".to_string(),
            snapshot_path: "data/houses.json".to_string(),
            csv_path: "data/houses.csv".to_string(),
        }
    }
}
