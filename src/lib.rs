//! Immo-Harvest: a real-estate listing harvester
//!
//! This crate crawls the paginated search results of a listing site, follows
//! every listing card to its detail page, and normalizes each listing into a
//! canonical [`Record`] that is appended to a JSON-lines log.

pub mod config;
pub mod crawler;
pub mod output;
pub mod record;
pub mod state;
pub mod storage;

use thiserror::Error;

/// Main error type for Immo-Harvest operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("Invalid start URL for {category} listings: {message}")]
    InvalidStartUrl { category: String, message: String },

    #[error("Record sink is closed")]
    SinkClosed,
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Failure of a single HTTP GET
///
/// Neither variant is fatal to a crawl: the page or listing is skipped.
#[derive(Debug, Error)]
pub enum FetchError {
    /// DNS, connection, TLS or timeout failure
    #[error("Transport error for {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with a non-2xx status
    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },
}

impl FetchError {
    /// The URL the failed request was sent to
    pub fn url(&self) -> &str {
        match self {
            Self::Transport { url, .. } | Self::Status { url, .. } => url,
        }
    }

    /// Returns the HTTP status code, if the server answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Transport { .. } => None,
        }
    }

    /// 4xx: the listing is gone or the request was refused
    pub fn is_client_error(&self) -> bool {
        matches!(self.status(), Some(400..=499))
    }

    /// 5xx: trouble on the server side
    pub fn is_server_error(&self) -> bool {
        matches!(self.status(), Some(500..=599))
    }

    /// Returns true if repeating the request could succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transport { .. }) || self.is_server_error()
    }
}

/// Detail page does not carry a usable embedded listing payload
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("No embedded listing payload on {url}")]
    MissingPayload { url: String },

    #[error("Malformed listing payload on {url}: {message}")]
    MalformedPayload { url: String, message: String },
}

/// Result type alias for Immo-Harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{run_crawl, Harvester};
pub use output::CrawlSummary;
pub use record::Record;
pub use state::{Category, PaginationState};
