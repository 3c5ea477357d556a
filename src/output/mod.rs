//! Output module for crawl summaries and exports
//!
//! This module handles:
//! - The crawl summary and its per-category reports
//! - Rendering the summary for the terminal
//! - Flattening the record log into CSV

mod csv_export;
mod summary;

pub use csv_export::{columns, export_csv, flatten_record, NULL_MARKER};
pub use summary::{format_summary, print_summary, CategoryReport, CrawlSummary};

use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Failed to format record: {0}")]
    Json(serde_json::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;
