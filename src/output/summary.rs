//! Crawl summary types and their text rendering

use crate::state::{Category, PaginationState};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Outcome of one category's pagination run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryReport {
    pub category: Category,

    /// State the driver stopped in (`Exhausted` or `Failed`)
    pub final_state: PaginationState,

    /// Index pages fetched and dispatched
    pub pages_processed: u32,

    /// Index pages skipped because their fetch failed
    pub page_failures: u32,

    /// Detail URLs found on the processed index pages
    pub listings_found: usize,

    pub details_completed: usize,
    pub details_failed: usize,

    /// Why the category stopped early, if it did
    pub failure: Option<String>,
}

impl CategoryReport {
    pub fn new(category: Category) -> Self {
        Self {
            category,
            final_state: PaginationState::Fetching,
            pages_processed: 0,
            page_failures: 0,
            listings_found: 0,
            details_completed: 0,
            details_failed: 0,
            failure: None,
        }
    }

    /// Page failures plus detail failures
    pub fn errors(&self) -> usize {
        self.page_failures as usize + self.details_failed
    }
}

/// Summary of a whole crawl
#[derive(Debug, Clone, Serialize)]
pub struct CrawlSummary {
    /// Records newly appended to the log during this run
    pub records_written: usize,

    /// Records in the collection at the end, including resumed ones
    pub total_records: usize,

    pub duplicates_skipped: usize,
    pub snapshots_written: usize,
    pub pages_processed: u32,

    /// Page failures plus detail failures over every category
    pub errors: usize,

    pub categories: Vec<CategoryReport>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl CrawlSummary {
    pub fn duration_seconds(&self) -> i64 {
        (self.finished_at - self.started_at).num_seconds()
    }

    /// Share of dispatched detail pages that produced a record
    pub fn success_rate(&self) -> f64 {
        let (completed, failed) = self
            .categories
            .iter()
            .fold((0, 0), |(c, f), report| {
                (c + report.details_completed, f + report.details_failed)
            });
        let attempted = completed + failed;
        if attempted == 0 {
            return 0.0;
        }
        (completed as f64 / attempted as f64) * 100.0
    }

    /// Categories that ended in `Failed` instead of running to their page cap
    pub fn stopped_categories(&self) -> usize {
        self.categories
            .iter()
            .filter(|report| !report.final_state.is_success())
            .count()
    }
}

/// Renders a summary as a short human-readable report
pub fn format_summary(summary: &CrawlSummary) -> String {
    let mut out = String::new();

    out.push_str("=== Immo-Harvest Crawl Summary ===\n\n");
    out.push_str(&format!("Started:   {}\n", summary.started_at.to_rfc3339()));
    out.push_str(&format!("Finished:  {}\n", summary.finished_at.to_rfc3339()));
    out.push_str(&format!("Duration:  {} seconds\n\n", summary.duration_seconds()));

    out.push_str(&format!("Records written:    {}\n", summary.records_written));
    out.push_str(&format!("Records total:      {}\n", summary.total_records));
    out.push_str(&format!("Duplicates skipped: {}\n", summary.duplicates_skipped));
    out.push_str(&format!("Snapshots written:  {}\n", summary.snapshots_written));
    out.push_str(&format!("Pages processed:    {}\n", summary.pages_processed));
    out.push_str(&format!("Errors:             {}\n", summary.errors));
    out.push_str(&format!("Detail success:     {:.2}%\n", summary.success_rate()));
    out.push_str(&format!("Stopped categories: {}\n", summary.stopped_categories()));

    if !summary.categories.is_empty() {
        out.push_str("\nCategory   State       Pages  Failed pages  Listings  Records  Failed\n");
        for report in &summary.categories {
            out.push_str(&format!(
                "{:<10} {:<11} {:>5}  {:>12}  {:>8}  {:>7}  {:>6}\n",
                report.category.as_str(),
                report.final_state.as_str(),
                report.pages_processed,
                report.page_failures,
                report.listings_found,
                report.details_completed,
                report.details_failed
            ));
            if let Some(failure) = &report.failure {
                out.push_str(&format!("           stopped: {}\n", failure));
            }
        }
    }

    out
}

/// Prints a summary to stdout
pub fn print_summary(summary: &CrawlSummary) {
    print!("{}", format_summary(summary));
}
