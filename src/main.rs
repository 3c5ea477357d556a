//! Immo-Harvest main entry point
//!
//! This is the command-line interface for the Immo-Harvest listing crawler.

use anyhow::Context;
use clap::Parser;
use immo_harvest::config::{load_config_with_hash, validate, Config};
use immo_harvest::crawler::{build_index_url, Harvester};
use immo_harvest::output::{export_csv, print_summary};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Immo-Harvest: a real-estate listing harvester
///
/// Immo-Harvest walks the search results of each listing category, visits
/// every listing, and appends one normalized JSON record per listing to a
/// log that survives interrupted runs.
#[derive(Parser, Debug)]
#[command(name = "immo-harvest")]
#[command(version)]
#[command(about = "A real-estate listing harvester", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (defaults apply when omitted)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Start from an empty record log instead of resuming
    #[arg(long)]
    fresh: bool,

    /// Validate config and show the first index URL of each category without crawling
    #[arg(long, conflicts_with = "export_csv")]
    dry_run: bool,

    /// Flatten the record log into CSV and exit
    #[arg(long, conflicts_with = "dry_run")]
    export_csv: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => {
            let config = Config::default();
            validate(&config).context("Default configuration is invalid")?;
            tracing::info!("No configuration file given, using defaults");
            config
        }
    };

    if cli.dry_run {
        handle_dry_run(&config)
    } else if cli.export_csv {
        handle_export_csv(&config)
    } else {
        handle_crawl(config, cli.fresh).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("immo_harvest=info,warn"),
            1 => EnvFilter::new("immo_harvest=debug,info"),
            2 => EnvFilter::new("immo_harvest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: shows the effective configuration
fn handle_dry_run(config: &Config) -> anyhow::Result<()> {
    println!("=== Immo-Harvest Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Detail workers: {}", config.crawler.max_concurrent_details);
    println!("  Max pages per category: {}", config.crawler.max_pages);
    println!("  Snapshot every: {} pages", config.crawler.snapshot_every);
    println!("  Page delay: {}ms", config.crawler.page_delay_ms);
    println!(
        "  Timeouts: {}s request, {}s connect",
        config.crawler.request_timeout_secs, config.crawler.connect_timeout_secs
    );
    println!(
        "  Retry: {} attempts, {}ms backoff",
        config.crawler.retry_attempts, config.crawler.retry_backoff_ms
    );

    println!("\nSite:");
    println!("  Base URL: {}", config.site.base_url);
    println!("  User agent: {}", config.site.user_agent);
    println!("  Referer: {}", config.site.referer);

    println!("\nOutput:");
    println!("  Records: {}", config.output.records_path);
    println!("  Snapshot: {}", config.output.snapshot_path);
    println!("  CSV: {}", config.output.csv_path);

    println!("\nCategories ({}):", config.crawler.categories.len());
    for &category in &config.crawler.categories {
        let url = build_index_url(&config.site, category, 1)
            .with_context(|| format!("Invalid search URL for {} listings", category))?;
        println!("  - {}: {}", category, url);
    }

    println!("\n✓ Configuration is valid");
    Ok(())
}

/// Handles the --export-csv mode: flattens the record log
fn handle_export_csv(config: &Config) -> anyhow::Result<()> {
    println!("=== Exporting Records ===\n");
    println!("Records: {}", config.output.records_path);
    println!("Output: {}", config.output.csv_path);
    println!();

    let rows = export_csv(&config.output.records_path, &config.output.csv_path)
        .context("CSV export failed")?;

    println!("✓ {} records exported to: {}", rows, config.output.csv_path);
    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config, fresh: bool) -> anyhow::Result<()> {
    if fresh {
        tracing::info!("Starting fresh crawl (discarding previous records)");
    } else {
        tracing::info!("Starting crawl (resuming from existing records)");
    }

    let harvester = Harvester::new(config, fresh)?;

    match harvester.run().await {
        Ok(summary) => {
            tracing::info!("Crawl completed successfully");
            print_summary(&summary);
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}
