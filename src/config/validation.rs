use crate::config::types::{Config, CrawlerConfig, OutputConfig, SiteConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_site_config(&config.site)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.max_concurrent_details < 1 || config.max_concurrent_details > 64 {
        return Err(ConfigError::Validation(format!(
            "max_concurrent_details must be between 1 and 64, got {}",
            config.max_concurrent_details
        )));
    }

    if config.max_pages < 1 {
        return Err(ConfigError::Validation(format!(
            "max_pages must be >= 1, got {}",
            config.max_pages
        )));
    }

    if config.snapshot_every < 1 {
        return Err(ConfigError::Validation(format!(
            "snapshot_every must be >= 1, got {}",
            config.snapshot_every
        )));
    }

    if config.request_timeout_secs < 1 || config.connect_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "request and connect timeouts must be >= 1s".to_string(),
        ));
    }

    if config.categories.is_empty() {
        return Err(ConfigError::Validation(
            "at least one listing category must be configured".to_string(),
        ));
    }

    for (i, category) in config.categories.iter().enumerate() {
        if config.categories[..i].contains(category) {
            return Err(ConfigError::Validation(format!(
                "category '{}' is listed more than once",
                category
            )));
        }
    }

    Ok(())
}

/// Validates site configuration
fn validate_site_config(config: &SiteConfig) -> Result<(), ConfigError> {
    validate_http_url("base_url", &config.base_url)?;
    validate_http_url("search_url", &config.search_url)?;
    validate_http_url("referer", &config.referer)?;

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    if config.countries.trim().is_empty() {
        return Err(ConfigError::Validation(
            "countries cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.records_path.is_empty() {
        return Err(ConfigError::Validation(
            "records_path cannot be empty".to_string(),
        ));
    }

    if config.snapshot_path.is_empty() {
        return Err(ConfigError::Validation(
            "snapshot_path cannot be empty".to_string(),
        ));
    }

    if config.records_path == config.snapshot_path {
        return Err(ConfigError::Validation(
            "records_path and snapshot_path must differ".to_string(),
        ));
    }

    Ok(())
}

/// Checks that `value` parses as an absolute http(s) URL
fn validate_http_url(field: &str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {} '{}': {}", field, value, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "{} '{}' must use http or https",
            field, value
        )));
    }

    Ok(())
}
