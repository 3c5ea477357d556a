//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests of a crawl:
//! - Building one shared client with the browser-like headers the site requires
//! - Single GET requests, classified into success, HTTP failure and transport failure
//!
//! No retrying happens here; see [`crate::crawler::retry`].

use crate::config::{CrawlerConfig, SiteConfig};
use crate::{ConfigError, FetchError, HarvestError};
use reqwest::header::{HeaderMap, HeaderValue, REFERER};
use reqwest::Client;
use std::time::Duration;

/// A successfully fetched page
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Final URL after redirects
    pub url: String,

    /// HTTP status code (always 2xx)
    pub status: u16,

    /// Page body
    pub body: String,
}

/// Builds the HTTP client shared by every request of a crawl
///
/// The site refuses requests that do not look like they come from a browser,
/// so the configured User-Agent and Referer are attached to every request.
pub fn build_http_client(site: &SiteConfig, crawler: &CrawlerConfig) -> Result<Client, HarvestError> {
    let referer = HeaderValue::from_str(&site.referer).map_err(|e| {
        ConfigError::Validation(format!("referer is not a valid header value: {}", e))
    })?;

    let mut headers = HeaderMap::new();
    headers.insert(REFERER, referer);

    let client = Client::builder()
        .user_agent(site.user_agent.clone())
        .default_headers(headers)
        .timeout(Duration::from_secs(crawler.request_timeout_secs))
        .connect_timeout(Duration::from_secs(crawler.connect_timeout_secs))
        .gzip(true)
        .brotli(true)
        .build()?;

    Ok(client)
}

/// Stateless page fetcher
///
/// Cloning is cheap and every clone shares the same connection pool, so one
/// fetcher is created per crawl and handed to every worker.
#[derive(Debug, Clone)]
pub struct PageFetcher {
    client: Client,
}

impl PageFetcher {
    /// Creates a fetcher with a client built from the configuration
    pub fn new(site: &SiteConfig, crawler: &CrawlerConfig) -> Result<Self, HarvestError> {
        Ok(Self::with_client(build_http_client(site, crawler)?))
    }

    /// Wraps an existing client
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// Performs a single GET request
    ///
    /// | Outcome | Result |
    /// |---------|--------|
    /// | 2xx | `Ok(FetchedPage)` |
    /// | 4xx / 5xx | `FetchError::Status` |
    /// | DNS, connect, TLS, timeout, body read | `FetchError::Transport` |
    pub async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| FetchError::Transport {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let final_url = response.url().to_string();
        let body = response
            .text()
            .await
            .map_err(|source| FetchError::Transport {
                url: url.to_string(),
                source,
            })?;

        tracing::trace!("Fetched {} ({} bytes)", final_url, body.len());

        Ok(FetchedPage {
            url: final_url,
            status: status.as_u16(),
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_fetcher() -> PageFetcher {
        let site = SiteConfig {
            user_agent: "Mozilla/5.0 (X11; Linux x86_64) TestBrowser/1.0".to_string(),
            referer: "https://listings.example.com/en/search/".to_string(),
            ..SiteConfig::default()
        };
        PageFetcher::new(&site, &CrawlerConfig::default()).unwrap()
    }

    #[test]
    fn test_build_http_client() {
        let client = build_http_client(&SiteConfig::default(), &CrawlerConfig::default());
        assert!(client.is_ok());
    }

    #[test]
    fn test_invalid_referer_is_config_error() {
        let site = SiteConfig {
            referer: "https://example.com/\n".to_string(),
            ..SiteConfig::default()
        };
        let result = build_http_client(&site, &CrawlerConfig::default());
        assert!(matches!(result, Err(HarvestError::Config(_))));
    }

    #[tokio::test]
    async fn test_fetch_sends_browser_headers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/listing"))
            .and(header(
                "user-agent",
                "Mozilla/5.0 (X11; Linux x86_64) TestBrowser/1.0",
            ))
            .and(header("referer", "https://listings.example.com/en/search/"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>ok</html>"))
            .expect(1)
            .mount(&server)
            .await;

        let page = test_fetcher()
            .fetch(&format!("{}/listing", server.uri()))
            .await
            .unwrap();
        assert_eq!(page.status, 200);
        assert_eq!(page.body, "<html>ok</html>");
    }

    #[tokio::test]
    async fn test_fetch_client_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let url = format!("{}/gone", server.uri());
        let err = test_fetcher().fetch(&url).await.unwrap_err();
        assert!(matches!(err, FetchError::Status { status: 404, .. }));
        assert!(err.is_client_error());
        assert!(!err.is_transient());
        assert_eq!(err.url(), url);
    }

    #[tokio::test]
    async fn test_fetch_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = test_fetcher()
            .fetch(&format!("{}/busy", server.uri()))
            .await
            .unwrap_err();
        assert!(err.is_server_error());
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn test_fetch_transport_error() {
        // Nothing listens on port 1
        let err = test_fetcher()
            .fetch("http://127.0.0.1:1/unreachable")
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Transport { .. }));
        assert_eq!(err.status(), None);
        assert!(err.is_transient());
    }
}
