//! Optional retrying of transient fetch failures
//!
//! Retrying is off by default: a failed page or listing is skipped on the
//! first failure. With `retry-attempts > 0`, transport errors and 5xx answers
//! are repeated with a linearly growing pause; 4xx answers never are.

use crate::config::CrawlerConfig;
use crate::crawler::fetcher::{FetchedPage, PageFetcher};
use crate::FetchError;
use std::time::Duration;

/// How often and how patiently to repeat a transient failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Extra attempts after the first one
    pub attempts: u32,

    /// Pause before retry `n` is `backoff * n`
    pub backoff: Duration,
}

impl RetryPolicy {
    /// Single attempt, no retrying
    pub fn none() -> Self {
        Self {
            attempts: 0,
            backoff: Duration::ZERO,
        }
    }

    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self {
            attempts: config.retry_attempts,
            backoff: Duration::from_millis(config.retry_backoff_ms),
        }
    }

    /// Pause before the given retry (1-based)
    pub fn delay_for(&self, retry: u32) -> Duration {
        self.backoff.saturating_mul(retry)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::none()
    }
}

/// Fetches `url`, repeating transient failures as the policy allows
pub async fn fetch_with_retry(
    fetcher: &PageFetcher,
    url: &str,
    policy: RetryPolicy,
) -> Result<FetchedPage, FetchError> {
    let mut retry = 0;

    loop {
        match fetcher.fetch(url).await {
            Ok(page) => return Ok(page),
            Err(e) if e.is_transient() && retry < policy.attempts => {
                retry += 1;
                let delay = policy.delay_for(retry);
                tracing::debug!(
                    "Retrying {} in {:?} (attempt {}/{}): {}",
                    url,
                    delay,
                    retry,
                    policy.attempts,
                    e
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fetcher() -> PageFetcher {
        PageFetcher::new(&SiteConfig::default(), &CrawlerConfig::default()).unwrap()
    }

    fn quick(attempts: u32) -> RetryPolicy {
        RetryPolicy {
            attempts,
            backoff: Duration::from_millis(1),
        }
    }

    #[test]
    fn test_delay_grows_linearly() {
        let policy = RetryPolicy {
            attempts: 3,
            backoff: Duration::from_millis(200),
        };
        assert_eq!(policy.delay_for(1), Duration::from_millis(200));
        assert_eq!(policy.delay_for(3), Duration::from_millis(600));
    }

    #[test]
    fn test_default_is_no_retry() {
        assert_eq!(RetryPolicy::default().attempts, 0);
        assert_eq!(RetryPolicy::from_config(&CrawlerConfig::default()).attempts, 0);
    }

    #[tokio::test]
    async fn test_server_errors_are_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .expect(3)
            .mount(&server)
            .await;

        let result = fetch_with_retry(&fetcher(), &server.uri(), quick(2)).await;
        assert!(matches!(result, Err(FetchError::Status { status: 500, .. })));
    }

    #[tokio::test]
    async fn test_client_errors_are_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let result = fetch_with_retry(&fetcher(), &server.uri(), quick(5)).await;
        assert!(matches!(result, Err(FetchError::Status { status: 404, .. })));
    }

    #[tokio::test]
    async fn test_recovers_after_transient_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("fine"))
            .mount(&server)
            .await;

        let page = fetch_with_retry(&fetcher(), &server.uri(), quick(1))
            .await
            .unwrap();
        assert_eq!(page.body, "fine");
    }
}
