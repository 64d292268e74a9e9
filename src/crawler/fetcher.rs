//! Rate-limited HTTP fetcher with retry and backoff
//!
//! One fetcher instance backs the sequential listing loop; detail fetches
//! each construct their own isolated instance (own cookie jar, own session)
//! because sessions are not shared across concurrently executing fetch
//! tasks.

use std::num::NonZeroU32;
use std::time::Duration;

use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use rand::seq::SliceRandom;
use reqwest::{
    header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, USER_AGENT},
    Client,
};

use crate::error::FetchError;

/// Pool of realistic User-Agent strings for rotation
const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:121.0) Gecko/20100101 Firefox/121.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.2 Safari/605.1.15",
];

/// Requests-per-second quota for single-use isolated fetchers
const ISOLATED_RPS: u32 = 1;

/// HTML page fetcher with rate limiting and bounded retries
pub struct PageFetcher {
    /// HTTP client with configured timeout and compression
    client: Client,

    /// Rate limiter to control request frequency
    rate_limiter: RateLimiter<NotKeyed, InMemoryState, DefaultClock>,

    /// Maximum number of retry attempts for failed requests
    max_retries: u32,

    /// Base delay in milliseconds for exponential backoff
    base_delay_ms: u64,
}

impl PageFetcher {
    /// Create a new fetcher with default retry settings
    ///
    /// # Errors
    ///
    /// Returns `FetchError::Http` if the HTTP client cannot be created
    pub fn new(requests_per_second: u32, timeout: Duration) -> Result<Self, FetchError> {
        Self::with_config(requests_per_second, 3, timeout)
    }

    /// Create a new fetcher with custom retry configuration
    ///
    /// # Errors
    ///
    /// Returns `FetchError::Http` if the HTTP client cannot be created
    pub fn with_config(
        requests_per_second: u32,
        max_retries: u32,
        timeout: Duration,
    ) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .gzip(true)
            .cookie_store(true)
            .build()?;

        let rate = NonZeroU32::new(requests_per_second).unwrap_or(NonZeroU32::MIN);
        let rate_limiter = RateLimiter::direct(Quota::per_second(rate));

        Ok(Self {
            client,
            rate_limiter,
            max_retries,
            base_delay_ms: 1000,
        })
    }

    /// Create a single-use fetcher with its own isolated session
    ///
    /// Each concurrent detail fetch owns one of these for the duration of
    /// its task and drops it at task end; no session state is shared between
    /// sibling fetches.
    ///
    /// # Errors
    ///
    /// Returns `FetchError::Http` if the HTTP client cannot be created
    pub fn isolated(timeout: Duration) -> Result<Self, FetchError> {
        Self::with_config(ISOLATED_RPS, 3, timeout)
    }

    /// Fetch a page with rate limiting and retry
    ///
    /// # Errors
    ///
    /// Returns `FetchError::Timeout` when the request deadline expires,
    /// `FetchError::ServerError` for non-retryable statuses, and
    /// `FetchError::MaxRetriesExceeded` when all retries fail
    pub async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        self.rate_limiter.until_ready().await;
        self.fetch_with_retry(url).await
    }

    async fn fetch_with_retry(&self, url: &str) -> Result<String, FetchError> {
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = self.base_delay_ms * 2_u64.pow(attempt - 1);
                tokio::time::sleep(Duration::from_millis(delay)).await;
            }

            let headers = self.build_headers();

            match self.client.get(url).headers(headers).send().await {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        return Ok(response.text().await?);
                    } else if Self::should_retry(status.as_u16()) {
                        last_error = Some(FetchError::ServerError(status.as_u16()));
                        continue;
                    } else {
                        return Err(FetchError::ServerError(status.as_u16()));
                    }
                }
                Err(e) => {
                    if e.is_timeout() {
                        last_error = Some(FetchError::Timeout);
                    } else {
                        last_error = Some(FetchError::Http(e));
                    }
                }
            }
        }

        // All retries exhausted; surface timeout distinctly since the caller
        // treats it as a bounded-wait expiry rather than a hard failure
        match last_error {
            Some(FetchError::Timeout) => Err(FetchError::Timeout),
            _ => Err(FetchError::MaxRetriesExceeded),
        }
    }

    /// Determine if a status code should trigger a retry
    ///
    /// Retry on 429 and transient 5xx; never on 4xx client errors.
    fn should_retry(status: u16) -> bool {
        matches!(status, 429 | 500 | 502 | 503 | 504)
    }

    fn build_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();

        headers.insert(USER_AGENT, HeaderValue::from_static(self.random_user_agent()));
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
            ),
        );
        headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_static("en-GB,en;q=0.9,en-US;q=0.8"),
        );

        headers
    }

    fn random_user_agent(&self) -> &'static str {
        let mut rng = rand::thread_rng();
        USER_AGENTS.choose(&mut rng).unwrap_or(&USER_AGENTS[0])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_retry() {
        assert!(PageFetcher::should_retry(429));
        assert!(PageFetcher::should_retry(500));
        assert!(PageFetcher::should_retry(502));
        assert!(PageFetcher::should_retry(503));
        assert!(PageFetcher::should_retry(504));

        assert!(!PageFetcher::should_retry(400));
        assert!(!PageFetcher::should_retry(403));
        assert!(!PageFetcher::should_retry(404));
        assert!(!PageFetcher::should_retry(200));
    }

    #[test]
    fn test_user_agent_rotation() {
        let fetcher = PageFetcher::new(10, Duration::from_secs(5)).unwrap();

        let mut agents = std::collections::HashSet::new();
        for _ in 0..100 {
            let agent = fetcher.random_user_agent();
            assert!(USER_AGENTS.contains(&agent));
            agents.insert(agent);
        }
        assert!(agents.len() > 1, "User agents should rotate");
    }

    #[test]
    fn test_fetcher_creation() {
        assert!(PageFetcher::new(10, Duration::from_secs(5)).is_ok());
        assert!(PageFetcher::isolated(Duration::from_secs(5)).is_ok());
        // A zero rate falls back to the minimum quota instead of panicking
        assert!(PageFetcher::new(0, Duration::from_secs(5)).is_ok());
    }
}
