//! HTTP client with rate limiting for media downloads
//!
//! This module provides a rate-limited HTTP client that spaces requests to
//! media hosts, refuses redirects when asked to, and retries transient
//! failures (429, 5xx) with exponential backoff.

use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::time::sleep;
use tracing::{debug, info};

use crate::config::DownloadConfig;
use crate::error::{FetchError, Result};

/// Rate limiter to control request frequency
///
/// Ensures that requests are spaced at least `min_interval` apart.
pub struct RateLimiter {
    /// Minimum interval between requests
    min_interval: Duration,
    /// Timestamp of the last request
    last_request: Arc<Mutex<Instant>>,
}

impl RateLimiter {
    /// Create a new rate limiter with the specified requests per second
    ///
    /// # Arguments
    /// * `requests_per_second` - Maximum number of requests allowed per second
    ///
    /// # Errors
    /// Returns `FetchError::InvalidConfig` when the rate is not positive or
    /// its interval does not fit in a `Duration`
    ///
    /// # Example
    /// ```
    /// use toonfetch_core::client::RateLimiter;
    ///
    /// let limiter = RateLimiter::new(2.0).unwrap(); // 2 requests per second
    /// assert!(RateLimiter::new(0.0).is_err());
    /// ```
    pub fn new(requests_per_second: f64) -> Result<Self> {
        let min_interval = request_interval(requests_per_second)?;
        let now = Instant::now();
        Ok(Self {
            min_interval,
            last_request: Arc::new(Mutex::new(now.checked_sub(min_interval).unwrap_or(now))),
        })
    }

    /// Acquire permission to make a request
    ///
    /// Waits if necessary so the minimum interval between requests is respected.
    pub async fn acquire(&self) {
        let mut last = self.last_request.lock().await;
        let elapsed = last.elapsed();

        if elapsed < self.min_interval {
            let wait_time = self.min_interval - elapsed;
            sleep(wait_time).await;
        }

        *last = Instant::now();
    }

    /// Get the minimum interval between requests
    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }
}

/// Minimum spacing between requests for a given rate
///
/// # Errors
/// Returns `FetchError::InvalidConfig` for NaN, non-positive rates and rates
/// so small that the interval overflows a `Duration`
pub fn request_interval(requests_per_second: f64) -> Result<Duration> {
    if requests_per_second.is_nan() || requests_per_second <= 0.0 {
        return Err(FetchError::InvalidConfig(
            "download.requests_per_second must be positive".to_string(),
        ));
    }
    Duration::try_from_secs_f64(1.0 / requests_per_second).map_err(|_| {
        FetchError::InvalidConfig(format!(
            "download.requests_per_second is too small: {}",
            requests_per_second
        ))
    })
}

/// HTTP client for media hosts with rate limiting and retry logic
///
/// This client automatically:
/// - Limits request rate between consecutive media fetches
/// - Retries on transient errors (429, 5xx) with exponential backoff
/// - Reports 3xx as `RedirectBlocked` instead of following it, when configured
pub struct MediaClient {
    /// Underlying HTTP client
    client: reqwest::Client,
    /// Rate limiter for request throttling
    rate_limiter: RateLimiter,
    max_retries: u32,
    retry_base_delay: Duration,
    block_redirects: bool,
}

impl MediaClient {
    /// Create a new client with default download settings
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be created
    pub fn new() -> Result<Self> {
        Self::with_config(&DownloadConfig::default())
    }

    /// Create a new client from download settings
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be created or the
    /// request rate is not positive
    pub fn with_config(config: &DownloadConfig) -> Result<Self> {
        let rate_limiter = RateLimiter::new(config.requests_per_second)?;

        let redirect = if config.block_redirects {
            reqwest::redirect::Policy::none()
        } else {
            reqwest::redirect::Policy::limited(10)
        };

        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .redirect(redirect)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            rate_limiter,
            max_retries: config.max_retries,
            retry_base_delay: Duration::from_millis(config.retry_base_delay_ms),
            block_redirects: config.block_redirects,
        })
    }

    /// Start a GET request and return the successful response with its body unread
    ///
    /// # Errors
    /// - `FetchError::RedirectBlocked` - 3xx while redirects are blocked
    /// - `FetchError::RateLimited` - Server returned 429 after all retries
    /// - `FetchError::HttpStatus` - Any other non-success status
    /// - `FetchError::Http` - Network failure
    pub async fn get(&self, url: &str) -> Result<reqwest::Response> {
        let mut attempt = 0;
        loop {
            // Wait for rate limiter before making request
            self.rate_limiter.acquire().await;

            debug!(url, attempt, "requesting media");
            let response = self.client.get(url).send().await?;
            let status = response.status();

            if status.is_success() {
                return Ok(response);
            }

            if status.is_redirection() && self.block_redirects {
                return Err(FetchError::RedirectBlocked {
                    status: status.as_u16(),
                    url: url.to_string(),
                });
            }

            let retryable =
                status == reqwest::StatusCode::TOO_MANY_REQUESTS || status.is_server_error();
            if retryable && attempt < self.max_retries {
                let delay = self.calculate_backoff_delay(attempt);
                info!(url, status = status.as_u16(), ?delay, "transient failure, retrying");
                sleep(delay).await;
                attempt += 1;
                continue;
            }

            if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                return Err(FetchError::RateLimited);
            }

            return Err(FetchError::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
    }

    /// Calculate exponential backoff delay for retry
    fn calculate_backoff_delay(&self, attempt: u32) -> Duration {
        // Exponential backoff: base, 2*base, 4*base, ...
        self.retry_base_delay
            .saturating_mul(2u32.saturating_pow(attempt.min(16)))
    }

    /// Get a reference to the rate limiter (for testing)
    #[cfg(test)]
    pub fn rate_limiter(&self) -> &RateLimiter {
        &self.rate_limiter
    }
}
