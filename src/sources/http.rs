//! Shared HTTP plumbing for the source adapters
//!
//! One fetcher per external site, carrying a fixed per-request deadline, a
//! bounded retry loop with linear backoff, and a global minimum-interval
//! rate limiter shared by every caller of that site.

use crate::config::HttpConfig;
use crate::error::{Error, Result};
use reqwest::StatusCode;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Global minimum-interval-between-starts rate limiter.
///
/// The lock is held across the sleep so the interval constraint applies
/// between request *starts* across all concurrent callers, not per worker.
pub struct RateLimiter {
    min_interval: Duration,
    last_start: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_start: Mutex::new(None),
        }
    }

    /// Wait until the minimum interval since the previous start has
    /// elapsed, then record this start.
    pub async fn acquire(&self) {
        let mut last = self.last_start.lock().await;
        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < self.min_interval {
                tokio::time::sleep(self.min_interval - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }
}

/// Rate-limited, retrying HTTP fetcher for one external site
pub struct HttpFetcher {
    client: reqwest::Client,
    limiter: RateLimiter,
    retry_attempts: u32,
    retry_backoff: Duration,
}

impl HttpFetcher {
    /// Build a fetcher with the shared transport settings and a
    /// site-specific rate limit.
    pub fn new(http: &HttpConfig, rate_limit: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(http.timeout_secs))
            .user_agent(http.user_agent.clone())
            .build()?;

        Ok(Self {
            client,
            limiter: RateLimiter::new(rate_limit),
            retry_attempts: http.retry_attempts.max(1),
            retry_backoff: Duration::from_millis(http.retry_backoff_ms),
        })
    }

    /// GET a URL as text. `Ok(None)` on 404; transport failures and
    /// retryable statuses are retried with linear backoff before giving up.
    pub async fn get_text(&self, url: &str) -> Result<Option<String>> {
        let mut last_error = None;

        for attempt in 1..=self.retry_attempts {
            if attempt > 1 {
                tokio::time::sleep(self.retry_backoff * (attempt - 1)).await;
            }
            self.limiter.acquire().await;

            match self.client.get(url).send().await {
                Ok(response) => {
                    let status = response.status();
                    if status == StatusCode::NOT_FOUND {
                        return Ok(None);
                    }
                    if status.is_success() {
                        return Ok(Some(response.text().await?));
                    }
                    tracing::warn!(%url, %status, attempt, "Request failed, will retry");
                    last_error = Some(Error::Source(format!(
                        "GET {} returned status {}",
                        url, status
                    )));
                }
                Err(e) => {
                    tracing::warn!(%url, error = %e, attempt, "Request error, will retry");
                    last_error = Some(Error::Http(e));
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| Error::Source(format!("GET {} failed with no attempts", url))))
    }

    /// GET a URL as JSON. `Ok(None)` on 404 or a body that is not valid
    /// JSON (malformed content is a skip, not a failure).
    pub async fn get_json(&self, url: &str) -> Result<Option<serde_json::Value>> {
        let Some(body) = self.get_text(url).await? else {
            return Ok(None);
        };
        match serde_json::from_str(&body) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                tracing::warn!(%url, error = %e, "Response body is not valid JSON, skipping");
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn rate_limiter_spaces_out_starts() {
        let limiter = RateLimiter::new(Duration::from_millis(20));
        let start = Instant::now();

        limiter.acquire().await;
        limiter.acquire().await;
        limiter.acquire().await;

        // Two enforced gaps after the first free acquisition.
        assert!(start.elapsed() >= Duration::from_millis(40));
    }

    #[tokio::test]
    async fn first_acquire_does_not_wait() {
        let limiter = RateLimiter::new(Duration::from_secs(5));
        let start = Instant::now();
        limiter.acquire().await;
        assert!(start.elapsed() < Duration::from_millis(100));
    }
}
