//! Request pacing and retry backoff.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::{sleep_until, Instant};

use super::GeocodeError;
use crate::config::GeocoderConfig;

/// Enforces a minimum spacing between the starts of consecutive requests.
///
/// The lock is held while waiting, so at most one request is released at a
/// time.
pub struct RateLimiter {
    min_interval: Duration,
    last: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last: Mutex::new(None),
        }
    }

    /// Wait until the next request may start, then claim the slot
    pub async fn acquire(&self) {
        let mut last = self.last.lock().await;
        if let Some(previous) = *last {
            sleep_until(previous + self.min_interval).await;
        }
        *last = Some(Instant::now());
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }
}

/// Linear backoff schedules for failed and rate-limited requests
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Attempt `n` of a failed request waits `base * n`
    pub base: Duration,
    pub max_retries: u32,
    /// Attempt `n` of a rate-limited request waits `rate_limit_base * n`
    pub rate_limit_base: Duration,
    pub max_rate_limit_retries: u32,
}

impl RetryPolicy {
    pub fn from_config(config: &GeocoderConfig) -> Self {
        Self {
            base: Duration::from_millis(config.retry_base_ms),
            max_retries: config.max_retries,
            rate_limit_base: Duration::from_millis(config.rate_limit_base_ms),
            max_rate_limit_retries: config.max_rate_limit_retries,
        }
    }

    /// Backoff before the next attempt, or `None` once the schedule for this
    /// kind of failure is exhausted. Counters are retries already made.
    pub fn backoff(
        &self,
        error: &GeocodeError,
        retries: u32,
        rate_limit_retries: u32,
    ) -> Option<Duration> {
        match error {
            GeocodeError::MissingUserAgent => None,
            GeocodeError::RateLimited => (rate_limit_retries < self.max_rate_limit_retries)
                .then(|| self.rate_limit_base * (rate_limit_retries + 1)),
            _ => (retries < self.max_retries).then(|| self.base * (retries + 1)),
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&GeocoderConfig::default())
    }
}
