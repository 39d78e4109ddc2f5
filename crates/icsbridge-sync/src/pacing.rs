//! Delays between remote calls.
//!
//! The engine issues one remote call at a time and spaces them with a small
//! random pause to stay under the target calendar's quota. Rate-limit
//! responses are waited out for the server-provided duration, or
//! [`Pacing::default_retry_after`] when none was given.

use std::time::Duration;

use icsbridge_providers::ProviderError;
use rand::Rng;

/// An inclusive range of delays a pause is drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelayRange {
    /// Shortest pause.
    pub min: Duration,
    /// Longest pause.
    pub max: Duration,
}

impl DelayRange {
    /// Creates a range between `min_ms` and `max_ms` milliseconds.
    pub const fn from_millis(min_ms: u64, max_ms: u64) -> Self {
        Self {
            min: Duration::from_millis(min_ms),
            max: Duration::from_millis(max_ms),
        }
    }

    /// A range that never pauses.
    pub const fn zero() -> Self {
        Self::from_millis(0, 0)
    }

    /// Draws a delay from the range.
    pub fn sample(&self) -> Duration {
        if self.max <= self.min {
            return self.min;
        }
        rand::rng().random_range(self.min..=self.max)
    }
}

/// Pacing policy for one engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pacing {
    /// Pause between inventory pages.
    pub page_delay: DelayRange,
    /// Pause after each successful write.
    pub write_delay: DelayRange,
    /// Wait after a rate-limit response without `Retry-After`.
    pub default_retry_after: Duration,
    /// Rate-limit retries allowed per inventory read before giving up.
    pub max_list_retries: u32,
}

impl Pacing {
    /// Default wait after a rate-limit response.
    pub const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(60);

    /// Default bound on inventory rate-limit retries.
    pub const DEFAULT_MAX_LIST_RETRIES: u32 = 8;

    /// No pauses at all; rate-limit waits still honour `Retry-After`.
    pub fn none() -> Self {
        Self {
            page_delay: DelayRange::zero(),
            write_delay: DelayRange::zero(),
            ..Self::default()
        }
    }

    /// Sets the bound on inventory rate-limit retries.
    pub fn with_max_list_retries(mut self, retries: u32) -> Self {
        self.max_list_retries = retries;
        self
    }

    /// Sets the wait used when a rate-limit response names none.
    pub fn with_default_retry_after(mut self, wait: Duration) -> Self {
        self.default_retry_after = wait;
        self
    }

    /// How long to back off after `err`.
    pub fn retry_wait(&self, err: &ProviderError) -> Duration {
        err.retry_after().unwrap_or(self.default_retry_after)
    }

    /// Pauses between two inventory pages.
    pub async fn page_pause(&self) {
        pause(self.page_delay.sample()).await;
    }

    /// Pauses after a successful write.
    pub async fn write_pause(&self) {
        pause(self.write_delay.sample()).await;
    }
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            page_delay: DelayRange::from_millis(100, 300),
            write_delay: DelayRange::from_millis(50, 150),
            default_retry_after: Self::DEFAULT_RETRY_AFTER,
            max_list_retries: Self::DEFAULT_MAX_LIST_RETRIES,
        }
    }
}

pub(crate) async fn pause(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_stays_in_range() {
        let range = DelayRange::from_millis(50, 150);
        for _ in 0..100 {
            let delay = range.sample();
            assert!(delay >= Duration::from_millis(50));
            assert!(delay <= Duration::from_millis(150));
        }
    }

    #[test]
    fn degenerate_range() {
        assert_eq!(DelayRange::zero().sample(), Duration::ZERO);
        assert_eq!(
            DelayRange::from_millis(20, 20).sample(),
            Duration::from_millis(20)
        );
    }

    #[test]
    fn retry_wait_prefers_server_value() {
        let pacing = Pacing::default();
        let err = ProviderError::rate_limited("slow down").with_retry_after(Duration::from_secs(5));
        assert_eq!(pacing.retry_wait(&err), Duration::from_secs(5));

        let err = ProviderError::rate_limited("slow down");
        assert_eq!(pacing.retry_wait(&err), Duration::from_secs(60));
    }

    #[test]
    fn defaults() {
        let pacing = Pacing::default();
        assert_eq!(pacing.page_delay, DelayRange::from_millis(100, 300));
        assert_eq!(pacing.write_delay, DelayRange::from_millis(50, 150));
        assert_eq!(pacing.max_list_retries, 8);

        let none = Pacing::none();
        assert_eq!(none.page_delay, DelayRange::zero());
        assert_eq!(none.default_retry_after, Duration::from_secs(60));
    }

    #[tokio::test(start_paused = true)]
    async fn page_pause_sleeps() {
        let pacing = Pacing::default();
        let started = tokio::time::Instant::now();
        pacing.page_pause().await;
        assert!(started.elapsed() >= Duration::from_millis(100));
    }
}
