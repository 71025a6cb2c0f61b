//! Request pacing for the TMDB API.

use std::time::{Duration, Instant};

/// Default minimum gap between requests (TMDB allows roughly 40 req/s).
const DEFAULT_MIN_INTERVAL: Duration = Duration::from_millis(25);

/// Minimum-interval limiter shared by every request a client issues.
///
/// Paging through several categories at once fans out into bursts of
/// requests; the limiter spaces them so the burst stays under the
/// upstream quota instead of tripping HTTP 429.
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub struct TmdbRateLimiter {
    /// Minimum gap between two consecutive requests.
    min_interval: Duration,
    /// When the previous request was released.
    last_request: Option<Instant>,
}

impl TmdbRateLimiter {
    /// Creates a limiter with the given minimum interval.
    pub(crate) const fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_request: None,
        }
    }

    /// Creates a limiter with the default interval (25ms).
    pub(crate) const fn default_interval() -> Self {
        Self::new(DEFAULT_MIN_INTERVAL)
    }

    /// Waits until the next request may be sent and returns how long it slept.
    pub async fn acquire(&mut self) -> Duration {
        let mut waited = Duration::ZERO;

        if let Some(last) = self.last_request {
            let elapsed = last.elapsed();
            if elapsed < self.min_interval {
                waited = self.min_interval.saturating_sub(elapsed);
                tracing::trace!(wait_ms = waited.as_millis(), "TMDB request throttled");
                tokio::time::sleep(waited).await;
            }
        }

        self.last_request = Some(Instant::now());
        waited
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[tokio::test]
    async fn test_first_acquire_does_not_wait() {
        // Arrange
        let mut limiter = TmdbRateLimiter::new(Duration::from_secs(1));

        // Act
        let waited = limiter.acquire().await;

        // Assert
        assert_eq!(waited, Duration::ZERO);
        assert!(limiter.last_request.is_some());
    }

    #[tokio::test]
    async fn test_back_to_back_acquire_is_spaced() {
        // Arrange
        let mut limiter = TmdbRateLimiter::new(Duration::from_millis(50));

        // Act
        let start = Instant::now();
        limiter.acquire().await;
        let waited = limiter.acquire().await;
        let elapsed = start.elapsed();

        // Assert
        assert!(waited > Duration::ZERO);
        assert!(elapsed >= Duration::from_millis(50));
    }

    #[tokio::test]
    async fn test_zero_interval_never_waits() {
        // Arrange
        let mut limiter = TmdbRateLimiter::new(Duration::ZERO);

        // Act
        limiter.acquire().await;
        let waited = limiter.acquire().await;

        // Assert
        assert_eq!(waited, Duration::ZERO);
    }

    #[test]
    fn test_default_interval() {
        // Arrange & Act
        let limiter = TmdbRateLimiter::default_interval();

        // Assert
        assert_eq!(limiter.min_interval, Duration::from_millis(25));
    }
}
