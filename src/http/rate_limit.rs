//! Client-side request throttling
//!
//! Token bucket rate limiting via governor, applied before every request.

use governor::clock::DefaultClock;
use governor::middleware::NoOpMiddleware;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter as Governor};
use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;
use std::sync::Arc;

/// Configuration for rate limiting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimiterConfig {
    /// Maximum number of requests per second
    pub requests_per_second: u32,
    /// Burst size (max tokens in bucket)
    #[serde(default = "default_burst")]
    pub burst_size: u32,
}

fn default_burst() -> u32 {
    5
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self {
            requests_per_second: 5,
            burst_size: default_burst(),
        }
    }
}

impl RateLimiterConfig {
    /// Create a new rate limiter config
    pub fn new(requests_per_second: u32, burst_size: u32) -> Self {
        Self {
            requests_per_second,
            burst_size,
        }
    }
}

/// Token bucket rate limiter shared by clones of a client
#[derive(Clone)]
pub struct RateLimiter {
    limiter: Arc<Governor<NotKeyed, InMemoryState, DefaultClock, NoOpMiddleware>>,
}

impl RateLimiter {
    /// Create a new rate limiter with the given config
    ///
    /// Zero values are treated as one.
    pub fn new(config: &RateLimiterConfig) -> Self {
        let rate = NonZeroU32::new(config.requests_per_second).unwrap_or(NonZeroU32::MIN);
        let burst = NonZeroU32::new(config.burst_size).unwrap_or(NonZeroU32::MIN);

        Self {
            limiter: Arc::new(Governor::direct(Quota::per_second(rate).allow_burst(burst))),
        }
    }

    /// Wait until a request can be made
    pub async fn wait(&self) {
        self.limiter.until_ready().await;
    }

    /// Try to acquire a permit, returning immediately
    pub fn try_acquire(&self) -> bool {
        self.limiter.check().is_ok()
    }
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter").finish()
    }
}

#[cfg(test)]
mod rate_limit_tests {
    use super::*;

    #[test]
    fn test_rate_limiter_config_default() {
        let config = RateLimiterConfig::default();
        assert_eq!(config.requests_per_second, 5);
        assert_eq!(config.burst_size, 5);
    }

    #[test]
    fn test_rate_limiter_config_deserialize_default_burst() {
        let config: RateLimiterConfig =
            serde_yaml::from_str("requests_per_second: 20").unwrap();
        assert_eq!(config, RateLimiterConfig::new(20, 5));
    }

    #[tokio::test]
    async fn test_rate_limiter_allows_burst_then_blocks() {
        let limiter = RateLimiter::new(&RateLimiterConfig::new(1, 3));

        for _ in 0..3 {
            assert!(limiter.try_acquire());
        }
        assert!(!limiter.try_acquire());
    }

    #[tokio::test]
    async fn test_rate_limiter_zero_is_one() {
        let limiter = RateLimiter::new(&RateLimiterConfig::new(0, 0));
        assert!(limiter.try_acquire());
    }

    #[tokio::test]
    async fn test_rate_limiter_wait_within_burst() {
        let limiter = RateLimiter::new(&RateLimiterConfig::new(100, 10));
        limiter.wait().await;
    }
}
