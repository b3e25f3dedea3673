use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter as GovernorRateLimiter,
};
use std::num::NonZeroU32;

use super::client::RateLimitConfig;

/// Enforces a minimum interval between outgoing calls.
///
/// One instance is shared by every request a client makes; hand the same
/// `Arc<RateLimiter>` to each client that talks to the same provider.
pub struct RateLimiter {
    limiter: GovernorRateLimiter<NotKeyed, InMemoryState, DefaultClock>,
}

impl RateLimiter {
    pub fn new(config: &RateLimitConfig) -> Self {
        let quota = Quota::with_period(config.min_interval)
            .unwrap_or_else(|| Quota::per_second(NonZeroU32::MIN))
            .allow_burst(NonZeroU32::MIN);

        Self {
            limiter: GovernorRateLimiter::direct(quota),
        }
    }

    /// Wait until the next call is allowed
    pub async fn acquire(&self) {
        self.limiter.until_ready().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    fn config(ms: u64) -> RateLimitConfig {
        RateLimitConfig {
            min_interval: Duration::from_millis(ms),
            rate_limit_backoff: Duration::from_millis(10),
        }
    }

    #[tokio::test]
    async fn test_first_call_is_immediate() {
        let limiter = RateLimiter::new(&config(500));

        let start = Instant::now();
        limiter.acquire().await;
        assert!(start.elapsed() < Duration::from_millis(100));
    }

    #[tokio::test]
    async fn test_shared_limiter_paces_every_holder() {
        let limiter = std::sync::Arc::new(RateLimiter::new(&config(200)));
        let other = limiter.clone();
        limiter.acquire().await;

        let start = Instant::now();
        other.acquire().await;
        assert!(start.elapsed() >= Duration::from_millis(150));
    }
}
