//! Pacer implementations.
//!
//! - `FixedDelayPacer` sleeps a fixed interval before each call
//! - `GovernorPacer` enforces a quota using the governor crate
//! - `NoPacer` never waits (tests, offline runs)

use async_trait::async_trait;
use governor::{Quota, RateLimiter};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{Result, VerificationError};
use crate::traits::pacer::Pacer;

type DefaultRateLimiter = RateLimiter<
    governor::state::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

/// Sleeps a fixed delay before every call.
///
/// Uses `tokio::time::sleep`, so it follows tokio's clock and advances
/// instantly under a paused test runtime.
#[derive(Debug, Clone)]
pub struct FixedDelayPacer {
    delay: Duration,
}

impl FixedDelayPacer {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

impl Default for FixedDelayPacer {
    /// One second between search calls.
    fn default() -> Self {
        Self::new(Duration::from_secs(1))
    }
}

#[async_trait]
impl Pacer for FixedDelayPacer {
    async fn pause(&self) {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
    }
}

/// Quota-based pacing with burst support.
pub struct GovernorPacer {
    limiter: Arc<DefaultRateLimiter>,
}

impl GovernorPacer {
    /// Allow `requests_per_second` calls per second.
    pub fn per_second(requests_per_second: u32) -> Result<Self> {
        let rate = NonZeroU32::new(requests_per_second).ok_or_else(|| {
            VerificationError::Config("requests_per_second must be > 0".to_string())
        })?;
        Ok(Self::with_quota(Quota::per_second(rate)))
    }

    /// Allow one call per `period`.
    pub fn every(period: Duration) -> Result<Self> {
        let quota = Quota::with_period(period)
            .ok_or_else(|| VerificationError::Config("pacing period must be > 0".to_string()))?;
        Ok(Self::with_quota(quota))
    }

    /// Create with a custom quota.
    pub fn with_quota(quota: Quota) -> Self {
        Self {
            limiter: Arc::new(RateLimiter::direct(quota)),
        }
    }
}

impl Default for GovernorPacer {
    /// One call per second, no burst.
    fn default() -> Self {
        Self::with_quota(Quota::per_second(nonzero_ext::nonzero!(1u32)))
    }
}

#[async_trait]
impl Pacer for GovernorPacer {
    async fn pause(&self) {
        self.limiter.until_ready().await;
    }
}

/// Never waits.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPacer;

#[async_trait]
impl Pacer for NoPacer {
    async fn pause(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn test_fixed_delay_follows_tokio_clock() {
        let pacer = FixedDelayPacer::new(Duration::from_secs(1));
        let start = tokio::time::Instant::now();

        pacer.pause().await;
        pacer.pause().await;

        assert!(start.elapsed() >= Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_governor_pacer_limits_rate() {
        let pacer = GovernorPacer::per_second(20).unwrap();
        let start = Instant::now();

        for _ in 0..3 {
            pacer.pause().await;
        }

        // First permit is immediate, the next two wait ~50ms each.
        assert!(start.elapsed() >= Duration::from_millis(80));
    }

    #[test]
    fn test_zero_rate_rejected() {
        assert!(GovernorPacer::per_second(0).is_err());
        assert!(GovernorPacer::every(Duration::ZERO).is_err());
    }

    #[tokio::test]
    async fn test_no_pacer_is_immediate() {
        let start = Instant::now();
        NoPacer.pause().await;
        assert!(start.elapsed() < Duration::from_millis(50));
    }
}
