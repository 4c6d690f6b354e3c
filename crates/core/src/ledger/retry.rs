//! Retry policy for transient store conflicts.
//!
//! Delays grow exponentially from `initial_backoff`, are capped at
//! `max_backoff`, and optionally get up to 50% random jitter so that transfers
//! that collided once do not collide again in lockstep. All arithmetic is
//! integral.

use std::time::Duration;

use rand::Rng;
use simplebank_shared::TransferConfig;

/// Bounded retry-with-backoff policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempt budget, first attempt included. Never below 1.
    pub max_attempts: u32,
    /// Delay after the first failed attempt.
    pub initial_backoff: Duration,
    /// Cap on any single delay, jitter included.
    pub max_backoff: Duration,
    /// Whether to add random jitter.
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&TransferConfig::default())
    }
}

impl RetryPolicy {
    /// Creates a policy with the given budget and backoff bounds.
    #[must_use]
    pub fn new(max_attempts: u32, initial_backoff: Duration, max_backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_backoff,
            max_backoff: max_backoff.max(initial_backoff),
            jitter: true,
        }
    }

    /// Builds the policy from transfer configuration.
    #[must_use]
    pub fn from_config(config: &TransferConfig) -> Self {
        Self::new(
            config.max_attempts,
            Duration::from_millis(config.initial_backoff_ms),
            Duration::from_millis(config.max_backoff_ms),
        )
        .with_jitter(config.jitter)
    }

    /// A single attempt, no retries.
    #[must_use]
    pub fn no_retry() -> Self {
        Self::new(1, Duration::ZERO, Duration::ZERO).with_jitter(false)
    }

    /// Enables or disables jitter.
    #[must_use]
    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    /// Exponential delay after attempt `attempt` (1-based), without jitter.
    #[must_use]
    pub fn base_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        self.initial_backoff
            .saturating_mul(1u32 << exponent)
            .min(self.max_backoff)
    }

    /// Delay to sleep after attempt `attempt` (1-based) before the next one.
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let base = self.base_delay(attempt);
        if !self.jitter {
            return base;
        }

        let base_ms = u64::try_from(base.as_millis()).unwrap_or(u64::MAX);
        let spread = base_ms / 2;
        if spread == 0 {
            return base;
        }
        let extra = rand::rng().random_range(0..=spread);
        base.saturating_add(Duration::from_millis(extra))
            .min(self.max_backoff)
    }
}
