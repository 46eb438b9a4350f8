//! Retry budget, backoff schedule and the timing seams used by the dispatcher.
//!
//! Sleeping and jitter are injected through [`Sleeper`] and [`JitterSource`]
//! so the dispatcher loop can be driven deterministically in tests.

use std::num::NonZeroU32;
use std::time::Duration;

use async_trait::async_trait;

/// Retry configuration for a single dispatch. Never mutated at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: NonZeroU32,
    pub base_delay: Duration,
    pub max_jitter: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: NonZeroU32, base_delay: Duration, max_jitter: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
            max_jitter,
        }
    }

    /// A policy that performs exactly one attempt.
    pub fn single_attempt() -> Self {
        Self::new(NonZeroU32::MIN, Duration::ZERO, Duration::ZERO)
    }

    pub fn attempts(&self) -> u32 {
        self.max_attempts.get()
    }

    pub fn is_final_attempt(&self, attempt: u32) -> bool {
        attempt + 1 >= self.attempts()
    }

    /// Deterministic part of the delay before retrying after `attempt`:
    /// `2^attempt * base_delay`, saturating instead of overflowing.
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let factor = 2u32.checked_pow(attempt).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }

    /// Full delay including a jitter drawn from `jitter`.
    pub fn delay_for(&self, attempt: u32, jitter: &dyn JitterSource) -> Duration {
        let extra = jitter.jitter(self.max_jitter).min(self.max_jitter);
        self.backoff_delay(attempt).saturating_add(extra)
    }
}

#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Suspends on the tokio timer.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        if !duration.is_zero() {
            tokio::time::sleep(duration).await;
        }
    }
}

pub trait JitterSource: Send + Sync {
    /// Returns a duration in `[0, max]`.
    fn jitter(&self, max: Duration) -> Duration;
}

/// Uniform jitter backed by the operating system RNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomJitter;

impl JitterSource for RandomJitter {
    fn jitter(&self, max: Duration) -> Duration {
        let max_ms = u64::try_from(max.as_millis()).unwrap_or(u64::MAX);
        if max_ms == 0 {
            return Duration::ZERO;
        }
        let mut bytes = [0u8; 8];
        if let Err(err) = getrandom::fill(&mut bytes) {
            tracing::debug!(error = %err, "OS randomness unavailable, skipping jitter");
            return Duration::ZERO;
        }
        Duration::from_millis(u64::from_le_bytes(bytes) % max_ms.saturating_add(1))
    }
}

/// Jitter that is always zero.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoJitter;

impl JitterSource for NoJitter {
    fn jitter(&self, _max: Duration) -> Duration {
        Duration::ZERO
    }
}
