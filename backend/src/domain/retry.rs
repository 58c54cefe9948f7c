//! Bounded exponential-backoff retries for fallible async operations.
//!
//! Every failure is treated as retryable. The last failure is returned
//! unchanged once attempts run out.

use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{info, warn};

/// Attempt budget and backoff bounds.
///
/// ## Invariants
/// - `max_attempts >= 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
    max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(1), Duration::from_secs(5))
    }
}

impl RetryPolicy {
    /// Build a policy; `max_attempts` is clamped to at least one.
    pub fn new(max_attempts: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            max_delay,
        }
    }

    /// Total attempts including the first call.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Wait after failed attempt `attempt` (1-based):
    /// `min(base_delay * 2^(attempt-1), max_delay)`.
    ///
    /// # Examples
    /// ```
    /// use std::time::Duration;
    /// use audio_proxy::domain::RetryPolicy;
    ///
    /// let policy = RetryPolicy::default();
    /// let delays: Vec<_> = (1..=4).map(|k| policy.delay_for(k).as_secs()).collect();
    /// assert_eq!(delays, [1, 2, 4, 5]);
    /// ```
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2_u32.saturating_pow(attempt.saturating_sub(1));
        self.base_delay
            .checked_mul(factor)
            .unwrap_or(Duration::MAX)
            .min(self.max_delay)
    }
}

/// Async sleeping abstraction so tests can observe backoff waits.
#[async_trait]
pub trait RetrySleeper: Send + Sync {
    /// Suspend for `duration`.
    async fn sleep(&self, duration: Duration);
}

/// Sleeper backed by the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl RetrySleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Runs operations under a [`RetryPolicy`].
#[derive(Clone)]
pub struct Retrier {
    policy: RetryPolicy,
    sleeper: Arc<dyn RetrySleeper>,
}

impl Retrier {
    /// Retrier that waits on the tokio timer.
    pub fn new(policy: RetryPolicy) -> Self {
        Self::with_sleeper(policy, Arc::new(TokioSleeper))
    }

    /// Retrier with an injected sleeper.
    pub fn with_sleeper(policy: RetryPolicy, sleeper: Arc<dyn RetrySleeper>) -> Self {
        Self { policy, sleeper }
    }

    /// Policy applied by this retrier.
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Call `operation` until it succeeds or the attempt budget is spent.
    ///
    /// `label` only names the operation in log lines.
    ///
    /// # Errors
    /// Returns the error of the final attempt, unchanged.
    pub async fn run<T, E, F, Fut>(&self, label: &str, mut operation: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        let max_attempts = self.policy.max_attempts();
        let mut attempt = 1;
        loop {
            let error = match operation().await {
                Ok(value) => return Ok(value),
                Err(error) => error,
            };
            warn!(
                operation = label,
                attempt,
                max_attempts,
                error = %error,
                "attempt failed"
            );
            if attempt >= max_attempts {
                return Err(error);
            }
            let delay = self.policy.delay_for(attempt);
            info!(
                operation = label,
                attempt,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                "waiting before retry"
            );
            self.sleeper.sleep(delay).await;
            attempt += 1;
        }
    }
}
