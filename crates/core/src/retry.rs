//! Retry policies for failed transcription attempts.
//!
//! Policies answer two questions: does a job deserve another attempt, and
//! how long should it wait. They return plain data ([`RetryDecision`]); the
//! dispatcher is the only place that acts on it, which keeps policy
//! implementations trivially testable and swappable.

use std::time::Duration;

/// Default ceiling on transcription attempts for a single job.
pub const DEFAULT_MAX_RETRIES: i32 = 3;

/// Step between consecutive delays of the default linear policy.
pub const DEFAULT_BACKOFF_STEP: Duration = Duration::from_secs(60);

/// Outcome of consulting a [`RetryPolicy`] about a failed attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    /// Requeue the job and dispatch it again after `delay`.
    Retry { delay: Duration },
    /// Stop retrying; the job moves to Failed.
    GiveUp,
}

/// Decides whether and when a failed attempt is retried.
///
/// `retry_count` is the number of failures accumulated so far, including the
/// one being decided. The first failure is therefore decided with
/// `retry_count = 1`.
pub trait RetryPolicy: Send + Sync {
    /// Whether a job with `retry_count` failures gets another attempt.
    fn should_retry(&self, retry_count: i32, max_retries: i32) -> bool;

    /// Delay before the `retry_count`-th retry is dispatched.
    fn backoff(&self, retry_count: i32) -> Duration;

    /// Combine both answers into a single decision.
    fn decide(&self, retry_count: i32, max_retries: i32) -> RetryDecision {
        if self.should_retry(retry_count, max_retries) {
            RetryDecision::Retry {
                delay: self.backoff(retry_count),
            }
        } else {
            RetryDecision::GiveUp
        }
    }
}

/// Linear backoff: the n-th retry waits n times a fixed step.
///
/// With the default 60 second step, retries go out after 60s, 120s, 180s.
#[derive(Debug, Clone)]
pub struct LinearBackoff {
    step: Duration,
}

impl LinearBackoff {
    pub fn new(step: Duration) -> Self {
        Self { step }
    }
}

impl Default for LinearBackoff {
    fn default() -> Self {
        Self::new(DEFAULT_BACKOFF_STEP)
    }
}

impl RetryPolicy for LinearBackoff {
    fn should_retry(&self, retry_count: i32, max_retries: i32) -> bool {
        retry_count < max_retries
    }

    fn backoff(&self, retry_count: i32) -> Duration {
        self.step.saturating_mul(retry_count.max(0) as u32)
    }
}

/// Exponential backoff: the n-th retry waits `base * 2^(n-1)`, capped.
#[derive(Debug, Clone)]
pub struct ExponentialBackoff {
    base: Duration,
    cap: Duration,
}

impl ExponentialBackoff {
    pub fn new(base: Duration, cap: Duration) -> Self {
        Self { base, cap }
    }
}

impl Default for ExponentialBackoff {
    fn default() -> Self {
        Self::new(Duration::from_secs(60), Duration::from_secs(3600))
    }
}

impl RetryPolicy for ExponentialBackoff {
    fn should_retry(&self, retry_count: i32, max_retries: i32) -> bool {
        retry_count < max_retries
    }

    fn backoff(&self, retry_count: i32) -> Duration {
        // Shift capped at 31 to keep the multiplier in range; the cap below
        // dominates long before that.
        let exp = retry_count.saturating_sub(1).clamp(0, 31) as u32;
        let secs = self.base.as_secs().saturating_mul(1u64 << exp);
        Duration::from_secs(secs.min(self.cap.as_secs()))
    }
}
