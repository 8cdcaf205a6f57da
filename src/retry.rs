//! Exponential backoff retry for platform calls.
//!
//! Every platform effect goes through `retry_with_backoff`, so the three
//! workers share one policy:
//!
//! - Default: 3 retries with 5s, 10s, 20s delays
//! - A rate-limit hint from the platform raises the delay (up to `max_hint`)
//!
//! Only transient errors are retried. Not-found and permanent errors are
//! returned immediately.
//!
//! The same delay schedule drives worker restarts in the supervisor.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::effects::{PlatformError, PlatformErrorKind};

/// Configuration for exponential backoff.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryConfig {
    /// Retries after the initial attempt.
    pub max_retries: u32,

    pub initial_delay: Duration,

    /// Cap for the exponential schedule.
    pub max_delay: Duration,

    pub backoff_multiplier: f64,

    /// Upper bound on a platform-supplied "try again in" hint.
    pub max_hint: Duration,
}

impl RetryConfig {
    /// Platform calls: 3 retries at 5s, 10s, 20s.
    pub const DEFAULT: Self = Self {
        max_retries: 3,
        initial_delay: Duration::from_secs(5),
        max_delay: Duration::from_secs(60),
        backoff_multiplier: 2.0,
        max_hint: Duration::from_secs(600),
    };

    /// Worker restarts: 1s doubling up to 5 minutes, unbounded attempts.
    pub const RESTART: Self = Self {
        max_retries: u32::MAX,
        initial_delay: Duration::from_secs(1),
        max_delay: Duration::from_secs(300),
        backoff_multiplier: 2.0,
        max_hint: Duration::ZERO,
    };

    pub fn new(
        max_retries: u32,
        initial_delay: Duration,
        max_delay: Duration,
        backoff_multiplier: f64,
    ) -> Self {
        Self {
            max_retries,
            initial_delay,
            max_delay,
            backoff_multiplier,
            max_hint: max_delay,
        }
    }

    /// Delay before retry number `attempt` (0-indexed).
    ///
    /// `initial_delay * backoff_multiplier^attempt`, capped at `max_delay`.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = attempt.min(i32::MAX as u32) as i32;
        let delay_secs = self.initial_delay.as_secs_f64() * self.backoff_multiplier.powi(exponent);
        Duration::from_secs_f64(delay_secs.min(self.max_delay.as_secs_f64()))
    }

    /// Delay before retry `attempt`, raised to the platform's hint if it asked for longer.
    pub fn delay_with_hint(&self, attempt: u32, hint: Option<Duration>) -> Duration {
        let scheduled = self.delay_for_attempt(attempt);
        match hint {
            Some(hint) => scheduled.max(hint.min(self.max_hint)),
            None => scheduled,
        }
    }

    pub fn delays(&self) -> impl Iterator<Item = Duration> + '_ {
        (0..self.max_retries).map(|attempt| self.delay_for_attempt(attempt))
    }

    pub fn total_max_wait(&self) -> Duration {
        self.delays().sum()
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Whether to retry transient errors at all.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RetryPolicy {
    #[default]
    RetryTransient,
    NoRetry,
}

/// Outcome of a retried operation.
#[derive(Debug)]
pub enum RetryResult<T> {
    Success(T),

    /// Still failing transiently after the last attempt.
    ExhaustedRetries {
        last_error: PlatformError,
        attempts: u32,
    },

    /// A non-retriable error (not found or permanent).
    Failed(PlatformError),
}

impl<T> RetryResult<T> {
    pub fn into_result(self) -> Result<T, PlatformError> {
        match self {
            RetryResult::Success(v) => Ok(v),
            RetryResult::ExhaustedRetries { last_error, .. } => Err(last_error),
            RetryResult::Failed(e) => Err(e),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, RetryResult::Success(_))
    }
}

/// Runs `operation` until it succeeds, fails non-transiently, or runs out of retries.
pub async fn retry_with_backoff<T, F, Fut>(
    config: RetryConfig,
    policy: RetryPolicy,
    mut operation: F,
) -> RetryResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, PlatformError>>,
{
    let max_attempts = match policy {
        RetryPolicy::NoRetry => 1,
        RetryPolicy::RetryTransient => config.max_retries.saturating_add(1),
    };
    let mut attempt = 0;

    loop {
        let error = match operation().await {
            Ok(value) => return RetryResult::Success(value),
            Err(e) => e,
        };
        attempt += 1;

        match error.kind {
            PlatformErrorKind::NotFound | PlatformErrorKind::Permanent => {
                return RetryResult::Failed(error);
            }
            PlatformErrorKind::Transient => {
                if attempt >= max_attempts {
                    return RetryResult::ExhaustedRetries {
                        last_error: error,
                        attempts: attempt,
                    };
                }
                let delay = config.delay_with_hint(attempt - 1, error.retry_after);
                warn!(
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %error,
                    "Transient platform error, retrying"
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}
