//! Bounded retry with linearly increasing backoff.
//!
//! Fixed attempt count (3 by default). The delay before the second attempt
//! is one time unit and grows by two units after every failure, so the
//! default policy sleeps 1s then 3s before giving up.
//!
//! Only errors accepted by the caller's classifier are retried; anything else
//! ends the loop on first occurrence. The result keeps the two channels apart:
//! `retry` says whether retryable failures exhausted the attempts, `result`
//! carries the outcome the end caller should see.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use thiserror::Error;

use crate::error::MetricsError;

const DEFAULT_ATTEMPTS: u32 = 3;
const DEFAULT_UNIT: Duration = Duration::from_secs(1);

/// Every attempt failed with a retryable error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("gave up after {attempts} attempts")]
pub struct RetryExhausted {
    pub attempts: u32,
}

/// Two-part result of a retried operation.
#[derive(Debug)]
pub struct RetryOutcome<T, E> {
    /// Verdict of the retry loop itself.
    pub retry: Result<(), RetryExhausted>,
    /// Outcome of the last attempt.
    pub result: Result<T, E>,
}

impl<T, E> RetryOutcome<T, E> {
    pub fn is_exhausted(&self) -> bool {
        self.retry.is_err()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    attempts: u32,
    initial_delay: Duration,
    step: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::with_unit(DEFAULT_UNIT)
    }
}

impl RetryPolicy {
    /// Default shape (3 attempts, delays of 1 and 3 units) scaled to `unit`.
    pub fn with_unit(unit: Duration) -> Self {
        Self {
            attempts: DEFAULT_ATTEMPTS,
            initial_delay: unit,
            step: unit * 2,
        }
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Delay slept after failed attempt `n` (1-based).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.initial_delay + self.step * attempt.saturating_sub(1)
    }

    /// Run `op` until it succeeds, fails with a non-retryable error, or the
    /// attempts are used up.
    pub async fn run<T, E, F, Fut, R>(
        &self,
        operation: &str,
        mut op: F,
        retryable: R,
    ) -> RetryOutcome<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        R: Fn(&E) -> bool,
        E: Display,
    {
        let mut attempt = 1;
        loop {
            match op().await {
                Ok(v) => {
                    if attempt > 1 {
                        tracing::debug!(operation, attempt, "operation succeeded after retry");
                    }
                    return RetryOutcome { retry: Ok(()), result: Ok(v) };
                }
                Err(e) if retryable(&e) => {
                    tracing::warn!(operation, attempt, error = %e, "attempt failed");
                    if attempt >= self.attempts {
                        return RetryOutcome {
                            retry: Err(RetryExhausted { attempts: attempt }),
                            result: Err(e),
                        };
                    }
                    tokio::time::sleep(self.delay_after(attempt)).await;
                    attempt += 1;
                }
                Err(e) => {
                    tracing::warn!(operation, attempt, error = %e, "attempt failed, not retryable");
                    return RetryOutcome { retry: Ok(()), result: Err(e) };
                }
            }
        }
    }

    /// Store update path: only writer conflicts (`UniqueConstraintRace`,
    /// `WriteConflict`) are retried.
    pub async fn run_update<T, F, Fut>(
        &self,
        operation: &str,
        op: F,
    ) -> RetryOutcome<T, MetricsError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, MetricsError>>,
    {
        self.run(operation, op, MetricsError::is_retryable).await
    }
}
