//! Bounded exponential backoff shared by the store gateways.
//!
//! Only errors that report themselves as transient are retried. Every other
//! failure is returned on the first attempt.

use std::future::Future;
use std::time::Duration;

/// Errors that can tell whether repeating the call may succeed.
pub trait Retryable {
    /// Returns whether the failure is transient.
    fn is_retryable(&self) -> bool;
}

/// Retry budget and backoff curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_retries: u32,
    initial_backoff: Duration,
    max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(2, Duration::from_millis(50), Duration::from_millis(1000))
    }
}

impl RetryPolicy {
    /// Creates a policy allowing `max_retries` attempts after the first.
    #[must_use]
    pub const fn new(max_retries: u32, initial_backoff: Duration, max_backoff: Duration) -> Self {
        Self {
            max_retries,
            initial_backoff,
            max_backoff,
        }
    }

    /// Returns a policy that never retries.
    #[must_use]
    pub const fn none() -> Self {
        Self::new(0, Duration::ZERO, Duration::ZERO)
    }

    /// Returns the retry budget.
    #[must_use]
    pub const fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Returns the delay before retry number `retry` (1-based).
    ///
    /// Returns `None` once the budget is spent.
    #[must_use]
    pub fn backoff_for(&self, retry: u32) -> Option<Duration> {
        if retry == 0 || retry > self.max_retries {
            return None;
        }
        let factor = 2_u32.saturating_pow(retry.saturating_sub(1));
        Some(
            self.initial_backoff
                .saturating_mul(factor)
                .min(self.max_backoff),
        )
    }

    /// Runs `operation`, retrying transient failures with backoff.
    ///
    /// # Errors
    ///
    /// Returns the last error when it is not retryable or the budget is
    /// spent.
    pub async fn run<T, E, F, Fut>(&self, operation_name: &str, mut operation: F) -> Result<T, E>
    where
        E: Retryable + std::fmt::Display,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let mut retry = 0_u32;
        loop {
            match operation().await {
                Ok(value) => {
                    if retry > 0 {
                        tracing::info!(
                            operation = operation_name,
                            retries = retry,
                            "store call recovered"
                        );
                    }
                    return Ok(value);
                }
                Err(err) if err.is_retryable() => {
                    retry = retry.saturating_add(1);
                    let Some(backoff) = self.backoff_for(retry) else {
                        tracing::warn!(
                            operation = operation_name,
                            retries = retry.saturating_sub(1),
                            error = %err,
                            "store call failed, retry budget spent"
                        );
                        return Err(err);
                    };
                    tracing::warn!(
                        operation = operation_name,
                        retry,
                        backoff_ms = u64::try_from(backoff.as_millis()).unwrap_or(u64::MAX),
                        error = %err,
                        "store call failed, retrying"
                    );
                    tokio::time::sleep(backoff).await;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for the retry policy.

    use super::{Retryable, RetryPolicy};
    use rstest::rstest;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;
    use thiserror::Error;

    #[derive(Debug, Error, PartialEq, Eq)]
    enum LookupError {
        #[error("transient")]
        Transient,
        #[error("permanent")]
        Permanent,
    }

    impl Retryable for LookupError {
        fn is_retryable(&self) -> bool {
            matches!(self, Self::Transient)
        }
    }

    fn fast_policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy::new(max_retries, Duration::from_millis(1), Duration::from_millis(2))
    }

    #[rstest]
    fn backoff_grows_exponentially_and_caps() {
        let policy = RetryPolicy::new(5, Duration::from_millis(50), Duration::from_millis(300));
        assert_eq!(policy.backoff_for(1), Some(Duration::from_millis(50)));
        assert_eq!(policy.backoff_for(2), Some(Duration::from_millis(100)));
        assert_eq!(policy.backoff_for(3), Some(Duration::from_millis(200)));
        assert_eq!(policy.backoff_for(4), Some(Duration::from_millis(300)));
        assert_eq!(policy.backoff_for(6), None);
        assert_eq!(policy.backoff_for(0), None);
    }

    #[rstest]
    #[tokio::test(flavor = "multi_thread")]
    async fn transient_failures_within_budget_are_invisible() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);
        let result = fast_policy(2)
            .run("lookup", || {
                let attempt = counter.fetch_add(1, Ordering::SeqCst);
                async move {
                    if attempt < 2 {
                        Err(LookupError::Transient)
                    } else {
                        Ok(attempt)
                    }
                }
            })
            .await;

        assert_eq!(result, Ok(2));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[rstest]
    #[tokio::test(flavor = "multi_thread")]
    async fn budget_exhaustion_surfaces_last_error() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);
        let result: Result<(), LookupError> = fast_policy(2)
            .run("lookup", || {
                counter.fetch_add(1, Ordering::SeqCst);
                async { Err(LookupError::Transient) }
            })
            .await;

        assert_eq!(result, Err(LookupError::Transient));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[rstest]
    #[tokio::test(flavor = "multi_thread")]
    async fn permanent_failures_are_not_retried() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);
        let result: Result<(), LookupError> = fast_policy(5)
            .run("lookup", || {
                counter.fetch_add(1, Ordering::SeqCst);
                async { Err(LookupError::Permanent) }
            })
            .await;

        assert_eq!(result, Err(LookupError::Permanent));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
