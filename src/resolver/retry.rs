//! Bounded retry with exponential backoff
//!
//! | Attempt | Wait before next attempt (defaults) |
//! |---------|-------------------------------------|
//! | 1 | 0.5s |
//! | 2 | 1.0s |
//! | 3 | 2.0s |
//! | 4 | 4.0s |
//! | 5 | none, the last error is returned |
//!
//! Only transient errors are retried; anything else is returned at once.

use crate::config::RetryConfig;
use crate::resolver::LookupError;
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Result of running an operation under a `RetryPolicy`
#[derive(Debug)]
pub struct Attempted<T> {
    pub result: Result<T, LookupError>,

    /// How many times the operation was invoked
    pub attempts: u32,
}

/// Retry strategy applied uniformly to both resolver variants
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    initial_backoff: Duration,
    max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

impl RetryPolicy {
    /// Creates a policy; `max_attempts` is clamped to at least one
    pub fn new(max_attempts: u32, initial_backoff: Duration, max_backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_backoff,
            max_backoff,
        }
    }

    pub fn from_config(config: &RetryConfig) -> Self {
        Self::new(
            config.max_attempts,
            Duration::from_millis(config.initial_backoff_ms),
            Duration::from_millis(config.max_backoff_ms),
        )
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Wait applied after failed attempt number `attempt` (1-based)
    ///
    /// Doubles from the initial backoff and saturates at the cap.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        self.initial_backoff
            .saturating_mul(1u32 << exponent)
            .min(self.max_backoff)
    }

    /// Runs `operation` until it succeeds, fails permanently, or the attempt
    /// cap is reached
    ///
    /// Attempts are strictly sequential. Cancelling `cancel` interrupts a
    /// backoff sleep and ends the sequence with `LookupError::Cancelled`; an
    /// attempt already in flight is allowed to finish.
    pub async fn execute<T, F, Fut>(
        &self,
        cancel: &CancellationToken,
        mut operation: F,
    ) -> Attempted<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, LookupError>>,
    {
        let mut attempts = 0;

        loop {
            if cancel.is_cancelled() {
                return Attempted {
                    result: Err(LookupError::Cancelled),
                    attempts,
                };
            }

            attempts += 1;
            let error = match operation().await {
                Ok(value) => {
                    return Attempted {
                        result: Ok(value),
                        attempts,
                    }
                }
                Err(e) => e,
            };

            if !error.is_transient() || attempts >= self.max_attempts {
                return Attempted {
                    result: Err(error),
                    attempts,
                };
            }

            let wait = self.backoff(attempts);
            tracing::debug!(
                "Attempt {}/{} failed ({}), retrying in {:?}",
                attempts,
                self.max_attempts,
                error,
                wait
            );

            tokio::select! {
                _ = cancel.cancelled() => {
                    return Attempted {
                        result: Err(LookupError::Cancelled),
                        attempts,
                    };
                }
                _ = tokio::time::sleep(wait) => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use tokio::time::Instant;

    fn transient() -> LookupError {
        LookupError::Status {
            stage: "/transactions",
            status: 503,
        }
    }

    #[test]
    fn test_backoff_schedule_doubles_and_caps() {
        let policy = RetryPolicy::default();
        let waits: Vec<f64> = (1..=6).map(|n| policy.backoff(n).as_secs_f64()).collect();
        assert_eq!(waits, vec![0.5, 1.0, 2.0, 4.0, 5.0, 5.0]);
    }

    #[test]
    fn test_backoff_never_overflows() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff(u32::MAX), Duration::from_secs(5));
    }

    #[test]
    fn test_zero_attempts_clamped() {
        let policy = RetryPolicy::new(0, Duration::ZERO, Duration::ZERO);
        assert_eq!(policy.max_attempts(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_succeeds_after_k_transient_failures() {
        let policy = RetryPolicy::default();
        let cancel = CancellationToken::new();

        for k in 0..5u32 {
            let calls = Arc::new(AtomicU32::new(0));
            let counter = calls.clone();

            let attempted = policy
                .execute(&cancel, || {
                    let n = counter.fetch_add(1, Ordering::SeqCst);
                    async move {
                        if n < k {
                            Err(transient())
                        } else {
                            Ok("resolved")
                        }
                    }
                })
                .await;

            assert_eq!(attempted.result, Ok("resolved"));
            assert_eq!(attempted.attempts, k + 1);
            assert_eq!(calls.load(Ordering::SeqCst), k + 1);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_always_transient_gives_up_after_five() {
        let policy = RetryPolicy::default();
        let cancel = CancellationToken::new();
        let calls = AtomicU32::new(0);
        let started = Instant::now();

        let attempted: Attempted<()> = policy
            .execute(&cancel, || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(transient()) }
            })
            .await;

        assert_eq!(attempted.result, Err(transient()));
        assert_eq!(attempted.attempts, 5);
        assert_eq!(calls.load(Ordering::SeqCst), 5);
        // 0.5 + 1 + 2 + 4 between five attempts, none before the first
        assert_eq!(started.elapsed(), Duration::from_millis(7_500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_permanent_error_not_retried() {
        let policy = RetryPolicy::default();
        let cancel = CancellationToken::new();
        let calls = AtomicU32::new(0);

        let attempted: Attempted<()> = policy
            .execute(&cancel, || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(LookupError::InvalidIdentifier("bad".to_string())) }
            })
            .await;

        assert_eq!(attempted.attempts, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(
            attempted.result,
            Err(LookupError::InvalidIdentifier(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_interrupts_backoff() {
        let policy = RetryPolicy::default();
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        let calls = AtomicU32::new(0);

        let attempted: Attempted<()> = policy
            .execute(&cancel, || {
                calls.fetch_add(1, Ordering::SeqCst);
                trigger.cancel();
                async { Err(transient()) }
            })
            .await;

        assert_eq!(attempted.result, Err(LookupError::Cancelled));
        assert_eq!(attempted.attempts, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cancelled_before_start_makes_no_attempt() {
        let policy = RetryPolicy::default();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let attempted: Attempted<()> = policy.execute(&cancel, || async { Ok(()) }).await;

        assert_eq!(attempted.result, Err(LookupError::Cancelled));
        assert_eq!(attempted.attempts, 0);
    }
}
