//! Retry logic for idempotent reads.
//!
//! Only reads are retried. Writes are never re-submitted automatically:
//! a second submission would be a second transaction.

use std::future::Future;
use tokio::time::sleep;

use crate::resilience::backoff::RetryPolicy;

/// Run `op` until it succeeds, `retryable` rejects the error, or the
/// budget is spent. Returns the last error on failure.
pub async fn retry_with_backoff<T, E, F, Fut>(
    policy: &RetryPolicy,
    retryable: impl Fn(&E) -> bool,
    mut op: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let mut attempt = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < policy.max_retries && retryable(&e) => {
                attempt += 1;
                let delay = policy.delay(attempt);
                tracing::debug!(attempt, delay_ms = delay.as_millis() as u64, error = %e, "Retrying read");
                sleep(delay).await;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            base_ms: 1,
            max_ms: 5,
        }
    }

    #[tokio::test]
    async fn test_succeeds_after_transient_failures() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result: Result<u32, String> = retry_with_backoff(&policy(3), |_| true, move || async move {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            if n < 2 { Err("flaky".to_string()) } else { Ok(n) }
        })
        .await;

        assert_eq!(result, Ok(2));
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_budget_exhausted() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result: Result<(), String> = retry_with_backoff(&policy(2), |_| true, move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err("down".to_string())
        })
        .await;

        assert_eq!(result, Err("down".to_string()));
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_non_retryable_error_stops() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result: Result<(), String> = retry_with_backoff(&policy(5), |e: &String| e != "fatal", move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err("fatal".to_string())
        })
        .await;

        assert!(result.is_err());
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
}
