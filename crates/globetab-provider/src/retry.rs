//! Fixed-pause bounded retry.
//!
//! The substitution engine waits out transient control-plane failures
//! (typically a table that has not finished creating in another region)
//! with a flat inter-attempt pause — no exponential growth, no jitter.
//! The pause suspends only the calling task.

use std::future::Future;

use tracing::{error, info};

use globetab_config::RetryPolicy;

use crate::error::ProviderResult;

/// Run `op` up to `1 + policy.retries` times, pausing `policy.pause`
/// between attempts. Terminal errors short-circuit immediately; on budget
/// exhaustion the last error is returned.
pub async fn with_retry<T, F, Fut>(policy: RetryPolicy, mut op: F) -> ProviderResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ProviderResult<T>>,
{
    let mut attempt: u32 = 1;
    let mut remaining = policy.retries;

    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_retryable() && remaining > 0 => {
                info!(
                    attempt,
                    pause_millis = policy.pause.as_millis() as u64,
                    error = %err,
                    "backoff attempt"
                );
                remaining -= 1;
                attempt += 1;
                tokio::time::sleep(policy.pause).await;
            }
            Err(err) => {
                if err.is_retryable() {
                    error!(
                        retries = policy.retries,
                        attempts = attempt,
                        error = %err,
                        "retry budget exhausted"
                    );
                }
                return Err(err);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderError;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    fn fast(retries: u32) -> RetryPolicy {
        RetryPolicy {
            retries,
            pause: Duration::from_millis(1),
        }
    }

    #[tokio::test]
    async fn success_on_first_attempt_makes_one_call() {
        let calls = AtomicU32::new(0);
        let result = with_retry(fast(5), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok::<_, ProviderError>(42) }
        })
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn exhausted_budget_makes_initial_plus_retries_attempts() {
        let calls = AtomicU32::new(0);
        let result: ProviderResult<()> = with_retry(fast(2), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(ProviderError::Transient("still failing".into())) }
        })
        .await;
        assert!(matches!(result, Err(ProviderError::Transient(_))));
        // 1 initial + 2 retries.
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn recovers_midway_through_budget() {
        let calls = AtomicU32::new(0);
        let result = with_retry(fast(5), || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(ProviderError::NotFound("orders-prod".into()))
                } else {
                    Ok("arn")
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), "arn");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn terminal_error_short_circuits() {
        let calls = AtomicU32::new(0);
        let result: ProviderResult<()> = with_retry(fast(5), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(ProviderError::AccessDenied("not authorized".into())) }
        })
        .await;
        assert!(matches!(result, Err(ProviderError::AccessDenied(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
