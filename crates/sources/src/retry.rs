//! Bounded retry with exponential backoff for external fetches.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use kurort_core::SourceError;

/// Retry policy for source calls. Only transport errors are retried;
/// missing pages and malformed payloads fail immediately.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    max_attempts: u32,
    initial_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_attempts: 3, initial_backoff: Duration::from_millis(500) }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, initial_backoff: Duration) -> Self {
        Self { max_attempts: max_attempts.max(1), initial_backoff }
    }

    /// Run `operation` until it succeeds, fails permanently, or the
    /// attempt budget runs out. Backoff doubles between attempts.
    pub async fn run<T, F, Fut>(&self, label: &str, mut operation: F) -> Result<T, SourceError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, SourceError>>,
    {
        let mut backoff = self.initial_backoff;

        for attempt in 1..=self.max_attempts {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retriable() && attempt < self.max_attempts => {
                    warn!(
                        label,
                        attempt,
                        max_attempts = self.max_attempts,
                        delay_ms = backoff.as_millis() as u64,
                        error = %e,
                        "fetch failed, retrying"
                    );
                    tokio::time::sleep(backoff).await;
                    backoff *= 2;
                }
                Err(e) => return Err(e),
            }
        }

        unreachable!("retry loop always returns")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn fast_policy() -> RetryPolicy {
        RetryPolicy::new(3, Duration::from_millis(1))
    }

    #[tokio::test]
    async fn success_needs_no_retry() {
        let calls = AtomicUsize::new(0);
        let result = fast_policy()
            .run("test", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Ok::<_, SourceError>(42) }
            })
            .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn transient_failure_is_retried() {
        let calls = AtomicUsize::new(0);
        let result = fast_policy()
            .run("test", || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n < 2 {
                        Err(SourceError::Network("flaky".into()))
                    } else {
                        Ok("ok")
                    }
                }
            })
            .await;
        assert_eq!(result.unwrap(), "ok");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn permanent_failure_is_not_retried() {
        let calls = AtomicUsize::new(0);
        let result: Result<(), _> = fast_policy()
            .run("test", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(SourceError::NotFound("Атлантида".into())) }
            })
            .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn attempt_budget_is_bounded() {
        let calls = AtomicUsize::new(0);
        let result: Result<(), _> = fast_policy()
            .run("test", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(SourceError::Network("down".into())) }
            })
            .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
