use rand::{RngExt, rng};
use std::time::Duration;

use crate::ClientError;

/// Errors that know whether another attempt could succeed.
pub trait Retryable {
    fn is_transient(&self) -> bool;

    /// Lower bound on the wait before the next attempt.
    fn min_delay(&self) -> Option<Duration> {
        None
    }
}

impl Retryable for ClientError {
    fn is_transient(&self) -> bool {
        ClientError::is_transient(self)
    }

    fn min_delay(&self) -> Option<Duration> {
        self.retry_after()
    }
}

/// A simple retry policy with exponential backoff and jitter.
#[derive(Clone, Debug)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            base_delay: Duration::ZERO,
        }
    }

    /// Run `f` until it succeeds, fails permanently, or retries run out.
    pub async fn retry_async<F, Fut, T, E>(&self, mut f: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T, E>>,
        E: Retryable + std::fmt::Display,
    {
        let mut attempt = 0u32;
        loop {
            match f().await {
                Ok(v) => return Ok(v),
                Err(e) => {
                    attempt += 1;
                    if !e.is_transient() || attempt > self.max_retries {
                        return Err(e);
                    }
                    let delay = self.backoff(attempt).max(e.min_delay().unwrap_or_default());
                    tracing::warn!(
                        "transient failure (attempt {}/{}), retrying in {:?}: {}",
                        attempt,
                        self.max_retries,
                        delay,
                        e
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    // exponential backoff with jitter
    fn backoff(&self, attempt: u32) -> Duration {
        let max_delay = self.base_delay * (1u32 << attempt.min(16));
        let max_ms = max_delay.as_millis() as u64;
        if max_ms == 0 {
            return Duration::ZERO;
        }
        let mut rng = rng();
        Duration::from_millis(rng.random_range(0..max_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Debug)]
    struct Flaky(bool);

    impl std::fmt::Display for Flaky {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "flaky(transient={})", self.0)
        }
    }

    impl Retryable for Flaky {
        fn is_transient(&self) -> bool {
            self.0
        }
    }

    fn fast() -> RetryPolicy {
        RetryPolicy {
            max_retries: 3,
            base_delay: Duration::from_millis(1),
        }
    }

    #[tokio::test]
    async fn retry_succeeds_after_retries() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = calls.clone();
        let result = fast()
            .retry_async(move || {
                let c = c.clone();
                async move {
                    let prev = c.fetch_add(1, Ordering::SeqCst) + 1;
                    if prev < 3 { Err(Flaky(true)) } else { Ok(42) }
                }
            })
            .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn permanent_errors_are_not_retried() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = calls.clone();
        let result: Result<(), Flaky> = fast()
            .retry_async(move || {
                let c = c.clone();
                async move {
                    c.fetch_add(1, Ordering::SeqCst);
                    Err(Flaky(false))
                }
            })
            .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn gives_up_after_max_retries() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = calls.clone();
        let result: Result<(), Flaky> = fast()
            .retry_async(move || {
                let c = c.clone();
                async move {
                    c.fetch_add(1, Ordering::SeqCst);
                    Err(Flaky(true))
                }
            })
            .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }
}
