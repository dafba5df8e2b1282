//! Caller-side retry for interrupted syncs
//!
//! The engine never retries. The reconciliation controller, as a caller,
//! may repeat a sync that ended in [`SyncError::Partial`](crate::SyncError)
//! with exponential backoff. Fatal errors are returned immediately.

use std::future::Future;
use std::time::Duration;

use backoff::ExponentialBackoff;
use backoff::ExponentialBackoffBuilder;

use crate::{Error, Result};

/// Backoff settings for retrying partial syncs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub enabled: bool,
    pub initial_interval: Duration,
    pub max_elapsed: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::disabled()
    }
}

impl RetryPolicy {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            initial_interval: Duration::from_millis(250),
            max_elapsed: Duration::from_secs(10),
        }
    }

    pub fn exponential(initial_interval: Duration, max_elapsed: Duration) -> Self {
        Self {
            enabled: true,
            initial_interval,
            max_elapsed,
        }
    }

    fn backoff(&self) -> ExponentialBackoff {
        ExponentialBackoffBuilder::new()
            .with_initial_interval(self.initial_interval)
            .with_max_elapsed_time(Some(self.max_elapsed))
            .build()
    }

    /// Run `operation`, repeating it while it fails with a retryable error
    /// and the policy allows.
    pub async fn run<T, F, Fut>(&self, mut operation: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        if !self.enabled {
            return operation().await;
        }

        backoff::future::retry(self.backoff(), || {
            let attempt = operation();
            async move {
                attempt.await.map_err(|err: Error| {
                    if err.is_retryable() {
                        tracing::warn!(error = %err, "Retrying interrupted sync");
                        backoff::Error::transient(err)
                    } else {
                        backoff::Error::permanent(err)
                    }
                })
            }
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SyncError;
    use crate::remote::RemoteError;
    use crate::scope::Scope;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn partial() -> Error {
        SyncError::from_remote(Scope::Global, 0, 0, RemoteError::transient("busy")).into()
    }

    fn fast() -> RetryPolicy {
        RetryPolicy::exponential(Duration::from_millis(1), Duration::from_secs(5))
    }

    #[tokio::test]
    async fn disabled_policy_runs_once() {
        let calls = AtomicUsize::new(0);
        let counter = &calls;
        let result: Result<()> = RetryPolicy::disabled()
            .run(|| async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(partial())
            })
            .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retries_partial_until_success() {
        let calls = AtomicUsize::new(0);
        let counter = &calls;
        let result = fast()
            .run(|| async move {
                if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(partial())
                } else {
                    Ok(7)
                }
            })
            .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn does_not_retry_module_problems() {
        let calls = AtomicUsize::new(0);
        let counter = &calls;
        let result: Result<()> = fast()
            .run(|| async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(Error::NotLoaded {
                    name: "events".to_string(),
                })
            })
            .await;
        assert!(matches!(result, Err(Error::NotLoaded { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
