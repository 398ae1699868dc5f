//! An `async-trait` extension so tests can bound how long they wait on a
//! future, turning a hang into a clear test failure instead of a CI timeout.

use std::{future::Future, time::Duration};

use async_trait::async_trait;

/// Default bound applied by [`FutureTimeout::with_timeout`] helpers that
/// don't specify their own duration.
pub const DEFAULT_FUTURE_TIMEOUT: Duration = Duration::from_secs(10);

/// Extension trait bounding how long a test will wait on a future.
#[async_trait]
pub trait FutureTimeout: Future + Sized + Send {
    /// Await `self`, panicking with `msg` if it does not resolve within `d`.
    async fn with_timeout(self, d: Duration, msg: &str) -> Self::Output
    where
        Self::Output: Send,
    {
        match tokio::time::timeout(d, self).await {
            Ok(v) => v,
            Err(_) => panic!("future did not complete within {:?}: {}", d, msg),
        }
    }

    /// Like [`Self::with_timeout`] using [`DEFAULT_FUTURE_TIMEOUT`].
    async fn with_default_timeout(self, msg: &str) -> Self::Output
    where
        Self::Output: Send,
    {
        self.with_timeout(DEFAULT_FUTURE_TIMEOUT, msg).await
    }
}

impl<F: Future + Send> FutureTimeout for F {}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn completes_within_bound() {
        let value = async { 42 }.with_timeout(Duration::from_millis(50), "trivial").await;
        assert_eq!(value, 42);
    }

    #[tokio::test]
    #[should_panic(expected = "did not complete")]
    async fn panics_when_exceeded() {
        tokio::time::sleep(Duration::from_millis(50))
            .with_timeout(Duration::from_millis(5), "slow")
            .await;
    }
}
