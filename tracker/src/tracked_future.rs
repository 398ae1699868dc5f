//! Wraps a future so its completion is recorded against a shared counter,
//! the way `ingester::lifecycle` tracks persist jobs against a
//! [`metric::U64Counter`]-backed registry so a caller can wait for "all
//! outstanding work of this kind to drain" without polling.

use std::{
    pin::Pin,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    task::{Context, Poll},
};

use futures::Future;
use pin_project::pin_project;

/// Tracks the number of futures currently in flight for some logical group
/// (e.g. "UberJobs dispatched to worker w1", "merge commands queued").
#[derive(Debug, Default, Clone)]
pub struct TrackedFutureRegistry {
    inflight: Arc<AtomicUsize>,
}

impl TrackedFutureRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of futures currently being polled that were wrapped with
    /// [`TrackedFutureExt::track`] against this registry.
    pub fn inflight(&self) -> usize {
        self.inflight.load(Ordering::SeqCst)
    }
}

/// A future wrapped by [`TrackedFutureExt::track`].
#[pin_project(PinnedDrop)]
#[derive(Debug)]
pub struct TrackedFuture<F> {
    #[pin]
    inner: F,
    registry: TrackedFutureRegistry,
    counted: bool,
}

impl<F: Future> Future for TrackedFuture<F> {
    type Output = F::Output;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut this = self.project();
        if !*this.counted {
            this.registry.inflight.fetch_add(1, Ordering::SeqCst);
            *this.counted = true;
        }
        this.inner.poll(cx)
    }
}

#[pin_project::pinned_drop]
impl<F> PinnedDrop for TrackedFuture<F> {
    fn drop(self: Pin<&mut Self>) {
        if self.counted {
            self.registry.inflight.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

/// Extension trait for wrapping a future with inflight tracking.
pub trait TrackedFutureExt: Future + Sized {
    /// Track this future's lifetime (from first poll to drop) against
    /// `registry`.
    fn track(self, registry: TrackedFutureRegistry) -> TrackedFuture<Self> {
        TrackedFuture {
            inner: self,
            registry,
            counted: false,
        }
    }
}

impl<F: Future> TrackedFutureExt for F {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn inflight_counts_only_while_polled() {
        let registry = TrackedFutureRegistry::new();
        assert_eq!(registry.inflight(), 0);

        let fut = tokio::time::sleep(Duration::from_millis(10)).track(registry.clone());
        let handle = tokio::spawn(fut);

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert_eq!(registry.inflight(), 1);

        handle.await.unwrap();
        assert_eq!(registry.inflight(), 0);
    }

    #[tokio::test]
    async fn multiple_tracked_futures_accumulate() {
        let registry = TrackedFutureRegistry::new();
        let f1 = tokio::time::sleep(Duration::from_millis(20)).track(registry.clone());
        let f2 = tokio::time::sleep(Duration::from_millis(20)).track(registry.clone());
        let h1 = tokio::spawn(f1);
        let h2 = tokio::spawn(f2);

        tokio::time::sleep(Duration::from_millis(5)).await;
        assert_eq!(registry.inflight(), 2);

        h1.await.unwrap();
        h2.await.unwrap();
        assert_eq!(registry.inflight(), 0);
    }
}
