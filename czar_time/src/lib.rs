//! An injectable notion of "now", so that retry/timeout/progress logic in the
//! rest of the workspace can be driven deterministically from tests.
#![deny(rustdoc::broken_intra_doc_links, rustdoc::bare_urls, rust_2018_idioms)]
#![warn(
    missing_copy_implementations,
    missing_debug_implementations,
    clippy::explicit_iter_loop,
    clippy::use_self,
    clippy::clone_on_ref_ptr
)]

use std::{
    fmt::Debug,
    sync::Arc,
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use parking_lot::RwLock;

/// A point in time, represented as nanoseconds since the Unix epoch.
///
/// `Time` is `Copy` and totally ordered so it can be stored directly in
/// state machines (`Job`, `Request`, `UserQuery`, ...) without an `Arc`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Time(i128);

impl Time {
    /// Construct a `Time` from nanoseconds since the Unix epoch.
    pub const fn from_timestamp_nanos(nanos: i128) -> Self {
        Self(nanos)
    }

    /// Nanoseconds since the Unix epoch.
    pub const fn timestamp_nanos(&self) -> i128 {
        self.0
    }

    /// Milliseconds since the Unix epoch, as stored in `QInfo`/`QMessages`.
    pub const fn timestamp_millis(&self) -> i64 {
        (self.0 / 1_000_000) as i64
    }

    /// Duration elapsed between `self` and a later `other`. Returns
    /// `Duration::ZERO` if `other` is not after `self`.
    pub fn checked_duration_since(&self, other: Self) -> Duration {
        if other.0 <= self.0 {
            Duration::from_nanos(0)
        } else {
            Duration::from_nanos((other.0 - self.0) as u64)
        }
    }

    /// `self + d`.
    pub fn checked_add(&self, d: Duration) -> Option<Self> {
        (d.as_nanos() as i128).checked_add(self.0).map(Self)
    }
}

/// Anything that can report the current time and sleep for a duration.
///
/// Production code takes `Arc<dyn TimeProvider>`; tests substitute
/// [`MockProvider`] to make retry backoff, eviction timeouts, and
/// progress-sampling intervals deterministic.
pub trait TimeProvider: Debug + Send + Sync + 'static {
    /// Returns the current time.
    fn now(&self) -> Time;

    /// Sleeps until `now() + d`, or returns immediately for [`MockProvider`]
    /// (which has no wall-clock to wait on).
    fn sleep<'a>(&'a self, d: Duration) -> futures_sleep::BoxSleepFuture<'a>;
}

mod futures_sleep {
    use std::{future::Future, pin::Pin};

    pub type BoxSleepFuture<'a> = Pin<Box<dyn Future<Output = ()> + Send + 'a>>;
}

/// A [`TimeProvider`] that reads the system wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemProvider {}

impl SystemProvider {
    /// Create a new `SystemProvider`.
    pub fn new() -> Self {
        Self {}
    }
}

impl TimeProvider for SystemProvider {
    fn now(&self) -> Time {
        let d = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system clock is before the Unix epoch");
        Time::from_timestamp_nanos(d.as_nanos() as i128)
    }

    fn sleep<'a>(&'a self, d: Duration) -> futures_sleep::BoxSleepFuture<'a> {
        Box::pin(tokio::time::sleep(d))
    }
}

/// A [`TimeProvider`] with a time that only advances when told to.
#[derive(Debug)]
pub struct MockProvider {
    now: RwLock<Time>,
}

impl MockProvider {
    /// Create a mock provider starting at `start`.
    pub fn new(start: Time) -> Self {
        Self {
            now: RwLock::new(start),
        }
    }

    /// Set the current time, without regard to monotonicity.
    pub fn set(&self, time: Time) {
        *self.now.write() = time;
    }

    /// Advance the current time by `d`.
    pub fn inc(&self, d: Duration) -> Time {
        let mut now = self.now.write();
        *now = now.checked_add(d).expect("mock time overflow");
        *now
    }
}

impl TimeProvider for MockProvider {
    fn now(&self) -> Time {
        *self.now.read()
    }

    fn sleep<'a>(&'a self, _d: Duration) -> futures_sleep::BoxSleepFuture<'a> {
        // Deterministic tests never want to actually wait; callers that care
        // about ordering advance the mock explicitly via `inc`.
        Box::pin(async move {})
    }
}

/// Convenience alias used throughout the workspace for a shared time source.
pub type SharedTimeProvider = Arc<dyn TimeProvider>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_provider_advances_on_inc() {
        let t0 = Time::from_timestamp_nanos(0);
        let provider = MockProvider::new(t0);
        assert_eq!(provider.now(), t0);

        let t1 = provider.inc(Duration::from_secs(5));
        assert_eq!(provider.now(), t1);
        assert_eq!(t0.checked_duration_since(t1), Duration::from_secs(5));
    }

    #[test]
    fn duration_since_saturates_at_zero() {
        let earlier = Time::from_timestamp_nanos(100);
        let later = Time::from_timestamp_nanos(50);
        assert_eq!(earlier.checked_duration_since(later), Duration::from_nanos(0));
    }

    #[tokio::test]
    async fn system_provider_now_is_recent() {
        let provider = SystemProvider::new();
        let nanos = provider.now().timestamp_nanos();
        // Should be a plausible post-2020 timestamp in nanoseconds.
        assert!(nanos > 1_600_000_000_000_000_000);
    }
}
