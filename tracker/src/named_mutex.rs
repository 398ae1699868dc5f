//! A registry of `tokio::sync::Mutex`es keyed by an arbitrary string name,
//! so unrelated call sites can serialize on the same logical resource (e.g.
//! `"database:<db>"`) without knowing about each other ahead of time.
//!
//! This is the primitive `trans::Registry` uses to guarantee at most one
//! `IS_STARTING` super-transaction per database at a time.

use std::sync::Arc;

use hashbrown::HashMap;
use parking_lot::Mutex as SyncMutex;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// A registry of named async mutexes.
///
/// Entries are created lazily on first acquisition and never removed, so the
/// map grows with the number of distinct names ever locked (bounded in
/// practice by the number of databases). This mirrors the long-lived,
/// coarse-grained locks the teacher's `tracker` crate manages for query
/// tracking.
#[derive(Debug, Default)]
pub struct NamedMutexRegistry {
    mutexes: SyncMutex<HashMap<String, Arc<Mutex<()>>>>,
}

/// An acquired named lock; the name stays locked until this guard drops.
#[derive(Debug)]
pub struct NamedMutexGuard {
    name: String,
    _guard: OwnedMutexGuard<()>,
}

impl NamedMutexGuard {
    /// The name that was locked.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl NamedMutexRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    fn entry(&self, name: &str) -> Arc<Mutex<()>> {
        let mut mutexes = self.mutexes.lock();
        Arc::clone(
            mutexes
                .entry(name.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(()))),
        )
    }

    /// Acquire the named lock, waiting if another caller already holds it.
    pub async fn lock(&self, name: &str) -> NamedMutexGuard {
        let mutex = self.entry(name);
        let guard = mutex.lock_owned().await;
        NamedMutexGuard {
            name: name.to_string(),
            _guard: guard,
        }
    }

    /// Try to acquire the named lock without waiting.
    pub fn try_lock(&self, name: &str) -> Option<NamedMutexGuard> {
        let mutex = self.entry(name);
        let guard = mutex.try_lock_owned().ok()?;
        Some(NamedMutexGuard {
            name: name.to_string(),
            _guard: guard,
        })
    }

    /// Number of distinct names ever locked through this registry.
    pub fn known_names(&self) -> usize {
        self.mutexes.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn same_name_serializes_callers() {
        let registry = Arc::new(NamedMutexRegistry::new());
        let order = Arc::new(SyncMutex::new(Vec::new()));

        let r1 = Arc::clone(&registry);
        let o1 = Arc::clone(&order);
        let h1 = tokio::spawn(async move {
            let _g = r1.lock("database:LSST").await;
            tokio::time::sleep(Duration::from_millis(20)).await;
            o1.lock().push(1);
        });

        tokio::time::sleep(Duration::from_millis(5)).await;
        let r2 = Arc::clone(&registry);
        let o2 = Arc::clone(&order);
        let h2 = tokio::spawn(async move {
            let _g = r2.lock("database:LSST").await;
            o2.lock().push(2);
        });

        h1.await.unwrap();
        h2.await.unwrap();
        assert_eq!(*order.lock(), vec![1, 2]);
    }

    #[tokio::test]
    async fn distinct_names_do_not_contend() {
        let registry = NamedMutexRegistry::new();
        let g1 = registry.lock("database:LSST").await;
        let g2 = registry.try_lock("database:SDSS");
        assert!(g2.is_some());
        drop(g1);
        assert_eq!(registry.known_names(), 2);
    }

    #[tokio::test]
    async fn try_lock_fails_while_held() {
        let registry = NamedMutexRegistry::new();
        let _g1 = registry.lock("database:LSST").await;
        assert!(registry.try_lock("database:LSST").is_none());
    }
}
