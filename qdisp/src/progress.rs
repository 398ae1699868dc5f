//! Periodic progress sampling: `{inflight, finished, bytes, rows}` pushed
//! to the metadata store every `secondsBetweenQMetaUpdates`.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct ProgressCounters {
    inflight: AtomicU64,
    finished: AtomicU64,
    bytes: AtomicU64,
    rows: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProgressSnapshot {
    pub inflight: u64,
    pub finished: u64,
    pub bytes: u64,
    pub rows: u64,
}

impl ProgressCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn job_started(&self) {
        self.inflight.fetch_add(1, Ordering::Relaxed);
    }

    pub fn job_finished(&self, bytes: u64, rows: u64) {
        self.inflight.fetch_sub(1, Ordering::Relaxed);
        self.finished.fetch_add(1, Ordering::Relaxed);
        self.bytes.fetch_add(bytes, Ordering::Relaxed);
        self.rows.fetch_add(rows, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            inflight: self.inflight.load(Ordering::Relaxed),
            finished: self.finished.load(Ordering::Relaxed),
            bytes: self.bytes.load(Ordering::Relaxed),
            rows: self.rows.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracks_inflight_and_finished_counts() {
        let counters = ProgressCounters::new();
        counters.job_started();
        counters.job_started();
        counters.job_finished(1024, 10);

        let snap = counters.snapshot();
        assert_eq!(snap.inflight, 1);
        assert_eq!(snap.finished, 1);
        assert_eq!(snap.bytes, 1024);
        assert_eq!(snap.rows, 10);
    }
}
