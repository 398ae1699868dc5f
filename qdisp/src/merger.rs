//! Single-writer result merge: accepts per-chunk result files tagged with
//! `(queryId, jobId, attemptNumber)`, discards late results from
//! superseded attempts, and enforces a cumulative `resultLimit`.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use hashbrown::HashMap;
use parking_lot::Mutex;
use qmeta_types::JobId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    Merged,
    /// A result arrived from an attempt older than one already merged (or
    /// in-flight) for the same job; at-most-once insertion already holds.
    DiscardedSuperseded,
    /// Accepted, but pushed `collected_bytes` past `result_limit`; the
    /// caller should trigger squash.
    ResultTooBig,
}

/// Tracks, per job, the highest attempt number merged so far, and the
/// cumulative bytes merged across the whole query.
#[derive(Debug)]
pub struct ResultMerger {
    result_limit: Option<u64>,
    collected_bytes: AtomicU64,
    collected_rows: AtomicU64,
    should_limit_result: AtomicBool,
    last_merged_attempt: Mutex<HashMap<JobId, u32>>,
}

impl ResultMerger {
    pub fn new(result_limit: Option<u64>) -> Self {
        Self {
            result_limit,
            collected_bytes: AtomicU64::new(0),
            collected_rows: AtomicU64::new(0),
            should_limit_result: AtomicBool::new(false),
            last_merged_attempt: Mutex::new(HashMap::new()),
        }
    }

    /// Merges one chunk's contribution. Single-writer per query: callers
    /// must serialize calls to this method themselves (e.g. via a
    /// dedicated merge task draining a channel), matching the "merger is
    /// single-writer" invariant this type assumes rather than enforces.
    pub fn accept(&self, job_id: JobId, attempt: u32, bytes: u64, rows: u64) -> MergeOutcome {
        {
            let mut last = self.last_merged_attempt.lock();
            let entry = last.entry(job_id).or_insert(attempt);
            if attempt < *entry {
                return MergeOutcome::DiscardedSuperseded;
            }
            *entry = attempt;
        }

        let total_bytes = self.collected_bytes.fetch_add(bytes, Ordering::Relaxed) + bytes;
        self.collected_rows.fetch_add(rows, Ordering::Relaxed);

        match self.result_limit {
            Some(limit) if total_bytes > limit => {
                self.should_limit_result.store(true, Ordering::Release);
                MergeOutcome::ResultTooBig
            }
            _ => MergeOutcome::Merged,
        }
    }

    pub fn should_limit_result(&self) -> bool {
        self.should_limit_result.load(Ordering::Acquire)
    }

    pub fn collected_bytes(&self) -> u64 {
        self.collected_bytes.load(Ordering::Relaxed)
    }

    pub fn collected_rows(&self) -> u64 {
        self.collected_rows.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discards_results_from_superseded_attempts() {
        let merger = ResultMerger::new(None);
        assert_eq!(merger.accept(JobId::new(1), 2, 100, 10), MergeOutcome::Merged);
        assert_eq!(
            merger.accept(JobId::new(1), 1, 100, 10),
            MergeOutcome::DiscardedSuperseded
        );
        assert_eq!(merger.collected_bytes(), 100);
    }

    #[test]
    fn exceeding_result_limit_flags_should_limit_result() {
        let merger = ResultMerger::new(Some(150));
        assert_eq!(merger.accept(JobId::new(1), 0, 100, 1), MergeOutcome::Merged);
        assert_eq!(
            merger.accept(JobId::new(2), 0, 100, 1),
            MergeOutcome::ResultTooBig
        );
        assert!(merger.should_limit_result());
    }

    #[test]
    fn later_attempt_for_same_job_replaces_the_watermark() {
        let merger = ResultMerger::new(None);
        assert_eq!(merger.accept(JobId::new(1), 0, 50, 5), MergeOutcome::Merged);
        assert_eq!(merger.accept(JobId::new(1), 1, 50, 5), MergeOutcome::Merged);
        assert_eq!(
            merger.accept(JobId::new(1), 0, 50, 5),
            MergeOutcome::DiscardedSuperseded
        );
    }
}
