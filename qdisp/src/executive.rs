//! The per-query chunk dispatcher: tracks Jobs and the UberJobs they are
//! packed into, assigns work deterministically via a [`ChunkLocator`],
//! retries on worker loss, and squashes the active set on cancellation or
//! LIMIT completion.

use std::{
    sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering},
    time::Duration,
};

use hashbrown::HashMap;
use observability_deps::tracing::{info, warn};
use parking_lot::Mutex;
use qmeta_types::{ChunkId, Job, JobId, JobState, QueryId, UberJob, UberJobId, WorkerName};

use crate::locator::ChunkLocator;

#[derive(Debug, Clone)]
pub struct ExecutiveConfig {
    /// `uberJobMaxChunks`: how many Jobs may share one UberJob.
    pub uber_job_max_chunks: usize,
    pub max_attempts: u32,
    pub attempt_sleep: Duration,
    /// `LIMIT n` with no `GROUP BY`/`ORDER BY`, if present.
    pub row_limit: Option<u64>,
}

impl Default for ExecutiveConfig {
    fn default() -> Self {
        Self {
            uber_job_max_chunks: 1000,
            max_attempts: UberJob::DEFAULT_MAX_ATTEMPTS,
            attempt_sleep: Duration::from_secs(1),
            row_limit: None,
        }
    }
}

/// What the caller should do after reporting an UberJob's outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryAction {
    /// No further action; the UberJob reached a terminal state.
    None,
    /// Sleep `attempt_sleep`, then resubmit these jobs (now `Pending`
    /// again) through [`Executive::assign_pending`].
    Reassign { attempt_sleep: Duration },
}

#[derive(Debug, Default)]
struct ExecutiveState {
    job_map: HashMap<JobId, Job>,
    uber_jobs_map: HashMap<UberJobId, UberJob>,
    chunk_to_job_map: HashMap<ChunkId, JobId>,
}

/// One query's worth of chunk dispatch state. A single `Executive` is
/// created per in-flight user query.
#[derive(Debug)]
pub struct Executive {
    query_id: QueryId,
    config: ExecutiveConfig,
    state: Mutex<ExecutiveState>,

    total_jobs: AtomicU32,
    request_count: AtomicU64,
    data_ignored_count: AtomicU64,
    total_result_rows: AtomicU64,

    cancelled: AtomicBool,
    limit_row_complete: AtomicBool,
    ready_to_execute: AtomicBool,

    next_uber_job_id: AtomicU64,
}

impl Executive {
    pub fn new(query_id: QueryId, config: ExecutiveConfig) -> Self {
        Self {
            query_id,
            config,
            state: Mutex::new(ExecutiveState::default()),
            total_jobs: AtomicU32::new(0),
            request_count: AtomicU64::new(0),
            data_ignored_count: AtomicU64::new(0),
            total_result_rows: AtomicU64::new(0),
            cancelled: AtomicBool::new(false),
            limit_row_complete: AtomicBool::new(false),
            ready_to_execute: AtomicBool::new(false),
            next_uber_job_id: AtomicU64::new(1),
        }
    }

    pub fn query_id(&self) -> QueryId {
        self.query_id
    }

    /// Registers a Job for one chunk fragment. Jobs start `Pending` and
    /// are not dispatched until [`Executive::set_ready`] and
    /// [`Executive::assign_pending`] run.
    pub fn add_chunk(&self, job_id: JobId, chunk_id: ChunkId) {
        let mut state = self.state.lock();
        state.chunk_to_job_map.insert(chunk_id, job_id);
        state.job_map.insert(job_id, Job::new(self.query_id, job_id, chunk_id));
        self.total_jobs.fetch_add(1, Ordering::Relaxed);
    }

    /// `LIMIT 0`: the query is satisfied before any chunk is dispatched.
    pub fn zero_chunks(&self) -> bool {
        self.total_jobs.load(Ordering::Relaxed) == 0
    }

    pub fn set_ready(&self) {
        self.ready_to_execute.store(true, Ordering::Release);
    }

    pub fn is_ready(&self) -> bool {
        self.ready_to_execute.load(Ordering::Acquire)
    }

    /// Packs every `Pending` Job into UberJobs of up to `uber_job_max_chunks`
    /// jobs per worker, using `locator` to resolve each chunk's worker.
    /// Returns the newly created UberJobs, ready for the caller to dispatch.
    pub fn assign_pending(&self, locator: &dyn ChunkLocator) -> Vec<UberJob> {
        if self.cancelled.load(Ordering::Acquire) {
            return Vec::new();
        }
        let mut state = self.state.lock();
        let pending_job_ids: Vec<JobId> = state
            .job_map
            .values()
            .filter(|j| j.state == JobState::Pending)
            .map(|j| j.job_id)
            .collect();

        let mut by_worker: HashMap<WorkerName, Vec<JobId>> = HashMap::new();
        for job_id in pending_job_ids {
            let chunk_id = state.job_map[&job_id].chunk_id;
            match locator.worker_for_chunk(chunk_id) {
                Some(worker) => by_worker.entry(worker).or_default().push(job_id),
                None => warn!(%chunk_id, "no worker currently holds this chunk, leaving job pending"),
            }
        }

        let mut created = Vec::new();
        for (worker, job_ids) in by_worker {
            for batch in job_ids.chunks(self.config.uber_job_max_chunks) {
                let uber_job_id = UberJobId::new(self.next_uber_job_id.fetch_add(1, Ordering::Relaxed));
                let mut uber_job = UberJob::new(self.query_id, uber_job_id, worker.clone());
                uber_job.max_attempts = self.config.max_attempts;
                uber_job.state = JobState::Assigned;
                for &job_id in batch {
                    uber_job.job_ids.push(job_id);
                    if let Some(job) = state.job_map.get_mut(&job_id) {
                        job.state = JobState::Assigned;
                        job.uber_job_id = Some(uber_job_id);
                    }
                }
                state.uber_jobs_map.insert(uber_job_id, uber_job.clone());
                created.push(uber_job);
            }
        }
        self.request_count.fetch_add(created.len() as u64, Ordering::Relaxed);
        created
    }

    pub fn mark_running(&self, uber_job_id: UberJobId) {
        let mut state = self.state.lock();
        if let Some(uj) = state.uber_jobs_map.get_mut(&uber_job_id) {
            uj.state = JobState::Running;
            let job_ids = uj.job_ids.clone();
            for job_id in job_ids {
                if let Some(job) = state.job_map.get_mut(&job_id) {
                    job.state = JobState::Running;
                }
            }
        }
    }

    /// Reports an UberJob's outcome. On success, both the UberJob and its
    /// Jobs become terminal `Success`. On retryable failure within
    /// `max_attempts`, the Jobs return to `Pending` (to be reassigned to a
    /// different worker) and the caller is told to sleep and retry. Beyond
    /// `max_attempts`, the UberJob and Jobs become `FailedTerminal`.
    pub fn report_outcome(&self, uber_job_id: UberJobId, success: bool) -> RetryAction {
        let mut state = self.state.lock();
        let ExecutiveState {
            job_map,
            uber_jobs_map,
            ..
        } = &mut *state;
        let Some(uj) = uber_jobs_map.get_mut(&uber_job_id) else {
            return RetryAction::None;
        };

        if success {
            uj.state = JobState::Success;
            let job_ids = uj.job_ids.clone();
            for job_id in job_ids {
                if let Some(job) = job_map.get_mut(&job_id) {
                    job.state = JobState::Success;
                }
            }
            return RetryAction::None;
        }

        uj.attempt += 1;
        let max_attempts = self.config.max_attempts;
        let job_ids = uj.job_ids.clone();

        // Every job in the batch failed together and was dispatched the
        // same number of times, so their post-increment attempt counts
        // agree; decide retry-vs-terminal once for the whole batch.
        let mut should_retry = false;
        for (i, job_id) in job_ids.iter().enumerate() {
            if let Some(job) = job_map.get_mut(job_id) {
                job.attempt += 1;
                let retry = job.attempt < max_attempts;
                if i == 0 {
                    should_retry = retry;
                }
                if retry {
                    job.state = JobState::Pending;
                    job.uber_job_id = None;
                } else {
                    job.state = JobState::FailedTerminal;
                }
            }
        }

        if should_retry {
            uj.state = JobState::Cancelled;
            info!(%uber_job_id, "uber job failed, reassigning");
            RetryAction::Reassign {
                attempt_sleep: self.config.attempt_sleep,
            }
        } else {
            uj.state = JobState::FailedTerminal;
            warn!(%uber_job_id, "uber job exhausted retries, query will fail");
            RetryAction::None
        }
    }

    /// Returns the Jobs on a worker that is being evicted by the health
    /// monitor, back to `Pending` so they are reassigned elsewhere.
    pub fn kill_incomplete_uber_jobs_on_worker(&self, worker: &WorkerName) -> Vec<UberJobId> {
        let mut state = self.state.lock();
        let mut reset = Vec::new();
        let stale: Vec<UberJobId> = state
            .uber_jobs_map
            .values()
            .filter(|uj| &uj.worker == worker && !uj.state.is_terminal())
            .map(|uj| uj.uber_job_id)
            .collect();
        for uber_job_id in stale {
            if let Some(uj) = state.uber_jobs_map.get_mut(&uber_job_id) {
                uj.state = JobState::Cancelled;
                let job_ids = uj.job_ids.clone();
                for job_id in job_ids {
                    if let Some(job) = state.job_map.get_mut(&job_id) {
                        job.state = JobState::Pending;
                        job.uber_job_id = None;
                    }
                }
            }
            reset.push(uber_job_id);
        }
        reset
    }

    /// Adds `n` rows to the running total and, if the query carries a
    /// `LIMIT`, one-shot-flips `limit_row_complete` once the threshold is
    /// crossed. Returns `true` exactly once, the first time the limit is
    /// crossed, telling the caller to trigger squash.
    pub fn record_result_rows(&self, n: u64) -> bool {
        let total = self.total_result_rows.fetch_add(n, Ordering::Relaxed) + n;
        match self.config.row_limit {
            Some(limit) if total >= limit => self
                .limit_row_complete
                .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                .is_ok(),
            _ => false,
        }
    }

    pub fn note_ignored_data(&self, n: u64) {
        self.data_ignored_count.fetch_add(n, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    pub fn cancel(&self) -> Vec<(UberJobId, WorkerName)> {
        self.cancelled.store(true, Ordering::Release);
        self.squash()
    }

    /// Copies the active set under lock, releases the lock, and returns
    /// `(uberJobId, worker)` pairs to cancel outside the lock — squash is
    /// network-latency bound and must not hold `state` while cancel RPCs
    /// are in flight.
    pub fn squash(&self) -> Vec<(UberJobId, WorkerName)> {
        let mut state = self.state.lock();
        let active: Vec<(UberJobId, WorkerName)> = state
            .uber_jobs_map
            .values()
            .filter(|uj| !uj.state.is_terminal())
            .map(|uj| (uj.uber_job_id, uj.worker.clone()))
            .collect();
        for (uber_job_id, _) in &active {
            if let Some(uj) = state.uber_jobs_map.get_mut(uber_job_id) {
                uj.state = JobState::Cancelled;
                let job_ids = uj.job_ids.clone();
                for job_id in job_ids {
                    if let Some(job) = state.job_map.get_mut(&job_id) {
                        job.state = JobState::Cancelled;
                    }
                }
            }
        }
        active
    }

    pub fn stats(&self) -> ExecutiveStats {
        ExecutiveStats {
            total_jobs: self.total_jobs.load(Ordering::Relaxed),
            request_count: self.request_count.load(Ordering::Relaxed),
            data_ignored_count: self.data_ignored_count.load(Ordering::Relaxed),
            total_result_rows: self.total_result_rows.load(Ordering::Relaxed),
            cancelled: self.cancelled.load(Ordering::Relaxed),
            limit_row_complete: self.limit_row_complete.load(Ordering::Relaxed),
        }
    }

    pub fn all_terminal(&self) -> bool {
        let state = self.state.lock();
        !state.job_map.is_empty() && state.job_map.values().all(|j| j.state.is_terminal())
    }

    /// Whether any Job exhausted its retries, as opposed to succeeding or
    /// being cancelled. The caller uses this to decide between `COMPLETED`
    /// and `FAILED` once [`Executive::all_terminal`] is true.
    pub fn has_failed_jobs(&self) -> bool {
        let state = self.state.lock();
        state
            .job_map
            .values()
            .any(|j| j.state == JobState::FailedTerminal)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutiveStats {
    pub total_jobs: u32,
    pub request_count: u64,
    pub data_ignored_count: u64,
    pub total_result_rows: u64,
    pub cancelled: bool,
    pub limit_row_complete: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locator::StaticLocator;

    fn qid() -> QueryId {
        QueryId::new(1)
    }

    #[test]
    fn zero_chunks_is_satisfied_immediately() {
        let exec = Executive::new(qid(), ExecutiveConfig::default());
        assert!(exec.zero_chunks());
    }

    #[test]
    fn assignment_packs_jobs_per_worker_up_to_the_batch_size() {
        let exec = Executive::new(
            qid(),
            ExecutiveConfig {
                uber_job_max_chunks: 2,
                ..Default::default()
            },
        );
        let locator = StaticLocator::new()
            .with_assignment(ChunkId::new(1), WorkerName::from("w1"))
            .with_assignment(ChunkId::new(2), WorkerName::from("w1"))
            .with_assignment(ChunkId::new(3), WorkerName::from("w1"));
        for (i, chunk) in [1, 2, 3].into_iter().enumerate() {
            exec.add_chunk(JobId::new(i as u64 + 1), ChunkId::new(chunk));
        }
        exec.set_ready();

        let uber_jobs = exec.assign_pending(&locator);
        let total_jobs: usize = uber_jobs.iter().map(|uj| uj.job_ids.len()).sum();
        assert_eq!(total_jobs, 3);
        assert!(uber_jobs.iter().all(|uj| uj.job_ids.len() <= 2));
        assert_eq!(uber_jobs.len(), 2);
    }

    #[test]
    fn unlocated_chunks_stay_pending() {
        let exec = Executive::new(qid(), ExecutiveConfig::default());
        let locator = StaticLocator::new();
        exec.add_chunk(JobId::new(1), ChunkId::new(1));
        exec.set_ready();
        let uber_jobs = exec.assign_pending(&locator);
        assert!(uber_jobs.is_empty());
    }

    #[test]
    fn retryable_failure_reassigns_until_max_attempts() {
        let exec = Executive::new(
            qid(),
            ExecutiveConfig {
                max_attempts: 2,
                ..Default::default()
            },
        );
        let locator = StaticLocator::new().with_assignment(ChunkId::new(1), WorkerName::from("w1"));
        exec.add_chunk(JobId::new(1), ChunkId::new(1));
        exec.set_ready();
        let uber_jobs = exec.assign_pending(&locator);
        let uber_job_id = uber_jobs[0].uber_job_id;

        let action = exec.report_outcome(uber_job_id, false);
        assert!(matches!(action, RetryAction::Reassign { .. }));

        let reassigned = exec.assign_pending(&locator);
        let uber_job_id2 = reassigned[0].uber_job_id;
        let action2 = exec.report_outcome(uber_job_id2, false);
        assert_eq!(action2, RetryAction::None);
        assert!(exec.all_terminal());
    }

    #[test]
    fn success_marks_jobs_terminal() {
        let exec = Executive::new(qid(), ExecutiveConfig::default());
        let locator = StaticLocator::new().with_assignment(ChunkId::new(1), WorkerName::from("w1"));
        exec.add_chunk(JobId::new(1), ChunkId::new(1));
        exec.set_ready();
        let uber_jobs = exec.assign_pending(&locator);
        exec.report_outcome(uber_jobs[0].uber_job_id, true);
        assert!(exec.all_terminal());
    }

    #[test]
    fn limit_row_complete_flips_exactly_once() {
        let exec = Executive::new(
            qid(),
            ExecutiveConfig {
                row_limit: Some(10),
                ..Default::default()
            },
        );
        assert!(!exec.record_result_rows(5));
        assert!(exec.record_result_rows(6));
        assert!(!exec.record_result_rows(1));
    }

    #[test]
    fn squash_cancels_active_uber_jobs_and_their_jobs() {
        let exec = Executive::new(qid(), ExecutiveConfig::default());
        let locator = StaticLocator::new().with_assignment(ChunkId::new(1), WorkerName::from("w1"));
        exec.add_chunk(JobId::new(1), ChunkId::new(1));
        exec.set_ready();
        exec.assign_pending(&locator);

        let cancelled = exec.cancel();
        assert_eq!(cancelled.len(), 1);
        assert!(exec.is_cancelled());
        assert!(exec.all_terminal());
    }

    #[test]
    fn has_failed_jobs_reports_terminal_failure() {
        let exec = Executive::new(
            qid(),
            ExecutiveConfig {
                max_attempts: 1,
                ..Default::default()
            },
        );
        let locator = StaticLocator::new().with_assignment(ChunkId::new(1), WorkerName::from("w1"));
        exec.add_chunk(JobId::new(1), ChunkId::new(1));
        exec.set_ready();
        let uber_jobs = exec.assign_pending(&locator);
        exec.report_outcome(uber_jobs[0].uber_job_id, false);
        assert!(exec.has_failed_jobs());
    }

    #[test]
    fn eviction_returns_worker_jobs_to_pending() {
        let exec = Executive::new(qid(), ExecutiveConfig::default());
        let locator = StaticLocator::new().with_assignment(ChunkId::new(1), WorkerName::from("w1"));
        exec.add_chunk(JobId::new(1), ChunkId::new(1));
        exec.set_ready();
        exec.assign_pending(&locator);

        let reset = exec.kill_incomplete_uber_jobs_on_worker(&WorkerName::from("w1"));
        assert_eq!(reset.len(), 1);
        assert!(!exec.all_terminal());
    }
}
