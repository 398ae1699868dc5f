//! The multi-request orchestration layer: `CREATED → IN_PROGRESS →
//! FINISHED(SUCCESS|FAILURE|CANCELLED)`. A [`Job`] owns a set of
//! [`Request`](crate::request::Request)s and a completion predicate; each
//! job type in §4.8's table implements it with its own per-worker op and
//! success rule.

use async_trait::async_trait;
use hashbrown::HashMap;
use qmeta_types::WorkerName;
use worker_rpc::WorkerTransport;

use crate::request::RequestState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Created,
    InProgress,
    FinishedSuccess,
    FinishedFailure,
    FinishedCancelled,
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobState::Created | JobState::InProgress)
    }
}

/// The result of running one job to completion: per-worker request
/// outcomes plus whatever structured payload that job type produces.
#[derive(Debug, Clone)]
pub struct JobReport {
    pub state: JobState,
    pub per_worker: HashMap<WorkerName, RequestState>,
    pub detail: String,
}

impl JobReport {
    pub fn success(per_worker: HashMap<WorkerName, RequestState>, detail: impl Into<String>) -> Self {
        Self {
            state: JobState::FinishedSuccess,
            per_worker,
            detail: detail.into(),
        }
    }

    pub fn failure(per_worker: HashMap<WorkerName, RequestState>, detail: impl Into<String>) -> Self {
        Self {
            state: JobState::FinishedFailure,
            per_worker,
            detail: detail.into(),
        }
    }

    /// Whether every dispatched request reached [`RequestState::Finished`],
    /// the "all must ack" success rule shared by `ServiceManagement` and
    /// `QservSync`.
    pub fn all_acked(per_worker: &HashMap<WorkerName, RequestState>) -> bool {
        !per_worker.is_empty()
            && per_worker
                .values()
                .all(|s| matches!(s, RequestState::Finished))
    }
}

/// One job type from §4.8's catalog: owns retry/aggregation policy and
/// dispatches through [`WorkerTransport`], which owns wire encoding and the
/// per-request transport timeout.
#[async_trait]
pub trait Job: Send + Sync {
    fn kind(&self) -> &'static str;

    async fn run(&self, transport: &dyn WorkerTransport) -> JobReport;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_acked_requires_a_nonempty_all_finished_set() {
        let mut per_worker = HashMap::new();
        assert!(!JobReport::all_acked(&per_worker));
        per_worker.insert(WorkerName::from("worker01"), RequestState::Finished);
        assert!(JobReport::all_acked(&per_worker));
        per_worker.insert(WorkerName::from("worker02"), RequestState::Failed);
        assert!(!JobReport::all_acked(&per_worker));
    }
}
