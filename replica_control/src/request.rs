//! The single-RPC request state machine: `CREATED → IN_QUEUE → IN_PROGRESS
//! → {FINISHED, CANCELLED, FAILED, TIMEOUT}`. `Failed` is an application
//! error (the worker ran the RPC and it returned an error); `Timeout` and
//! the transport half of `Cancelled` are distinguished from it so a job's
//! retry policy can tell "the worker said no" from "we never heard back".

use qmeta_types::WorkerName;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestState {
    Created,
    InQueue,
    InProgress,
    Finished,
    Cancelled,
    Failed,
    Timeout,
}

impl RequestState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RequestState::Finished
                | RequestState::Cancelled
                | RequestState::Failed
                | RequestState::Timeout
        )
    }
}

/// One outstanding RPC to one worker, owned by a [`crate::jobs::Job`].
#[derive(Debug, Clone)]
pub struct Request {
    pub id: u64,
    pub worker: WorkerName,
    pub priority: i32,
    pub timeout_sec: u32,
    pub created_at_ms: i64,
    pub started_at_ms: Option<i64>,
    pub finished_at_ms: Option<i64>,
    pub performance_ms: Option<i64>,
    pub state: RequestState,
}

impl Request {
    pub fn new(id: u64, worker: WorkerName, priority: i32, timeout_sec: u32, now_ms: i64) -> Self {
        Self {
            id,
            worker,
            priority,
            timeout_sec,
            created_at_ms: now_ms,
            started_at_ms: None,
            finished_at_ms: None,
            performance_ms: None,
            state: RequestState::Created,
        }
    }

    pub fn start(&mut self, now_ms: i64) {
        self.started_at_ms = Some(now_ms);
        self.state = RequestState::InProgress;
    }

    pub fn finish(&mut self, state: RequestState, now_ms: i64) {
        debug_assert!(state.is_terminal());
        self.finished_at_ms = Some(now_ms);
        self.performance_ms = self.started_at_ms.map(|started| now_ms - started);
        self.state = state;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn performance_is_measured_from_start_not_creation() {
        let mut req = Request::new(1, WorkerName::from("worker01"), 0, 30, 1_000);
        req.start(1_100);
        req.finish(RequestState::Finished, 1_400);
        assert_eq!(req.performance_ms, Some(300));
        assert!(req.state.is_terminal());
    }

    #[test]
    fn timeout_and_failure_are_distinct_terminal_states() {
        let mut timed_out = Request::new(2, WorkerName::from("worker01"), 0, 5, 0);
        timed_out.finish(RequestState::Timeout, 5_001);
        assert_ne!(timed_out.state, RequestState::Failed);
        assert!(timed_out.state.is_terminal());
    }
}
