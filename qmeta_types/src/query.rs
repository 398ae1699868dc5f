//! The user-query record (§C4) and the job/uberjob state machine it drives
//! (§C5).

use serde::{Deserialize, Serialize};

use crate::ids::{ChunkId, CzarId, JobId, QueryId, SubChunkId, UberJobId, WorkerName};

/// Terminal and non-terminal states of a user query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueryStatus {
    Executing,
    Completed,
    Failed,
    Aborted,
}

impl QueryStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, QueryStatus::Executing)
    }
}

/// A single severity-tagged message accumulated against a query, mirroring
/// the `QMessages` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryMessage {
    pub chunk_id: Option<ChunkId>,
    pub severity: MessageSeverity,
    pub code: i32,
    pub message: String,
    pub timestamp_ms: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageSeverity {
    Info,
    Warning,
    Error,
}

/// The full record of a user query, assembled from `QInfo` plus the
/// in-memory fields the czar tracks while it is executing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserQueryMeta {
    pub query_id: QueryId,
    pub czar_id: CzarId,
    pub sql: String,
    pub default_db: Option<String>,
    pub result_loc: String,
    pub result_table: String,
    pub message_table: String,
    pub status: QueryStatus,
    pub submitted_at_ms: i64,
    pub completed_at_ms: Option<i64>,
    pub chunk_count: u32,
    pub collected_bytes: u64,
    pub collected_rows: u64,
    pub final_rows: u64,
    pub messages: Vec<QueryMessage>,
}

impl UserQueryMeta {
    /// `result_<queryId>`, the table the merger writes rows into.
    pub fn result_table_name(query_id: QueryId) -> String {
        format!("result_{}", query_id)
    }

    /// `message_<queryId>`, locked by `submit()` so the proxy blocks on it.
    pub fn message_table_name(query_id: QueryId) -> String {
        format!("message_{}", query_id)
    }
}

/// Lifecycle of a [`Job`] / [`UberJob`]. A Job completes when its UberJob
/// does; both share this enum rather than two near-identical ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobState {
    Pending,
    Assigned,
    Running,
    Success,
    FailedRetryable,
    FailedTerminal,
    Cancelled,
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobState::Success | JobState::FailedTerminal | JobState::Cancelled
        )
    }
}

/// One per-chunk query fragment, keyed by `(queryId, jobId, chunkId)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub query_id: QueryId,
    pub job_id: JobId,
    pub chunk_id: ChunkId,
    pub sub_chunk_ids: Vec<SubChunkId>,
    pub state: JobState,
    pub uber_job_id: Option<UberJobId>,
    pub attempt: u32,
}

impl Job {
    pub fn new(query_id: QueryId, job_id: JobId, chunk_id: ChunkId) -> Self {
        Self {
            query_id,
            job_id,
            chunk_id,
            sub_chunk_ids: Vec::new(),
            state: JobState::Pending,
            uber_job_id: None,
            attempt: 0,
        }
    }
}

/// A worker-local bundle of Jobs sharing `(queryId, workerId)`, bounded by
/// `maxAttempts` (default 5, see [`UberJob::DEFAULT_MAX_ATTEMPTS`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UberJob {
    pub query_id: QueryId,
    pub uber_job_id: UberJobId,
    pub worker: WorkerName,
    pub job_ids: Vec<JobId>,
    pub state: JobState,
    pub attempt: u32,
    pub max_attempts: u32,
}

impl UberJob {
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

    pub fn new(query_id: QueryId, uber_job_id: UberJobId, worker: WorkerName) -> Self {
        Self {
            query_id,
            uber_job_id,
            worker,
            job_ids: Vec::new(),
            state: JobState::Pending,
            attempt: 0,
            max_attempts: Self::DEFAULT_MAX_ATTEMPTS,
        }
    }

    /// Whether another attempt is permitted after a retryable failure.
    pub fn can_retry(&self) -> bool {
        self.state == JobState::FailedRetryable && self.attempt < self.max_attempts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_state_terminality() {
        assert!(JobState::Success.is_terminal());
        assert!(!JobState::Running.is_terminal());
    }

    #[test]
    fn uber_job_retries_until_max_attempts() {
        let mut uj = UberJob::new(QueryId::new(1), UberJobId::new(1), WorkerName::from("w1"));
        uj.state = JobState::FailedRetryable;
        uj.attempt = UberJob::DEFAULT_MAX_ATTEMPTS - 1;
        assert!(uj.can_retry());
        uj.attempt = UberJob::DEFAULT_MAX_ATTEMPTS;
        assert!(!uj.can_retry());
    }

    #[test]
    fn result_and_message_table_names_are_query_scoped() {
        let id = QueryId::new(7);
        assert_eq!(UserQueryMeta::result_table_name(id), "result_7");
        assert_eq!(UserQueryMeta::message_table_name(id), "message_7");
    }
}
