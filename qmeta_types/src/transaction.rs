//! Super-transaction records (§C9): state machine and append-only
//! contribution audit.

use serde::{Deserialize, Serialize};

use crate::ids::{ContributionId, TransactionId};

/// Transitions: `IS_STARTING → STARTED → {IS_FINISHING, IS_ABORTING} →
/// {FINISHED, ABORTED}`, with `*_FAILED` dead ends reachable from the
/// corresponding non-terminal state if the worker-side step it was
/// waiting on never completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionState {
    IsStarting,
    Started,
    IsFinishing,
    IsAborting,
    Finished,
    Aborted,
    StartFailed,
    FinishFailed,
    AbortFailed,
}

impl TransactionState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TransactionState::Finished
                | TransactionState::Aborted
                | TransactionState::StartFailed
                | TransactionState::FinishFailed
                | TransactionState::AbortFailed
        )
    }

    /// Whether a database with a transaction in this state may be
    /// un-published (only once every transaction has reached a terminal
    /// state).
    pub fn blocks_unpublish(&self) -> bool {
        !self.is_terminal()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub database: String,
    pub state: TransactionState,
    pub begin_time_ms: i64,
    pub start_time_ms: Option<i64>,
    pub transition_time_ms: Option<i64>,
    pub end_time_ms: Option<i64>,
    pub context: Option<String>,
}

/// One worker's contribution of data under a transaction, keyed by
/// `(transactionId, workerName, tableName, chunkId, contributionId)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contribution {
    pub transaction_id: TransactionId,
    pub worker: String,
    pub table: String,
    pub chunk_id: i32,
    pub contribution_id: ContributionId,
    pub rows: u64,
    pub success: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_terminal_states_allow_unpublish() {
        assert!(TransactionState::Started.blocks_unpublish());
        assert!(!TransactionState::Finished.blocks_unpublish());
        assert!(!TransactionState::Aborted.blocks_unpublish());
    }
}
