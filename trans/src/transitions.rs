//! The super-transaction state machine's legal edges, kept as pure data so
//! `Registry::update_transaction` can validate a requested move before it
//! ever reaches the store.

use qmeta_types::TransactionState;

/// `IS_STARTING → {STARTED, START_FAILED}`, `STARTED → {IS_FINISHING,
/// IS_ABORTING}`, `IS_FINISHING → {FINISHED, FINISH_FAILED}`,
/// `IS_ABORTING → {ABORTED, ABORT_FAILED}`. Every other pair, including
/// any move out of a terminal state, is rejected.
pub fn is_valid_transition(from: TransactionState, to: TransactionState) -> bool {
    use TransactionState::*;
    matches!(
        (from, to),
        (IsStarting, Started)
            | (IsStarting, StartFailed)
            | (Started, IsFinishing)
            | (Started, IsAborting)
            | (IsFinishing, Finished)
            | (IsFinishing, FinishFailed)
            | (IsAborting, Aborted)
            | (IsAborting, AbortFailed)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use TransactionState::*;

    #[test]
    fn started_may_finish_or_abort() {
        assert!(is_valid_transition(Started, IsFinishing));
        assert!(is_valid_transition(Started, IsAborting));
    }

    #[test]
    fn terminal_states_accept_no_further_transition() {
        assert!(!is_valid_transition(Finished, IsStarting));
        assert!(!is_valid_transition(Aborted, Started));
        assert!(!is_valid_transition(StartFailed, Started));
    }

    #[test]
    fn skipping_a_state_is_rejected() {
        assert!(!is_valid_transition(IsStarting, Finished));
        assert!(!is_valid_transition(IsStarting, IsFinishing));
    }
}
