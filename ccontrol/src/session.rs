//! [`UserQuery`]: the per-query session object C4 owns from `submit()`
//! through `discard()`. Thin by design — the actual chunk dispatch state
//! lives in its [`Executive`] and [`ResultMerger`]; this type wires that
//! state to the proxy-visible result/message tables and the metadata
//! store.

use std::sync::Arc;

use czar_time::{SharedTimeProvider, Time};
use observability_deps::tracing::{info, warn};
use parking_lot::Mutex;
use qdisp::{Executive, ResultMerger};
use qmeta_types::{ChunkId, CzarId, MessageSeverity, QueryId, QueryMessage, QueryStatus, UserQueryMeta, WorkerName};
use query_ir::ValueExpr;

use crate::{
    error::{AlreadyTerminalSnafu, Result},
    result_db::{self, ResultDbExecutor},
};

/// A submitted query's session: its identity, the tables the proxy will
/// read from, and the dispatch state driving it to completion.
#[derive(Debug)]
pub struct UserQuery {
    query_id: QueryId,
    czar_id: CzarId,
    sql: String,
    default_db: Option<String>,
    result_table: String,
    message_table: String,
    merge_select_list: Vec<ValueExpr>,
    order_by: Vec<ValueExpr>,
    limit: Option<u64>,
    executive: Arc<Executive>,
    merger: Arc<ResultMerger>,
    status: Mutex<QueryStatus>,
    time: SharedTimeProvider,
    submitted_at: Time,
    /// Cleared by `discard()`: `None` once the message table's lock has
    /// been released and transient resources are gone.
    message_table_locked: Mutex<bool>,
}

impl UserQuery {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        query_id: QueryId,
        czar_id: CzarId,
        sql: String,
        default_db: Option<String>,
        merge_select_list: Vec<ValueExpr>,
        order_by: Vec<ValueExpr>,
        limit: Option<u64>,
        executive: Arc<Executive>,
        merger: Arc<ResultMerger>,
        time: SharedTimeProvider,
    ) -> Self {
        let submitted_at = time.now();
        Self {
            result_table: UserQueryMeta::result_table_name(query_id),
            message_table: UserQueryMeta::message_table_name(query_id),
            query_id,
            czar_id,
            sql,
            default_db,
            merge_select_list,
            order_by,
            limit,
            executive,
            merger,
            status: Mutex::new(QueryStatus::Executing),
            time,
            submitted_at,
            message_table_locked: Mutex::new(true),
        }
    }

    pub fn query_id(&self) -> QueryId {
        self.query_id
    }

    pub fn czar_id(&self) -> CzarId {
        self.czar_id
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn result_table(&self) -> &str {
        &self.result_table
    }

    pub fn message_table(&self) -> &str {
        &self.message_table
    }

    pub fn status(&self) -> QueryStatus {
        *self.status.lock()
    }

    pub fn executive(&self) -> &Arc<Executive> {
        &self.executive
    }

    pub fn merger(&self) -> &Arc<ResultMerger> {
        &self.merger
    }

    pub fn submitted_at_ms(&self) -> i64 {
        self.submitted_at.timestamp_millis()
    }

    /// The string the proxy runs to read results:
    /// `SELECT <merge-projection> FROM <result table> [ORDER BY …] [LIMIT …]`.
    pub fn result_query(&self) -> String {
        result_db::result_query(
            &self.result_table,
            &self.merge_select_list,
            &self.order_by,
            self.limit,
        )
    }

    /// Blocks (in the async sense) until every Job reaches a terminal
    /// state or the query is cancelled, polling the Executive rather than
    /// waiting on a completion future — dispatch already reconciles
    /// through its own channel; this just observes the outcome.
    pub async fn join(&self) {
        while !self.executive.zero_chunks()
            && !self.executive.all_terminal()
            && !self.executive.is_cancelled()
        {
            self.time.sleep(std::time::Duration::from_millis(20)).await;
        }
    }

    /// Sets the cancel flag and squashes the active UberJob set. Returns
    /// the `(uberJobId, worker)` pairs the caller must send cancel
    /// requests to through its [`qdisp::WorkerChannel`] — this crate has
    /// no wire-transport dependency of its own.
    pub fn kill(&self, reason: impl Into<String>) -> Result<Vec<(qmeta_types::UberJobId, WorkerName)>> {
        let mut status = self.status.lock();
        if status.is_terminal() {
            return AlreadyTerminalSnafu {
                query_id: self.query_id,
            }
            .fail();
        }
        let reason = reason.into();
        warn!(query_id = %self.query_id, %reason, "killing query");
        *status = QueryStatus::Aborted;
        Ok(self.executive.cancel())
    }

    /// Final status once the Executive reports every Job terminal:
    /// `Aborted` if `kill()` ran, `Failed` if any Job exhausted retries,
    /// `Completed` otherwise.
    pub fn finish_status(&self) -> QueryStatus {
        let current = *self.status.lock();
        if current == QueryStatus::Aborted {
            return current;
        }
        if self.executive.has_failed_jobs() {
            QueryStatus::Failed
        } else {
            QueryStatus::Completed
        }
    }

    /// Marks the session complete, returning the `UNLOCK TABLES` statement
    /// the caller must run so the proxy can read the result. Accumulates
    /// no further messages; those are written by `record_message` as they
    /// occur during dispatch.
    pub fn finish(&self) -> String {
        let status = self.finish_status();
        *self.status.lock() = status;
        info!(query_id = %self.query_id, ?status, "query finished");
        result_db::unlock_tables_sql()
    }

    /// A `(COMPLETE|CANCEL|MULTIERROR) summary` message, `chunkId = -1`.
    pub fn summary_message(&self, severity: MessageSeverity, code: i32, text: impl Into<String>) -> QueryMessage {
        QueryMessage {
            chunk_id: None,
            severity,
            code,
            message: text.into(),
            timestamp_ms: self.time.now().timestamp_millis(),
        }
    }

    pub fn chunk_message(
        &self,
        chunk_id: ChunkId,
        severity: MessageSeverity,
        code: i32,
        text: impl Into<String>,
    ) -> QueryMessage {
        QueryMessage {
            chunk_id: Some(chunk_id),
            severity,
            code,
            message: text.into(),
            timestamp_ms: self.time.now().timestamp_millis(),
        }
    }

    /// Drops transient resources (the message table's lock) without
    /// touching the catalog rows `QInfo`/`QMessages` already hold. Returns
    /// `None` if the lock was already released by an earlier `discard()`.
    pub async fn discard(&self, executor: &dyn ResultDbExecutor) -> Result<Option<()>> {
        let mut locked = self.message_table_locked.lock();
        if !*locked {
            return Ok(None);
        }
        result_db::run(executor, result_db::unlock_tables_sql()).await?;
        *locked = false;
        Ok(Some(()))
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use czar_time::{MockProvider, Time};
    use qdisp::ExecutiveConfig;

    /// A minimal, fully in-memory session for registry/lifetime tests that
    /// don't need a metadata store or result-db transport.
    pub fn bare_session(query_id: QueryId) -> UserQuery {
        UserQuery::new(
            query_id,
            CzarId::new(1),
            "SELECT 1".to_string(),
            None,
            Vec::new(),
            Vec::new(),
            None,
            Arc::new(Executive::new(query_id, ExecutiveConfig::default())),
            Arc::new(ResultMerger::new(None)),
            Arc::new(MockProvider::new(Time::from_timestamp_nanos(0))),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qdisp::ExecutiveConfig;
    use query_ir::ColumnRef;
    use test_support::bare_session;

    #[test]
    fn result_query_defaults_to_star_projection() {
        let session = bare_session(QueryId::new(1));
        assert_eq!(session.result_query(), "SELECT * FROM result_1");
    }

    #[test]
    fn result_query_honors_merge_projection_order_by_and_limit() {
        let session = UserQuery::new(
            QueryId::new(2),
            CzarId::new(1),
            "SELECT objectId FROM Object".to_string(),
            Some("LSST".to_string()),
            vec![ValueExpr::column(ColumnRef::unqualified("objectId"))],
            vec![ValueExpr::column(ColumnRef::unqualified("objectId"))],
            Some(5),
            Arc::new(Executive::new(QueryId::new(2), ExecutiveConfig::default())),
            Arc::new(ResultMerger::new(None)),
            Arc::new(czar_time::MockProvider::new(czar_time::Time::from_timestamp_nanos(0))),
        );
        assert_eq!(
            session.result_query(),
            "SELECT objectId FROM result_2 ORDER BY objectId LIMIT 5"
        );
    }

    #[test]
    fn kill_is_rejected_once_already_terminal() {
        let session = bare_session(QueryId::new(3));
        session.kill("operator request").unwrap();
        assert!(session.kill("again").is_err());
    }

    #[tokio::test]
    async fn join_returns_once_zero_chunk_query_is_terminal() {
        let session = bare_session(QueryId::new(4));
        session.join().await;
        assert_eq!(session.finish_status(), QueryStatus::Completed);
    }
}
