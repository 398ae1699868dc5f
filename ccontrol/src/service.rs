//! Wires a submitted, already-analyzed query to a fresh [`UserQuery`]
//! session: allocates its `queryId`, persists the `QInfo` row, creates and
//! locks its result/message tables, and registers it in the in-process
//! session map the czar process owns.

use std::sync::Arc;

use czar_time::SharedTimeProvider;
use metastore::Metastore;
use qana::QueryContext;
use qdisp::{Executive, ExecutiveConfig, ResultMerger};
use qmeta_types::{ChunkId, CzarId, JobId, QueryId, QueryStatus, UberJobId, UserQueryMeta, WorkerName};
use query_ir::SelectStmt;

use snafu::OptionExt;

use crate::{
    error::{NoSuchQuerySnafu, Result},
    registry::SessionRegistry,
    result_db::{self, ResultDbExecutor},
    session::UserQuery,
};

/// The czar's single entry point for user-query lifecycle. One instance
/// per czar process; its `czar_id` tags every session it creates.
#[derive(Debug)]
pub struct SessionService {
    czar_id: CzarId,
    store: Metastore,
    registry: SessionRegistry,
    time: SharedTimeProvider,
}

impl SessionService {
    pub fn new(czar_id: CzarId, store: Metastore, time: SharedTimeProvider) -> Self {
        Self {
            czar_id,
            store,
            registry: SessionRegistry::new(),
            time,
        }
    }

    pub fn czar_id(&self) -> CzarId {
        self.czar_id
    }

    /// Records the query, creates and locks its result/message tables, and
    /// spawns an [`Executive`] with one Job per entry in `chunk_ids` — the
    /// caller has already resolved the query's chunk enumeration (whether
    /// `AllChunks` or a director-index lookup) against the replica index.
    pub async fn submit(
        &self,
        sql: String,
        stmt: &SelectStmt,
        ctx: &QueryContext,
        chunk_ids: &[ChunkId],
        executive_config: ExecutiveConfig,
        executor: &dyn ResultDbExecutor,
    ) -> Result<Arc<UserQuery>> {
        self.registry.prune_expired();

        let query_id = self.store.query_meta().next_query_id(self.czar_id).await?;
        let result_table = UserQueryMeta::result_table_name(query_id);
        let message_table = UserQueryMeta::message_table_name(query_id);

        let meta = UserQueryMeta {
            query_id,
            czar_id: self.czar_id,
            sql: sql.clone(),
            default_db: stmt.dominant_db.clone(),
            result_loc: "qservResult".to_string(),
            result_table: result_table.clone(),
            message_table: message_table.clone(),
            status: QueryStatus::Executing,
            submitted_at_ms: self.time.now().timestamp_millis(),
            completed_at_ms: None,
            chunk_count: chunk_ids.len() as u32,
            collected_bytes: 0,
            collected_rows: 0,
            final_rows: 0,
            messages: Vec::new(),
        };
        self.store.query_meta().insert(&meta).await?;

        result_db::run(executor, result_db::create_result_table_sql(&result_table)).await?;
        result_db::run(executor, result_db::create_message_table_sql(&message_table)).await?;
        result_db::run(executor, result_db::lock_message_table_sql(&message_table)).await?;

        let executive = Arc::new(Executive::new(query_id, executive_config));
        for (i, &chunk_id) in chunk_ids.iter().enumerate() {
            executive.add_chunk(JobId::new(i as u64 + 1), chunk_id);
        }
        // A byte-size result cap is a separate, deployment-level knob from
        // `LIMIT n` (which `ExecutiveConfig::row_limit` already enforces);
        // this crate doesn't set one on the caller's behalf.
        let merger = Arc::new(ResultMerger::new(None));

        let session = Arc::new(UserQuery::new(
            query_id,
            self.czar_id,
            sql,
            stmt.dominant_db.clone(),
            ctx.merge_select_list.clone(),
            stmt.order_by.clone(),
            stmt.limit,
            executive,
            merger,
            Arc::clone(&self.time),
        ));
        self.registry.insert(self.czar_id, query_id, &session);
        Ok(session)
    }

    pub fn get(&self, query_id: QueryId) -> Option<Arc<UserQuery>> {
        self.registry.get(self.czar_id, query_id)
    }

    /// Kills the session, returning the `(uberJobId, worker)` targets the
    /// caller must cancel through its `WorkerChannel`.
    pub fn kill(&self, query_id: QueryId, reason: impl Into<String>) -> Result<Vec<(UberJobId, WorkerName)>> {
        self.registry.prune_expired();
        let session = self.get(query_id).context(NoSuchQuerySnafu { query_id })?;
        session.kill(reason)
    }

    /// Persists the query's final status and runs the `UNLOCK TABLES`
    /// statement that releases the proxy.
    pub async fn finish(&self, session: &UserQuery, executor: &dyn ResultDbExecutor) -> Result<()> {
        let unlock_sql = session.finish();
        result_db::run(executor, unlock_sql).await?;
        self.store
            .query_meta()
            .update_status(
                session.query_id(),
                session.status(),
                Some(self.time.now().timestamp_millis()),
            )
            .await?;
        self.store
            .query_meta()
            .update_counters(
                session.query_id(),
                session.merger().collected_bytes(),
                session.merger().collected_rows(),
                session.merger().collected_rows(),
            )
            .await?;
        Ok(())
    }
}
