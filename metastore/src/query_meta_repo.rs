//! `QInfo`, `QCzar`, `QMessages`, `QProgress`.

use qmeta_types::{
    CzarId, MessageSeverity, QueryId, QueryMessage, QueryStatus, UserQueryMeta,
};
use sqlx::FromRow;
use sqlx_hotswap_pool::HotSwapPool;

use crate::error::{self, Result};

#[derive(Debug)]
pub struct QueryMetaRepo<'a> {
    pool: &'a HotSwapPool,
}

#[derive(FromRow)]
struct QInfoRow {
    query_id: i64,
    czar_id: i64,
    sql: String,
    default_db: Option<String>,
    result_loc: String,
    result_table: String,
    message_table: String,
    status: String,
    submitted: i64,
    completed: Option<i64>,
    chunk_count: i32,
    collected_bytes: i64,
    collected_rows: i64,
    final_rows: i64,
}

fn status_to_str(s: QueryStatus) -> &'static str {
    match s {
        QueryStatus::Executing => "EXECUTING",
        QueryStatus::Completed => "COMPLETED",
        QueryStatus::Failed => "FAILED",
        QueryStatus::Aborted => "ABORTED",
    }
}

fn status_from_str(s: &str) -> QueryStatus {
    match s {
        "COMPLETED" => QueryStatus::Completed,
        "FAILED" => QueryStatus::Failed,
        "ABORTED" => QueryStatus::Aborted,
        _ => QueryStatus::Executing,
    }
}

impl<'a> QueryMetaRepo<'a> {
    pub(crate) fn new(pool: &'a HotSwapPool) -> Self {
        Self { pool }
    }

    /// Allocates the next `queryId` for `czar_id` and inserts the `QInfo`
    /// row in `EXECUTING` state. Monotonic and durable: backed by a
    /// per-czar sequence rather than `MAX(query_id)+1`, so it survives
    /// concurrent submits.
    pub async fn next_query_id(&self, czar_id: CzarId) -> Result<QueryId> {
        let (id,): (i64,) = sqlx::query_as(
            "INSERT INTO q_czar_seq (czar_id, last_query_id) VALUES ($1, 1) \
             ON CONFLICT (czar_id) DO UPDATE SET last_query_id = q_czar_seq.last_query_id + 1 \
             RETURNING last_query_id",
        )
        .bind(czar_id.get() as i64)
        .fetch_one(self.pool.pool().as_ref())
        .await?;
        Ok(QueryId::new(id as u64))
    }

    pub async fn insert(&self, meta: &UserQueryMeta) -> Result<()> {
        sqlx::query(
            "INSERT INTO q_info (query_id, czar_id, sql, default_db, result_loc, result_table, \
             message_table, status, submitted, completed, chunk_count, collected_bytes, \
             collected_rows, final_rows) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12,$13,$14)",
        )
        .bind(meta.query_id.get() as i64)
        .bind(meta.czar_id.get() as i64)
        .bind(&meta.sql)
        .bind(&meta.default_db)
        .bind(&meta.result_loc)
        .bind(&meta.result_table)
        .bind(&meta.message_table)
        .bind(status_to_str(meta.status))
        .bind(meta.submitted_at_ms)
        .bind(meta.completed_at_ms)
        .bind(meta.chunk_count as i32)
        .bind(meta.collected_bytes as i64)
        .bind(meta.collected_rows as i64)
        .bind(meta.final_rows as i64)
        .execute(self.pool.pool().as_ref())
        .await?;
        Ok(())
    }

    pub async fn get(&self, query_id: QueryId) -> Result<UserQueryMeta> {
        let row: Option<QInfoRow> = sqlx::query_as(
            "SELECT query_id, czar_id, sql, default_db, result_loc, result_table, \
             message_table, status, submitted, completed, chunk_count, collected_bytes, \
             collected_rows, final_rows FROM q_info WHERE query_id = $1",
        )
        .bind(query_id.get() as i64)
        .fetch_optional(self.pool.pool().as_ref())
        .await?;
        let row = row.ok_or_else(|| {
            error::NoSuchQuerySnafu {
                query_id: query_id.get() as i64,
            }
            .build()
        })?;
        let messages = self.messages(query_id).await?;
        Ok(UserQueryMeta {
            query_id,
            czar_id: CzarId::new(row.czar_id as u64),
            sql: row.sql,
            default_db: row.default_db,
            result_loc: row.result_loc,
            result_table: row.result_table,
            message_table: row.message_table,
            status: status_from_str(&row.status),
            submitted_at_ms: row.submitted,
            completed_at_ms: row.completed,
            chunk_count: row.chunk_count as u32,
            collected_bytes: row.collected_bytes as u64,
            collected_rows: row.collected_rows as u64,
            final_rows: row.final_rows as u64,
            messages,
        })
    }

    pub async fn update_status(
        &self,
        query_id: QueryId,
        status: QueryStatus,
        completed_at_ms: Option<i64>,
    ) -> Result<()> {
        sqlx::query("UPDATE q_info SET status = $2, completed = $3 WHERE query_id = $1")
            .bind(query_id.get() as i64)
            .bind(status_to_str(status))
            .bind(completed_at_ms)
            .execute(self.pool.pool().as_ref())
            .await?;
        Ok(())
    }

    pub async fn update_counters(
        &self,
        query_id: QueryId,
        collected_bytes: u64,
        collected_rows: u64,
        final_rows: u64,
    ) -> Result<()> {
        sqlx::query(
            "UPDATE q_info SET collected_bytes = $2, collected_rows = $3, final_rows = $4 \
             WHERE query_id = $1",
        )
        .bind(query_id.get() as i64)
        .bind(collected_bytes as i64)
        .bind(collected_rows as i64)
        .bind(final_rows as i64)
        .execute(self.pool.pool().as_ref())
        .await?;
        Ok(())
    }

    pub async fn add_message(&self, query_id: QueryId, message: &QueryMessage) -> Result<()> {
        let severity = match message.severity {
            MessageSeverity::Info => "INFO",
            MessageSeverity::Warning => "WARNING",
            MessageSeverity::Error => "ERROR",
        };
        sqlx::query(
            "INSERT INTO q_messages (query_id, chunk_id, severity, code, message, timestamp) \
             VALUES ($1,$2,$3,$4,$5,$6)",
        )
        .bind(query_id.get() as i64)
        .bind(message.chunk_id.map(|c| c.get() as i64))
        .bind(severity)
        .bind(message.code)
        .bind(&message.message)
        .bind(message.timestamp_ms)
        .execute(self.pool.pool().as_ref())
        .await?;
        Ok(())
    }

    async fn messages(&self, query_id: QueryId) -> Result<Vec<QueryMessage>> {
        #[derive(FromRow)]
        struct Row {
            chunk_id: Option<i64>,
            severity: String,
            code: i32,
            message: String,
            timestamp: i64,
        }
        let rows: Vec<Row> = sqlx::query_as(
            "SELECT chunk_id, severity, code, message, timestamp FROM q_messages \
             WHERE query_id = $1 ORDER BY timestamp",
        )
        .bind(query_id.get() as i64)
        .fetch_all(self.pool.pool().as_ref())
        .await?;
        Ok(rows
            .into_iter()
            .map(|r| QueryMessage {
                chunk_id: r.chunk_id.map(|c| qmeta_types::ChunkId::new(c as i32)),
                severity: match r.severity.as_str() {
                    "WARNING" => MessageSeverity::Warning,
                    "ERROR" => MessageSeverity::Error,
                    _ => MessageSeverity::Info,
                },
                code: r.code,
                message: r.message,
                timestamp_ms: r.timestamp,
            })
            .collect())
    }

    pub async fn update_progress(
        &self,
        query_id: QueryId,
        total_chunks: u32,
        completed_chunks: u32,
        now_ms: i64,
    ) -> Result<()> {
        sqlx::query(
            "INSERT INTO q_progress (query_id, total_chunks, completed_chunks, query_begin, \
             last_update) VALUES ($1,$2,$3,$4,$4) ON CONFLICT (query_id) DO UPDATE SET \
             completed_chunks = $3, last_update = $4",
        )
        .bind(query_id.get() as i64)
        .bind(total_chunks as i32)
        .bind(completed_chunks as i32)
        .bind(now_ms)
        .execute(self.pool.pool().as_ref())
        .await?;
        Ok(())
    }
}
