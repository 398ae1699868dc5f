//! The `transaction` and contribution tables backing [`trans`](../trans).

use qmeta_types::{Contribution, ContributionId, Transaction, TransactionId, TransactionState};
use sqlx::FromRow;
use sqlx_hotswap_pool::HotSwapPool;

use crate::error::{self, Result};

#[derive(Debug)]
pub struct TransactionRepo<'a> {
    pool: &'a HotSwapPool,
}

#[derive(FromRow)]
struct TransactionRow {
    id: i32,
    database: String,
    state: String,
    begin_time: i64,
    start_time: Option<i64>,
    transition_time: Option<i64>,
    end_time: Option<i64>,
    context: Option<String>,
}

fn state_to_str(s: TransactionState) -> &'static str {
    match s {
        TransactionState::IsStarting => "IS_STARTING",
        TransactionState::Started => "STARTED",
        TransactionState::IsFinishing => "IS_FINISHING",
        TransactionState::IsAborting => "IS_ABORTING",
        TransactionState::Finished => "FINISHED",
        TransactionState::Aborted => "ABORTED",
        TransactionState::StartFailed => "START_FAILED",
        TransactionState::FinishFailed => "FINISH_FAILED",
        TransactionState::AbortFailed => "ABORT_FAILED",
    }
}

fn state_from_str(s: &str) -> TransactionState {
    match s {
        "STARTED" => TransactionState::Started,
        "IS_FINISHING" => TransactionState::IsFinishing,
        "IS_ABORTING" => TransactionState::IsAborting,
        "FINISHED" => TransactionState::Finished,
        "ABORTED" => TransactionState::Aborted,
        "START_FAILED" => TransactionState::StartFailed,
        "FINISH_FAILED" => TransactionState::FinishFailed,
        "ABORT_FAILED" => TransactionState::AbortFailed,
        _ => TransactionState::IsStarting,
    }
}

impl From<TransactionRow> for Transaction {
    fn from(r: TransactionRow) -> Self {
        Self {
            id: TransactionId::new(r.id as u32),
            database: r.database,
            state: state_from_str(&r.state),
            begin_time_ms: r.begin_time,
            start_time_ms: r.start_time,
            transition_time_ms: r.transition_time,
            end_time_ms: r.end_time,
            context: r.context,
        }
    }
}

impl<'a> TransactionRepo<'a> {
    pub(crate) fn new(pool: &'a HotSwapPool) -> Self {
        Self { pool }
    }

    /// Caller must already hold the `"database:<db>"` named mutex; this
    /// only performs the insert-and-check-uniqueness step.
    pub async fn begin(&self, database: &str, context: Option<&str>, now_ms: i64) -> Result<Transaction> {
        let existing: Option<(i64,)> = sqlx::query_as(
            "SELECT id FROM transaction WHERE database = $1 AND state = 'IS_STARTING'",
        )
        .bind(database)
        .fetch_optional(self.pool.pool().as_ref())
        .await?;
        if existing.is_some() {
            return error::ConflictSnafu {
                detail: format!("database {database} already has a transaction IS_STARTING"),
            }
            .fail();
        }

        let row: (i32,) = sqlx::query_as(
            "INSERT INTO transaction (database, state, begin_time, context) \
             VALUES ($1, 'IS_STARTING', $2, $3) RETURNING id",
        )
        .bind(database)
        .bind(now_ms)
        .bind(context)
        .fetch_one(self.pool.pool().as_ref())
        .await?;

        Ok(Transaction {
            id: TransactionId::new(row.0 as u32),
            database: database.to_string(),
            state: TransactionState::IsStarting,
            begin_time_ms: now_ms,
            start_time_ms: None,
            transition_time_ms: None,
            end_time_ms: None,
            context: context.map(str::to_string),
        })
    }

    pub async fn update_state(
        &self,
        id: TransactionId,
        state: TransactionState,
        now_ms: i64,
    ) -> Result<()> {
        let time_col = match state {
            TransactionState::Started => "start_time",
            TransactionState::IsFinishing | TransactionState::IsAborting => "transition_time",
            TransactionState::Finished
            | TransactionState::Aborted
            | TransactionState::StartFailed
            | TransactionState::FinishFailed
            | TransactionState::AbortFailed => "end_time",
            TransactionState::IsStarting => "begin_time",
        };
        let sql = format!("UPDATE transaction SET state = $2, {time_col} = $3 WHERE id = $1");
        let result = sqlx::query(&sql)
            .bind(id.get() as i32)
            .bind(state_to_str(state))
            .bind(now_ms)
            .execute(self.pool.pool().as_ref())
            .await?;
        if result.rows_affected() == 0 {
            return error::NoSuchTransactionSnafu { id: id.get() as i64 }.fail();
        }
        Ok(())
    }

    pub async fn get(&self, id: TransactionId) -> Result<Transaction> {
        let row: Option<TransactionRow> = sqlx::query_as(
            "SELECT id, database, state, begin_time, start_time, transition_time, end_time, \
             context FROM transaction WHERE id = $1",
        )
        .bind(id.get() as i32)
        .fetch_optional(self.pool.pool().as_ref())
        .await?;
        row.map(Into::into)
            .ok_or_else(|| error::NoSuchTransactionSnafu { id: id.get() as i64 }.build())
    }

    pub async fn list(&self, database: Option<&str>) -> Result<Vec<Transaction>> {
        let rows: Vec<TransactionRow> = sqlx::query_as(
            "SELECT id, database, state, begin_time, start_time, transition_time, end_time, \
             context FROM transaction WHERE $1::text IS NULL OR database = $1 ORDER BY id",
        )
        .bind(database)
        .fetch_all(self.pool.pool().as_ref())
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Whether any non-terminal transaction exists for `database`, the
    /// gate on un-publishing it.
    pub async fn has_active(&self, database: &str) -> Result<bool> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM transaction WHERE database = $1 \
             AND state NOT IN ('FINISHED', 'ABORTED')",
        )
        .bind(database)
        .fetch_one(self.pool.pool().as_ref())
        .await?;
        Ok(count > 0)
    }

    pub async fn add_contribution(&self, contribution: &Contribution) -> Result<()> {
        sqlx::query(
            "INSERT INTO contribution (transaction_id, worker, table_name, chunk_id, \
             contribution_id, rows, success) VALUES ($1,$2,$3,$4,$5,$6,$7)",
        )
        .bind(contribution.transaction_id.get() as i32)
        .bind(&contribution.worker)
        .bind(&contribution.table)
        .bind(contribution.chunk_id)
        .bind(contribution.contribution_id.get() as i64)
        .bind(contribution.rows as i64)
        .bind(contribution.success)
        .execute(self.pool.pool().as_ref())
        .await?;
        Ok(())
    }

    pub async fn contributions(&self, id: TransactionId) -> Result<Vec<Contribution>> {
        #[derive(FromRow)]
        struct Row {
            worker: String,
            table_name: String,
            chunk_id: i32,
            contribution_id: i64,
            rows: i64,
            success: bool,
        }
        let rows: Vec<Row> = sqlx::query_as(
            "SELECT worker, table_name, chunk_id, contribution_id, rows, success \
             FROM contribution WHERE transaction_id = $1 ORDER BY contribution_id",
        )
        .bind(id.get() as i32)
        .fetch_all(self.pool.pool().as_ref())
        .await?;
        Ok(rows
            .into_iter()
            .map(|r| Contribution {
                transaction_id: id,
                worker: r.worker,
                table: r.table_name,
                chunk_id: r.chunk_id,
                contribution_id: ContributionId::new(r.contribution_id as u64),
                rows: r.rows as u64,
                success: r.success,
            })
            .collect())
    }
}
