//! The controller event log (§C11): an append-only record of requests and
//! jobs the replication controller has handled, used for operator audit
//! and `GET /replication/events`.

use sqlx::FromRow;
use sqlx_hotswap_pool::HotSwapPool;

use crate::error::Result;

#[derive(Debug)]
pub struct EventRepo<'a> {
    pool: &'a HotSwapPool,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct ControllerEvent {
    pub id: i64,
    pub timestamp_ms: i64,
    pub kind: String,
    pub detail: String,
}

impl<'a> EventRepo<'a> {
    pub(crate) fn new(pool: &'a HotSwapPool) -> Self {
        Self { pool }
    }

    pub async fn record(&self, timestamp_ms: i64, kind: &str, detail: &str) -> Result<()> {
        sqlx::query(
            "INSERT INTO controller_event (timestamp_ms, kind, detail) VALUES ($1, $2, $3)",
        )
        .bind(timestamp_ms)
        .bind(kind)
        .bind(detail)
        .execute(self.pool.pool().as_ref())
        .await?;
        Ok(())
    }

    pub async fn recent(&self, limit: i64) -> Result<Vec<ControllerEvent>> {
        let rows = sqlx::query_as(
            "SELECT id, timestamp_ms, kind, detail FROM controller_event \
             ORDER BY id DESC LIMIT $1",
        )
        .bind(limit)
        .fetch_all(self.pool.pool().as_ref())
        .await?;
        Ok(rows)
    }
}
