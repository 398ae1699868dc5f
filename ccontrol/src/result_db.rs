//! SQL text generation for the per-query result/message tables, and the
//! transport seam that runs it against the proxy-facing result database.
//!
//! That database stays MySQL-family in a real deployment (the proxy reads
//! result rows straight off it), so this crate never reaches for `sqlx`
//! here the way [`metastore`] does for the Postgres-backed catalog — it
//! only ever produces SQL strings and hands them to whatever transport the
//! caller wires up.

use async_trait::async_trait;
use query_ir::ValueExpr;

use crate::error::{Result, ResultDbSnafu};

/// Runs one statement against the result database. Production code backs
/// this with a real MySQL client; tests use an in-memory recorder.
#[async_trait]
pub trait ResultDbExecutor: std::fmt::Debug + Send + Sync {
    async fn execute(&self, sql: &str) -> std::result::Result<(), String>;
}

pub(crate) async fn run(executor: &dyn ResultDbExecutor, sql: String) -> Result<()> {
    executor
        .execute(&sql)
        .await
        .map_err(|detail| ResultDbSnafu { sql, detail }.build())
}

/// `CREATE TABLE IF NOT EXISTS result_<queryId> (...)`. Column list is
/// left to the worker result format the merger already agrees on; this
/// crate only needs the table to exist before chunks start landing rows.
pub fn create_result_table_sql(result_table: &str) -> String {
    format!("CREATE TABLE IF NOT EXISTS {result_table} (dummy INT)")
}

/// `CREATE TABLE IF NOT EXISTS message_<queryId> (...) ENGINE=MEMORY`.
pub fn create_message_table_sql(message_table: &str) -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS {message_table} \
         (chunkId INT, code SMALLINT, message VARCHAR(1024), \
         severity ENUM('INFO','ERROR'), timeStamp BIGINT UNSIGNED) ENGINE=MEMORY"
    )
}

pub fn lock_message_table_sql(message_table: &str) -> String {
    format!("LOCK TABLES {message_table} WRITE")
}

pub fn unlock_tables_sql() -> String {
    "UNLOCK TABLES".to_string()
}

/// The proxy-visible string produced by `getResultQuery()`:
/// `SELECT <merge-projection> FROM <result table> [ORDER BY …] [LIMIT …]`.
/// `ORDER BY` is applied here, never pushed to the workers, because
/// chunk fan-out does not preserve ordering.
pub fn result_query(
    result_table: &str,
    merge_select_list: &[ValueExpr],
    order_by: &[ValueExpr],
    limit: Option<u64>,
) -> String {
    let mut qt = query_ir::QueryTemplate::new();
    qt.push_literal("SELECT");
    if merge_select_list.is_empty() {
        qt.push_literal("*");
    } else {
        for (i, expr) in merge_select_list.iter().enumerate() {
            if i > 0 {
                qt.push_literal(",");
            }
            expr.render_to(&mut qt);
        }
    }
    qt.push_literal("FROM").push_literal(result_table);
    if !order_by.is_empty() {
        qt.push_literal("ORDER BY");
        for (i, expr) in order_by.iter().enumerate() {
            if i > 0 {
                qt.push_literal(",");
            }
            expr.render_to(&mut qt);
        }
    }
    if let Some(limit) = limit {
        qt.push_literal("LIMIT").push_literal(limit.to_string());
    }
    qt.render_plain()
}

#[cfg(test)]
mod tests {
    use super::*;
    use query_ir::ColumnRef;

    #[test]
    fn star_projection_with_no_ordering_or_limit() {
        let sql = result_query("result_7", &[], &[], None);
        assert_eq!(sql, "SELECT * FROM result_7");
    }

    #[test]
    fn merge_projection_with_order_by_and_limit() {
        let merge = vec![ValueExpr::column(ColumnRef::unqualified("objectId"))];
        let order = vec![ValueExpr::column(ColumnRef::unqualified("objectId"))];
        let sql = result_query("result_7", &merge, &order, Some(10));
        assert_eq!(
            sql,
            "SELECT objectId FROM result_7 ORDER BY objectId LIMIT 10"
        );
    }

    #[test]
    fn message_table_lock_and_unlock_statements() {
        assert_eq!(
            lock_message_table_sql("message_7"),
            "LOCK TABLES message_7 WRITE"
        );
        assert_eq!(unlock_tables_sql(), "UNLOCK TABLES");
    }
}
