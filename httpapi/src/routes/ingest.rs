//! `/ingest/...` handlers: transaction lifecycle (C9) and secondary-index
//! build (C8's `DirectorIndexJob`), per §4.10.

use std::collections::HashMap;

use hyper::{Body, Response};
use qmeta_types::{Transaction, TransactionId, TransactionState};
use replica_control::jobs::DirectorIndexJob;
use serde::{Deserialize, Serialize};

use crate::body::{json_ok, parse_json};
use crate::error::{BadRequestSnafu, Result};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
struct BeginTransactionRequest {
    database: String,
    context: Option<String>,
}

pub async fn begin_transaction(state: &AppState, body: Body) -> Result<Response<Body>> {
    let req: BeginTransactionRequest = parse_json(body).await?;
    let txn: Transaction = state
        .transactions
        .begin_transaction(&req.database, req.context.as_deref())
        .await?;
    Ok(json_ok(&txn))
}

#[derive(Debug, Deserialize)]
struct UpdateTransactionRequest {
    state: TransactionState,
}

pub async fn update_transaction(state: &AppState, id: &str, body: Body) -> Result<Response<Body>> {
    let id: u32 = id.parse().map_err(|_| {
        BadRequestSnafu {
            detail: format!("invalid transaction id {id:?}"),
        }
        .build()
    })?;
    let req: UpdateTransactionRequest = parse_json(body).await?;
    let txn = state
        .transactions
        .update_transaction(TransactionId::new(id), req.state)
        .await?;
    Ok(json_ok(&txn))
}

#[derive(Debug, Deserialize)]
struct BuildSecondaryIndexRequest {
    database: String,
    director_table: String,
    #[serde(default)]
    rebuild: bool,
    /// Required, per the decision to never guess this field's default
    /// (DESIGN.md's open-question log).
    unique_primary_key: bool,
}

#[derive(Debug, Serialize)]
struct JobResult {
    state: String,
    per_worker: HashMap<String, String>,
    detail: String,
}

pub async fn build_secondary_index(state: &AppState, body: Body) -> Result<Response<Body>> {
    let req: BuildSecondaryIndexRequest = parse_json(body).await?;
    let database = state.config.get_database(&req.database).await?;
    let director_table_key = database.director_table_key.clone().ok_or_else(|| {
        BadRequestSnafu {
            detail: format!("database {} has no director table key", req.database),
        }
        .build()
    })?;
    let chunk_workers = state.controller.replicas().chunks_for_database(&req.database);

    let job = DirectorIndexJob {
        database: req.database,
        director_table: req.director_table,
        director_table_key,
        rebuild: req.rebuild,
        unique_primary_key: req.unique_primary_key,
        chunk_workers,
    };
    let report = state.controller.run_job(&job).await?;
    Ok(json_ok(&JobResult {
        state: format!("{:?}", report.state),
        per_worker: report
            .per_worker
            .into_iter()
            .map(|(w, s)| (w.to_string(), format!("{s:?}")))
            .collect(),
        detail: report.detail,
    }))
}
