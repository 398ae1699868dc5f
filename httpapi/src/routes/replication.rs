//! `/replication/...` handlers: thin parse → [`czar_config::ConfigService`]/
//! [`replica_control::Controller`] call → serialize, per §4.10.

use hyper::{Body, Response};
use qmeta_types::{Family, Worker};
use serde::{Deserialize, Serialize};

use crate::body::{json_ok, parse_json};
use crate::error::{BadRequestSnafu, Result};
use crate::state::AppState;

#[derive(Debug, Serialize)]
struct ConfigSnapshot {
    params: Vec<ParamView>,
    workers: Vec<Worker>,
}

#[derive(Debug, Serialize)]
struct ParamView {
    category: String,
    param: String,
    value: String,
    read_only: bool,
}

pub async fn get_config(state: &AppState) -> Result<Response<Body>> {
    let params = state
        .config
        .list_params(None)
        .into_iter()
        .map(|p| ParamView {
            category: p.schema.category,
            param: p.schema.param,
            value: if p.schema.security_context { "***".to_string() } else { p.value },
            read_only: p.schema.read_only,
        })
        .collect();
    let workers = state.config.list_workers().await?;
    Ok(json_ok(&ConfigSnapshot { params, workers }))
}

#[derive(Debug, Deserialize)]
struct SetParamRequest {
    category: String,
    parameter: String,
    value: String,
}

pub async fn set_general(state: &AppState, body: Body) -> Result<Response<Body>> {
    let req: SetParamRequest = parse_json(body).await?;
    state.config.set_param(&req.category, &req.parameter, &req.value).await?;
    Ok(json_ok(&serde_json::json!({"ok": true})))
}

/// Minimal worker registration: the service topology (`svc`/`fs`/`db`/
/// loader/exporter/http_loader endpoints, `data_dir`) is left at its
/// zero value and filled in by a follow-up config PATCH — `ConfigService`
/// already exposes `update_worker` for that, matching how the spec's own
/// endpoint list only names `{worker,is-enabled,is-read-only}` and treats
/// the rest of the surface as non-exhaustive.
#[derive(Debug, Deserialize)]
struct AddWorkerRequest {
    worker: String,
    #[serde(rename = "is-enabled", default = "default_true")]
    is_enabled: bool,
    #[serde(rename = "is-read-only", default)]
    is_read_only: bool,
}

fn default_true() -> bool {
    true
}

pub async fn add_worker(state: &AppState, body: Body) -> Result<Response<Body>> {
    let req: AddWorkerRequest = parse_json(body).await?;
    let zero_endpoint = qmeta_types::Endpoint {
        host: String::new(),
        port: 0,
    };
    let zero_db_endpoint = qmeta_types::DbEndpoint {
        host: String::new(),
        port: 0,
        user: String::new(),
    };
    let zero_staging = qmeta_types::StagingEndpoint {
        host: String::new(),
        port: 0,
        tmp_dir: String::new(),
    };
    let worker = Worker {
        name: req.worker.as_str().into(),
        is_enabled: req.is_enabled,
        is_read_only: req.is_read_only,
        svc: zero_endpoint.clone(),
        fs: zero_endpoint,
        db: zero_db_endpoint,
        loader: zero_staging.clone(),
        exporter: zero_staging.clone(),
        http_loader: zero_staging,
        data_dir: String::new(),
    };
    state.config.add_worker(worker).await?;
    Ok(json_ok(&serde_json::json!({"ok": true})))
}

pub async fn delete_worker(state: &AppState, worker: &str) -> Result<Response<Body>> {
    state.config.delete_worker(worker).await?;
    Ok(json_ok(&serde_json::json!({"ok": true})))
}

pub async fn add_family(state: &AppState, body: Body) -> Result<Response<Body>> {
    let family: Family = parse_json(body).await?;
    if family.replication_level == 0 || family.num_stripes == 0 || family.num_sub_stripes == 0 || family.overlap <= 0.0 {
        return Err(BadRequestSnafu {
            detail: "replication_level, num_stripes, num_sub_stripes and overlap must all be strictly positive".to_string(),
        }
        .build());
    }
    state.config.add_family(family).await?;
    Ok(json_ok(&serde_json::json!({"ok": true})))
}

#[derive(Debug, Deserialize)]
struct PublishRequest {
    publish: u8,
}

pub async fn set_database_published(state: &AppState, database: &str, body: Body) -> Result<Response<Body>> {
    let req: PublishRequest = parse_json(body).await?;
    state.controller.set_published(database, req.publish != 0).await?;
    Ok(json_ok(&serde_json::json!({"ok": true})))
}
