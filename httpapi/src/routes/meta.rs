//! `GET /meta/version` and `GET /meta/metrics` — ambient (C16), served
//! outside the versioned REST tree the same way the teacher's `ioxd_common`
//! serves `/health` as a common route before per-server dispatch.

use hyper::{Body, Response};
use serde::Serialize;

use crate::body::json_ok;
use crate::state::AppState;
use crate::version::API_VERSION;

#[derive(Debug, Serialize)]
struct VersionInfo {
    kind: &'static str,
    id: &'static str,
    database_schema_version: u32,
    instance_id: &'static str,
}

pub fn version() -> Response<Body> {
    json_ok(&VersionInfo {
        kind: "czar",
        id: env!("CARGO_PKG_VERSION"),
        database_schema_version: API_VERSION,
        instance_id: "czar",
    })
}

pub fn metrics(state: &AppState) -> Response<Body> {
    Response::builder()
        .status(200)
        .header("content-type", "text/plain; version=0.0.4")
        .body(Body::from(state.metrics.render()))
        .expect("building a text response from a byte body never fails")
}
