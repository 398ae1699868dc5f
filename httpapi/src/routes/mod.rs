//! Hand-rolled method+path routing, per §4.10's note that an embedded HTTP
//! framework is the externally-supplied collaborator this crate stands in
//! for — not "any HTTP I/O at all".

mod ingest;
mod meta;
mod replication;

use hyper::{Body, Method, Request, Response};

use crate::auth::check as check_auth;
use crate::body::json_error;
use crate::error::{Error, NotFoundSnafu};
use crate::state::{AppState, AuthType};
use crate::version;

/// Routes not served through [`dispatch`] — no version/auth gating, since
/// they exist to let an operator probe a czar that might be misconfigured
/// in exactly the way the gated routes would reject.
fn common_route(req: &Request<Body>) -> Option<Response<Body>> {
    match (req.method(), req.uri().path()) {
        (&Method::GET, "/meta/version") => Some(meta::version()),
        _ => None,
    }
}

/// The entry point a `hyper::service::service_fn` calls per request.
pub async fn dispatch(req: Request<Body>, state: AppState) -> Response<Body> {
    if let Some(resp) = common_route(&req) {
        return resp;
    }
    match route(req, &state).await {
        Ok(resp) => resp,
        Err(err) => json_error(&err),
    }
}

async fn route(req: Request<Body>, state: &AppState) -> Result<Response<Body>, Error> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    version::check(&req)?;

    match (&method, segments.as_slice()) {
        (&Method::GET, &["meta", "metrics"]) => {
            check_auth(&req, state.auth_token.as_deref(), AuthType::None)?;
            Ok(meta::metrics(state))
        }
        (&Method::GET, &["replication", "config"]) => {
            check_auth(&req, state.auth_token.as_deref(), AuthType::None)?;
            replication::get_config(state).await
        }
        (&Method::PUT, &["replication", "config", "general"]) => {
            check_auth(&req, state.auth_token.as_deref(), AuthType::Required)?;
            replication::set_general(state, req.into_body()).await
        }
        (&Method::POST, &["replication", "config", "worker"]) => {
            check_auth(&req, state.auth_token.as_deref(), AuthType::Required)?;
            replication::add_worker(state, req.into_body()).await
        }
        (&Method::DELETE, &["replication", "config", "worker", worker]) => {
            check_auth(&req, state.auth_token.as_deref(), AuthType::Required)?;
            replication::delete_worker(state, worker).await
        }
        (&Method::POST, &["replication", "config", "family"]) => {
            check_auth(&req, state.auth_token.as_deref(), AuthType::Required)?;
            replication::add_family(state, req.into_body()).await
        }
        (&Method::PUT, &["replication", "config", "database", database]) => {
            check_auth(&req, state.auth_token.as_deref(), AuthType::Required)?;
            replication::set_database_published(state, database, req.into_body()).await
        }
        (&Method::POST, &["ingest", "trans"]) => {
            check_auth(&req, state.auth_token.as_deref(), AuthType::Required)?;
            ingest::begin_transaction(state, req.into_body()).await
        }
        (&Method::PUT, &["ingest", "trans", id]) => {
            check_auth(&req, state.auth_token.as_deref(), AuthType::Required)?;
            ingest::update_transaction(state, id, req.into_body()).await
        }
        (&Method::POST, &["ingest", "index", "secondary"]) => {
            check_auth(&req, state.auth_token.as_deref(), AuthType::Required)?;
            ingest::build_secondary_index(state, req.into_body()).await
        }
        _ => NotFoundSnafu {
            method: method.to_string(),
            path,
        }
        .fail(),
    }
}
