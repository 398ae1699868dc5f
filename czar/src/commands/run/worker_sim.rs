//! `czar run worker-sim`: a bare-bones HTTP worker that answers
//! [`WorkerRequest`]s directly, so the replication/dispatch stack can be
//! exercised end to end without a real Qserv worker. It keeps every chunk
//! it's ever been told to add (good until told otherwise) and reports
//! itself `Running`.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use hyper::service::{make_service_fn, service_fn};
use hyper::{Body, Method, Request, Response, Server, StatusCode};
use observability_deps::tracing::info;
use parking_lot::Mutex;
use snafu::Snafu;
use trogging::cli::LoggingConfig;
use worker_rpc::{
    ProtocolReplicaInfo, ReplicaStatus, ServiceState, ServiceStatus, WorkerRequest, WorkerRequestBody, WorkerResponse,
    WorkerResponseBody,
};

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("bind_addr {value:?} is not a valid socket address"))]
    InvalidBindAddr { value: String },

    #[snafu(display("http server error: {source}"))]
    Serve { source: hyper::Error },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, clap::Parser)]
pub struct Config {
    /// A label for this stub, logged on every request; has no bearing on
    /// dispatch, since workers are addressed by `bind_addr` over HTTP.
    #[clap(long)]
    name: String,

    #[clap(long, default_value = "127.0.0.1:9100")]
    bind_addr: String,

    #[clap(flatten)]
    pub(crate) logging_config: LoggingConfig,
}

#[derive(Debug, Default)]
struct State {
    chunks: Mutex<Vec<ProtocolReplicaInfo>>,
}

pub async fn command(config: Config) -> Result<()> {
    let addr: SocketAddr = config.bind_addr.parse().map_err(|_| Error::InvalidBindAddr {
        value: config.bind_addr.clone(),
    })?;
    let name = config.name;
    let state = Arc::new(State::default());

    let make_svc = make_service_fn(move |_conn| {
        let state = Arc::clone(&state);
        let name = name.clone();
        async move {
            Ok::<_, Infallible>(service_fn(move |req| {
                let state = Arc::clone(&state);
                let name = name.clone();
                async move { Ok::<_, Infallible>(handle(req, &name, &state).await) }
            }))
        }
    });

    info!(%addr, "starting worker-sim");
    Server::bind(&addr).serve(make_svc).await.map_err(|source| Error::Serve { source })
}

async fn handle(req: Request<Body>, name: &str, state: &State) -> Response<Body> {
    if req.method() != Method::POST || req.uri().path() != "/rpc" {
        return Response::builder()
            .status(StatusCode::NOT_FOUND)
            .body(Body::empty())
            .expect("building a 404 never fails");
    }

    let bytes = match hyper::body::to_bytes(req.into_body()).await {
        Ok(bytes) => bytes,
        Err(_) => return bad_request(),
    };
    let request: WorkerRequest = match serde_json::from_slice(&bytes) {
        Ok(request) => request,
        Err(_) => return bad_request(),
    };

    let response = respond(name, state, &request);
    let bytes = serde_json::to_vec(&response).expect("response always serializes");
    Response::builder()
        .status(StatusCode::OK)
        .header("content-type", "application/json")
        .body(Body::from(bytes))
        .expect("building a 200 response never fails")
}

fn bad_request() -> Response<Body> {
    Response::builder()
        .status(StatusCode::BAD_REQUEST)
        .body(Body::empty())
        .expect("building a 400 never fails")
}

fn respond(name: &str, state: &State, request: &WorkerRequest) -> WorkerResponse {
    let body = match &request.body {
        WorkerRequestBody::ServiceRequest { .. } => WorkerResponseBody::ServiceResponse {
            service: ServiceStatus {
                start_time_ms: 0,
                state: ServiceState::Running,
                new_requests: Vec::new(),
                in_progress: Vec::new(),
                finished: Vec::new(),
            },
        },
        WorkerRequestBody::AddReplica { database, chunk } => {
            let mut chunks = state.chunks.lock();
            chunks.push(ProtocolReplicaInfo {
                status: ReplicaStatus::Complete,
                worker: name.to_string(),
                database: database.clone(),
                chunk: *chunk,
                verify_time: 0,
                file_info_many: Vec::new(),
            });
            WorkerResponseBody::ReplicaInfo {
                replicas: chunks.clone(),
            }
        }
        WorkerRequestBody::RemoveReplica { database, chunk } => {
            let mut chunks = state.chunks.lock();
            chunks.retain(|r| !(r.database == *database && r.chunk == *chunk));
            WorkerResponseBody::ReplicaInfo {
                replicas: chunks.clone(),
            }
        }
        WorkerRequestBody::GetReplicas { database } => {
            let chunks = state.chunks.lock();
            WorkerResponseBody::ReplicaInfo {
                replicas: chunks.iter().filter(|r| r.database == *database).cloned().collect(),
            }
        }
        WorkerRequestBody::SetReplicas { family, good_chunks, .. } => {
            let mut chunks = state.chunks.lock();
            chunks.retain(|r| r.database != *family);
            chunks.extend(good_chunks.iter().map(|chunk| ProtocolReplicaInfo {
                status: ReplicaStatus::Complete,
                worker: name.to_string(),
                database: family.clone(),
                chunk: *chunk,
                verify_time: 0,
                file_info_many: Vec::new(),
            }));
            WorkerResponseBody::ReplicaInfo {
                replicas: chunks.clone(),
            }
        }
        WorkerRequestBody::SqlRequest { .. } => WorkerResponseBody::Error {
            message: "worker-sim does not execute SQL".to_string(),
        },
    };
    WorkerResponse { id: request.id, body }
}
