//! Sends a [`WorkerRequest`] to a worker's control endpoint and returns its
//! [`WorkerResponse`]. `replica_control`'s jobs own retry/aggregation
//! policy; this seam owns wire encoding and the transport-level timeout
//! only, per §4.8.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use hyper::{Body, Client, Method, Request};
use observability_deps::tracing::warn;

use crate::envelope::{WorkerRequest, WorkerResponse};
use crate::error::{MalformedSnafu, Result, TimeoutSnafu, UnreachableSnafu};

#[async_trait]
pub trait WorkerTransport: std::fmt::Debug + Send + Sync {
    async fn send(&self, worker: &str, request: WorkerRequest) -> Result<WorkerResponse>;
}

/// Posts the JSON-encoded envelope to `http://<worker>/rpc`, per §6.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client<hyper::client::HttpConnector>,
    timeout: Duration,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Self {
        Self {
            client: Client::new(),
            timeout,
        }
    }
}

#[async_trait]
impl WorkerTransport for HttpTransport {
    async fn send(&self, worker: &str, request: WorkerRequest) -> Result<WorkerResponse> {
        let body = serde_json::to_vec(&request).map_err(|e| {
            MalformedSnafu {
                worker: worker.to_string(),
                detail: e.to_string(),
            }
            .build()
        })?;
        let uri = format!("http://{worker}/rpc");
        let http_request = Request::builder()
            .method(Method::POST)
            .uri(&uri)
            .header("content-type", "application/json")
            .body(Body::from(body))
            .map_err(|e| {
                UnreachableSnafu {
                    worker: worker.to_string(),
                    detail: e.to_string(),
                }
                .build()
            })?;

        let response = tokio::time::timeout(self.timeout, self.client.request(http_request))
            .await
            .map_err(|_| {
                TimeoutSnafu {
                    worker: worker.to_string(),
                    timeout_ms: self.timeout.as_millis() as u64,
                }
                .build()
            })?
            .map_err(|e| {
                warn!(%worker, error = %e, "worker rpc failed");
                UnreachableSnafu {
                    worker: worker.to_string(),
                    detail: e.to_string(),
                }
                .build()
            })?;

        let bytes = hyper::body::to_bytes(response.into_body())
            .await
            .map_err(|e| {
                MalformedSnafu {
                    worker: worker.to_string(),
                    detail: e.to_string(),
                }
                .build()
            })?;
        decode(worker, &bytes)
    }
}

fn decode(worker: &str, bytes: &Bytes) -> Result<WorkerResponse> {
    serde_json::from_slice(bytes).map_err(|e| {
        MalformedSnafu {
            worker: worker.to_string(),
            detail: e.to_string(),
        }
        .build()
    })
}

/// An in-memory stand-in for [`HttpTransport`], keyed by worker name, so
/// `replica_control`'s own tests (and this crate's) never open a socket.
#[derive(Debug, Default)]
pub struct InMemoryTransport {
    pub responses: tokio::sync::Mutex<hashbrown::HashMap<String, WorkerResponse>>,
}

impl InMemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_response(&self, worker: impl Into<String>, response: WorkerResponse) {
        self.responses.lock().await.insert(worker.into(), response);
    }
}

#[async_trait]
impl WorkerTransport for InMemoryTransport {
    async fn send(&self, worker: &str, request: WorkerRequest) -> Result<WorkerResponse> {
        let responses = self.responses.lock().await;
        responses
            .get(worker)
            .cloned()
            .map(|mut r| {
                r.id = request.id;
                r
            })
            .ok_or_else(|| {
                UnreachableSnafu {
                    worker: worker.to_string(),
                    detail: "no canned response".to_string(),
                }
                .build()
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::{ServiceOperation, WorkerRequestBody, WorkerResponseBody};

    #[tokio::test]
    async fn in_memory_transport_echoes_the_request_id() {
        let transport = InMemoryTransport::default();
        transport.responses.lock().await.insert(
            "worker01".to_string(),
            WorkerResponse {
                id: 0,
                body: WorkerResponseBody::ServiceResponse {
                    service: crate::envelope::ServiceStatus {
                        start_time_ms: 0,
                        state: crate::envelope::ServiceState::Running,
                        new_requests: Vec::new(),
                        in_progress: Vec::new(),
                        finished: Vec::new(),
                    },
                },
            },
        );
        let request = WorkerRequest {
            id: 42,
            body: WorkerRequestBody::ServiceRequest {
                operation: ServiceOperation::Status,
            },
        };
        let response = transport.send("worker01", request).await.unwrap();
        assert_eq!(response.id, 42);
    }
}
