//! A [`qdisp::WorkerChannel`] backed by this crate's JSON-over-`hyper`
//! transport: query dispatch speaks a much smaller envelope than the
//! control-plane one in [`crate::envelope`] (just "run this UberJob",
//! "cancel this UberJob"), so it gets its own pair of wire structs rather
//! than overloading [`crate::envelope::WorkerRequestBody`].

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use hyper::{Body, Client, Method, Request};
use observability_deps::tracing::warn;
use qdisp::{UberJobResult, WorkerChannel};
use qmeta_types::{UberJob, UberJobId, WorkerName};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

#[derive(Debug, Serialize)]
struct RunUberJob<'a> {
    uber_job_id: UberJobId,
    job_ids: &'a [qmeta_types::JobId],
    attempt: u32,
}

#[derive(Debug, Deserialize)]
struct RunUberJobResult {
    uber_job_id: UberJobId,
    success: bool,
}

/// Posts an UberJob to `http://<worker>/query` and reports the outcome on
/// `results`, converting any transport failure into a `success: false`
/// report so the Executive's retry machinery (not this channel) decides
/// what happens next.
#[derive(Debug, Clone)]
pub struct HttpWorkerChannel {
    client: Client<hyper::client::HttpConnector>,
    timeout: Duration,
}

impl HttpWorkerChannel {
    pub fn new(timeout: Duration) -> Self {
        Self {
            client: Client::new(),
            timeout,
        }
    }

    async fn post(&self, worker: &WorkerName, body: Vec<u8>, path: &str) -> Result<Vec<u8>, String> {
        let uri = format!("http://{worker}{path}");
        let request = Request::builder()
            .method(Method::POST)
            .uri(&uri)
            .header("content-type", "application/json")
            .body(Body::from(body))
            .map_err(|e| e.to_string())?;
        let response = tokio::time::timeout(self.timeout, self.client.request(request))
            .await
            .map_err(|_| format!("timed out waiting for {worker}"))?
            .map_err(|e| e.to_string())?;
        let bytes = hyper::body::to_bytes(response.into_body())
            .await
            .map_err(|e| e.to_string())?;
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl WorkerChannel for HttpWorkerChannel {
    async fn submit(&self, uber_job: UberJob, results: mpsc::UnboundedSender<UberJobResult>) {
        let body = RunUberJob {
            uber_job_id: uber_job.uber_job_id,
            job_ids: &uber_job.job_ids,
            attempt: uber_job.attempt,
        };
        let payload = match serde_json::to_vec(&body) {
            Ok(p) => p,
            Err(e) => {
                warn!(error = %e, "failed to encode uberjob request");
                let _ = results.send(UberJobResult {
                    uber_job_id: uber_job.uber_job_id,
                    success: false,
                });
                return;
            }
        };
        let outcome = match self.post(&uber_job.worker, payload, "/query").await {
            Ok(bytes) => serde_json::from_slice::<RunUberJobResult>(&bytes)
                .map(|r| r.success)
                .unwrap_or(false),
            Err(e) => {
                warn!(worker = %uber_job.worker, error = %e, "uberjob dispatch failed");
                false
            }
        };
        let _ = results.send(UberJobResult {
            uber_job_id: uber_job.uber_job_id,
            success: outcome,
        });
    }

    async fn cancel(&self, uber_job_id: UberJobId, worker: WorkerName) {
        let payload = serde_json::to_vec(&uber_job_id).unwrap_or_default();
        if let Err(e) = self.post(&worker, payload, "/cancel").await {
            warn!(%worker, %uber_job_id, error = %e, "cancel rpc failed");
        }
    }
}

/// Shared by tests across this crate and `replica_control`: records every
/// submitted UberJob and immediately reports the canned outcome.
#[derive(Debug, Default)]
pub struct InMemoryWorkerChannel {
    pub outcome: std::sync::atomic::AtomicBool,
}

impl InMemoryWorkerChannel {
    pub fn always(success: bool) -> Arc<Self> {
        Arc::new(Self {
            outcome: std::sync::atomic::AtomicBool::new(success),
        })
    }
}

#[async_trait]
impl WorkerChannel for InMemoryWorkerChannel {
    async fn submit(&self, uber_job: UberJob, results: mpsc::UnboundedSender<UberJobResult>) {
        let success = self.outcome.load(std::sync::atomic::Ordering::Relaxed);
        let _ = results.send(UberJobResult {
            uber_job_id: uber_job.uber_job_id,
            success,
        });
    }

    async fn cancel(&self, _uber_job_id: UberJobId, _worker: WorkerName) {}
}
