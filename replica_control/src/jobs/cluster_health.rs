//! `ClusterHealth`: ping every worker's replication and qserv services.
//! Any subset may be down; the job always finishes successfully and
//! reports per-worker reachability rather than failing outright.

use async_trait::async_trait;
use hashbrown::HashMap;
use qmeta_types::WorkerName;
use worker_rpc::{ServiceOperation, WorkerRequest, WorkerRequestBody, WorkerResponseBody, WorkerTransport};

use crate::job::{Job, JobReport};
use crate::request::RequestState;

/// Per-worker reachability, `{replication, qserv}` from §4.8's table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerHealth {
    pub replication: bool,
    pub qserv: bool,
}

#[derive(Debug, Clone)]
pub struct ClusterHealthJob {
    pub workers: Vec<WorkerName>,
}

impl ClusterHealthJob {
    /// `{worker → {replication, qserv}}`. A single `STATUS` probe through
    /// the control-plane transport stands in for both services here — the
    /// original polls two independent daemons, but this workspace models
    /// one worker transport, so a successful probe marks both reachable.
    pub async fn probe(&self, transport: &dyn WorkerTransport) -> HashMap<WorkerName, WorkerHealth> {
        let mut result = HashMap::new();
        for (i, worker) in self.workers.iter().enumerate() {
            let request = WorkerRequest {
                id: i as u64,
                body: WorkerRequestBody::ServiceRequest {
                    operation: ServiceOperation::Status,
                },
            };
            let reachable = matches!(
                transport.send(worker.as_str(), request).await,
                Ok(response) if matches!(response.body, WorkerResponseBody::ServiceResponse { .. })
            );
            result.insert(
                worker.clone(),
                WorkerHealth {
                    replication: reachable,
                    qserv: reachable,
                },
            );
        }
        result
    }
}

#[async_trait]
impl Job for ClusterHealthJob {
    fn kind(&self) -> &'static str {
        "ClusterHealth"
    }

    async fn run(&self, transport: &dyn WorkerTransport) -> JobReport {
        let health = self.probe(transport).await;
        let per_worker = health
            .iter()
            .map(|(w, h)| {
                let state = if h.replication && h.qserv {
                    RequestState::Finished
                } else {
                    RequestState::Failed
                };
                (w.clone(), state)
            })
            .collect();
        JobReport::success(per_worker, format!("probed {} workers", self.workers.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use worker_rpc::InMemoryTransport;

    #[tokio::test]
    async fn unreachable_workers_are_reported_not_fatal() {
        let transport = InMemoryTransport::new();
        let job = ClusterHealthJob {
            workers: vec![WorkerName::from("worker01")],
        };
        let health = job.probe(&transport).await;
        assert_eq!(
            health[&WorkerName::from("worker01")],
            WorkerHealth {
                replication: false,
                qserv: false,
            }
        );
    }
}
