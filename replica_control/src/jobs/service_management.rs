//! `ServiceManagement`: one control RPC (`STATUS`/`SUSPEND`/`RESUME`/
//! `REQUESTS`/`DRAIN`) per worker. Success iff every worker acks.

use async_trait::async_trait;
use hashbrown::HashMap;
use observability_deps::tracing::warn;
use qmeta_types::WorkerName;
use worker_rpc::{ServiceOperation, WorkerRequest, WorkerRequestBody, WorkerResponseBody, WorkerTransport};

use crate::job::{Job, JobReport};
use crate::request::RequestState;

#[derive(Debug, Clone)]
pub struct ServiceManagementJob {
    pub operation: ServiceOperation,
    pub workers: Vec<WorkerName>,
}

#[async_trait]
impl Job for ServiceManagementJob {
    fn kind(&self) -> &'static str {
        "ServiceManagement"
    }

    async fn run(&self, transport: &dyn WorkerTransport) -> JobReport {
        let mut per_worker = HashMap::new();
        for (i, worker) in self.workers.iter().enumerate() {
            let request = WorkerRequest {
                id: i as u64,
                body: WorkerRequestBody::ServiceRequest {
                    operation: self.operation,
                },
            };
            let state = match transport.send(worker.as_str(), request).await {
                Ok(response) if matches!(response.body, WorkerResponseBody::ServiceResponse { .. }) => {
                    RequestState::Finished
                }
                Ok(_) => RequestState::Failed,
                Err(e) => {
                    warn!(%worker, error = %e, "service management rpc failed");
                    RequestState::Failed
                }
            };
            per_worker.insert(worker.clone(), state);
        }
        if JobReport::all_acked(&per_worker) {
            JobReport::success(per_worker, format!("{:?} acked by all workers", self.operation))
        } else {
            JobReport::failure(per_worker, format!("{:?} not acked by every worker", self.operation))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use worker_rpc::{InMemoryTransport, ServiceState, ServiceStatus, WorkerResponse};

    fn ack(id: u64) -> WorkerResponse {
        WorkerResponse {
            id,
            body: WorkerResponseBody::ServiceResponse {
                service: ServiceStatus {
                    start_time_ms: 0,
                    state: ServiceState::Running,
                    new_requests: Vec::new(),
                    in_progress: Vec::new(),
                    finished: Vec::new(),
                },
            },
        }
    }

    #[tokio::test]
    async fn succeeds_only_when_every_worker_acks() {
        let transport = InMemoryTransport::new();
        transport.set_response("worker01", ack(0)).await;
        let job = ServiceManagementJob {
            operation: ServiceOperation::Drain,
            workers: vec![WorkerName::from("worker01"), WorkerName::from("worker02")],
        };
        let report = job.run(&transport).await;
        assert_eq!(report.state, crate::job::JobState::FinishedFailure);
    }
}
