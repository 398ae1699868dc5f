//! `Replication`: bring a family's chunks back up to `minLevel` by adding,
//! removing, or moving replicas, retrying transport failures with
//! backoff — the one job type in §4.8 that explicitly asks for it, since
//! a replica copy can take much longer to settle than a control RPC.

use std::ops::ControlFlow;

use async_trait::async_trait;
use backoff::{Backoff, BackoffConfig};
use hashbrown::HashMap;
use qmeta_types::{ChunkId, WorkerName};
use worker_rpc::{WorkerRequest, WorkerRequestBody, WorkerResponseBody, WorkerTransport};

use crate::job::{Job, JobReport};
use crate::request::RequestState;

#[derive(Debug, Clone, Copy)]
pub enum ReplicaOp {
    Add,
    Remove,
}

#[derive(Debug, Clone)]
pub struct ReplicationJob {
    pub family: String,
    pub min_level: u32,
    /// One (worker, chunk, op) triple per replica that needs to move.
    pub plan: Vec<(WorkerName, ChunkId, ReplicaOp)>,
    pub backoff: BackoffConfig,
    pub max_attempts: u32,
}

impl ReplicationJob {
    async fn apply_one(&self, transport: &dyn WorkerTransport, worker: &WorkerName, chunk: ChunkId, op: ReplicaOp) -> bool {
        let body = match op {
            ReplicaOp::Add => WorkerRequestBody::AddReplica {
                database: self.family.clone(),
                chunk,
            },
            ReplicaOp::Remove => WorkerRequestBody::RemoveReplica {
                database: self.family.clone(),
                chunk,
            },
        };
        let mut backoff = Backoff::new(&self.backoff);
        let mut attempt = 0u32;
        backoff
            .retry_with_backoff("replicate chunk", || {
                attempt += 1;
                let request = WorkerRequest {
                    id: attempt as u64,
                    body: body.clone(),
                };
                let done = attempt >= self.max_attempts;
                async move {
                    match transport.send(worker.as_str(), request).await {
                        Ok(response) if matches!(response.body, WorkerResponseBody::ReplicaInfo { .. }) => {
                            ControlFlow::Break(true)
                        }
                        _ if done => ControlFlow::Break(false),
                        Err(e) => ControlFlow::Continue(e),
                        Ok(_) => ControlFlow::Continue(worker_rpc::Error::Malformed {
                            worker: worker.to_string(),
                            detail: "unexpected response body".to_string(),
                        }),
                    }
                }
            })
            .await
            .expect("backoff retry is infallible")
    }
}

#[async_trait]
impl Job for ReplicationJob {
    fn kind(&self) -> &'static str {
        "Replication"
    }

    async fn run(&self, transport: &dyn WorkerTransport) -> JobReport {
        let mut per_worker: HashMap<WorkerName, RequestState> = HashMap::new();
        let mut all_ok = true;
        for (worker, chunk, op) in &self.plan {
            let ok = self.apply_one(transport, worker, *chunk, *op).await;
            all_ok &= ok;
            per_worker.insert(
                worker.clone(),
                if ok {
                    RequestState::Finished
                } else {
                    RequestState::Failed
                },
            );
        }
        let detail = format!("family {} target level {}", self.family, self.min_level);
        if all_ok {
            JobReport::success(per_worker, detail)
        } else {
            JobReport::failure(per_worker, detail)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use worker_rpc::{InMemoryTransport, ProtocolReplicaInfo, ReplicaStatus as WireReplicaStatus, WorkerResponse};

    #[tokio::test]
    async fn succeeds_once_the_worker_acks() {
        let transport = InMemoryTransport::new();
        transport
            .set_response(
                "worker01",
                WorkerResponse {
                    id: 0,
                    body: WorkerResponseBody::ReplicaInfo {
                        replicas: vec![ProtocolReplicaInfo {
                            status: WireReplicaStatus::Complete,
                            worker: "worker01".to_string(),
                            database: "layout1".to_string(),
                            chunk: ChunkId::new(1),
                            verify_time: 0,
                            file_info_many: Vec::new(),
                        }],
                    },
                },
            )
            .await;
        let job = ReplicationJob {
            family: "layout1".to_string(),
            min_level: 2,
            plan: vec![(WorkerName::from("worker01"), ChunkId::new(1), ReplicaOp::Add)],
            backoff: BackoffConfig {
                init_backoff: Duration::from_millis(1),
                max_backoff: Duration::from_millis(2),
                base: 2.0,
            },
            max_attempts: 3,
        };
        let report = job.run(&transport).await;
        assert_eq!(report.state, crate::job::JobState::FinishedSuccess);
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let transport = InMemoryTransport::new();
        let job = ReplicationJob {
            family: "layout1".to_string(),
            min_level: 2,
            plan: vec![(WorkerName::from("worker02"), ChunkId::new(5), ReplicaOp::Add)],
            backoff: BackoffConfig {
                init_backoff: Duration::from_millis(1),
                max_backoff: Duration::from_millis(2),
                base: 2.0,
            },
            max_attempts: 2,
        };
        let report = job.run(&transport).await;
        assert_eq!(report.state, crate::job::JobState::FinishedFailure);
    }
}
