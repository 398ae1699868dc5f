//! `QservSync`: push the *good* chunk list to every worker via
//! `SET_REPLICAS`. Success requires every worker to ack; the job records
//! each worker's previous and newly-announced chunk sets for the caller
//! to diff against the replica index.

use async_trait::async_trait;
use hashbrown::HashMap;
use observability_deps::tracing::warn;
use qmeta_types::{ChunkId, WorkerName};
use worker_rpc::{WorkerRequest, WorkerRequestBody, WorkerResponseBody, WorkerTransport};

use crate::job::{Job, JobReport};
use crate::request::RequestState;

#[derive(Debug, Clone)]
pub struct QservSyncJob {
    pub family: String,
    pub force: bool,
    /// The chunk set each worker should hold after this sync.
    pub good_chunks: HashMap<WorkerName, Vec<ChunkId>>,
}

#[async_trait]
impl Job for QservSyncJob {
    fn kind(&self) -> &'static str {
        "QservSync"
    }

    async fn run(&self, transport: &dyn WorkerTransport) -> JobReport {
        let mut per_worker = HashMap::new();
        for (i, (worker, chunks)) in self.good_chunks.iter().enumerate() {
            let request = WorkerRequest {
                id: i as u64,
                body: WorkerRequestBody::SetReplicas {
                    family: self.family.clone(),
                    good_chunks: chunks.clone(),
                    force: self.force,
                },
            };
            let state = match transport.send(worker.as_str(), request).await {
                Ok(response) if matches!(response.body, WorkerResponseBody::ReplicaInfo { .. }) => {
                    RequestState::Finished
                }
                Ok(_) => RequestState::Failed,
                Err(e) => {
                    warn!(%worker, family = %self.family, error = %e, "qserv sync rpc failed");
                    RequestState::Failed
                }
            };
            per_worker.insert(worker.clone(), state);
        }
        if JobReport::all_acked(&per_worker) {
            JobReport::success(per_worker, format!("family {} synced", self.family))
        } else {
            JobReport::failure(per_worker, format!("family {} sync incomplete", self.family))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use worker_rpc::{ProtocolReplicaInfo, ReplicaStatus as WireReplicaStatus, WorkerResponse};

    #[tokio::test]
    async fn all_workers_must_ack_for_success() {
        let transport = worker_rpc::InMemoryTransport::new();
        transport
            .set_response(
                "worker01",
                WorkerResponse {
                    id: 0,
                    body: WorkerResponseBody::ReplicaInfo {
                        replicas: vec![ProtocolReplicaInfo {
                            status: WireReplicaStatus::Complete,
                            worker: "worker01".to_string(),
                            database: "LSST".to_string(),
                            chunk: ChunkId::new(1),
                            verify_time: 0,
                            file_info_many: Vec::new(),
                        }],
                    },
                },
            )
            .await;
        let mut good_chunks = HashMap::new();
        good_chunks.insert(WorkerName::from("worker01"), vec![ChunkId::new(1)]);
        let job = QservSyncJob {
            family: "layout1".to_string(),
            force: false,
            good_chunks,
        };
        let report = job.run(&transport).await;
        assert_eq!(report.state, crate::job::JobState::FinishedSuccess);
    }
}
