//! `DirectorIndex`: build or rebuild `<db>.<directorTable>__idx`. Every
//! catalog-good chunk must contribute a row; for a unique primary key the
//! first worker to answer wins and later contributions from other
//! replicas of the same chunk are idempotent no-ops, since the index only
//! needs one row per key.

use async_trait::async_trait;
use hashbrown::HashMap;
use observability_deps::tracing::warn;
use qmeta_types::{ChunkId, WorkerName};
use worker_rpc::{WorkerRequest, WorkerRequestBody, WorkerResponseBody, WorkerTransport};

use crate::job::{Job, JobReport};
use crate::request::RequestState;

#[derive(Debug, Clone)]
pub struct DirectorIndexJob {
    pub database: String,
    pub director_table: String,
    pub director_table_key: String,
    pub rebuild: bool,
    pub unique_primary_key: bool,
    /// Every replica holder for each chunk that must contribute.
    pub chunk_workers: HashMap<ChunkId, Vec<WorkerName>>,
}

impl DirectorIndexJob {
    /// `CREATE (OR DROP+CREATE when rebuilding) <db>.<directorTable>__idx`.
    pub fn index_table_sql(&self) -> String {
        let key_clause = if self.unique_primary_key {
            format!("PRIMARY KEY({})", self.director_table_key)
        } else {
            format!("KEY({})", self.director_table_key)
        };
        let verb = if self.rebuild {
            "CREATE TABLE"
        } else {
            "CREATE TABLE IF NOT EXISTS"
        };
        let create = format!(
            "{verb} {db}.{table}__idx ({key} BIGINT NOT NULL, chunkId INT, subChunkId INT, {key_clause})",
            db = self.database,
            table = self.director_table,
            key = self.director_table_key,
        );
        if self.rebuild {
            format!(
                "DROP TABLE IF EXISTS {db}.{table}__idx; {create}",
                db = self.database,
                table = self.director_table
            )
        } else {
            create
        }
    }

    fn sql_request(&self, id: u64, chunk: ChunkId) -> WorkerRequest {
        WorkerRequest {
            id,
            body: WorkerRequestBody::SqlRequest {
                query: format!(
                    "SELECT {key} FROM {db}.{table} WHERE chunkId = {chunk}",
                    key = self.director_table_key,
                    db = self.database,
                    table = self.director_table,
                ),
                user: String::new(),
                password: String::new(),
                max_rows: 0,
                is_schema_only: false,
            },
        }
    }

    /// Per-chunk outcome: `true` iff at least one worker contributed.
    pub async fn extract(&self, transport: &dyn WorkerTransport) -> HashMap<ChunkId, bool> {
        let mut per_chunk = HashMap::new();
        let mut id = 0u64;
        for (chunk, workers) in &self.chunk_workers {
            let mut contributed = false;
            for worker in workers {
                let request = self.sql_request(id, *chunk);
                id += 1;
                let ok = matches!(
                    transport.send(worker.as_str(), request).await,
                    Ok(response) if matches!(response.body, WorkerResponseBody::ResponseSql { .. })
                );
                if ok {
                    contributed = true;
                    if self.unique_primary_key {
                        break;
                    }
                } else {
                    warn!(%worker, %chunk, "director index extraction failed");
                }
            }
            per_chunk.insert(*chunk, contributed);
        }
        per_chunk
    }
}

#[async_trait]
impl Job for DirectorIndexJob {
    fn kind(&self) -> &'static str {
        "DirectorIndex"
    }

    async fn run(&self, transport: &dyn WorkerTransport) -> JobReport {
        let per_chunk = self.extract(transport).await;
        let every_chunk_contributed = !per_chunk.is_empty() && per_chunk.values().all(|ok| *ok);
        let per_worker: HashMap<WorkerName, RequestState> = self
            .chunk_workers
            .values()
            .flatten()
            .map(|w| {
                let state = if every_chunk_contributed {
                    RequestState::Finished
                } else {
                    RequestState::Failed
                };
                (w.clone(), state)
            })
            .collect();
        let detail = format!(
            "{}/{} chunks contributed",
            per_chunk.values().filter(|ok| **ok).count(),
            per_chunk.len()
        );
        if every_chunk_contributed {
            JobReport::success(per_worker, detail)
        } else {
            JobReport::failure(per_worker, detail)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rebuild_drops_before_creating() {
        let job = DirectorIndexJob {
            database: "LSST".to_string(),
            director_table: "Object".to_string(),
            director_table_key: "objectId".to_string(),
            rebuild: true,
            unique_primary_key: true,
            chunk_workers: HashMap::new(),
        };
        let sql = job.index_table_sql();
        assert!(sql.starts_with("DROP TABLE IF EXISTS LSST.Object__idx;"));
        assert!(sql.contains("PRIMARY KEY(objectId)"));
    }

    #[test]
    fn non_unique_key_uses_a_plain_key() {
        let job = DirectorIndexJob {
            database: "LSST".to_string(),
            director_table: "Source".to_string(),
            director_table_key: "sourceId".to_string(),
            rebuild: false,
            unique_primary_key: false,
            chunk_workers: HashMap::new(),
        };
        assert!(job.index_table_sql().contains("KEY(sourceId)"));
        assert!(!job.index_table_sql().contains("PRIMARY KEY"));
    }
}
