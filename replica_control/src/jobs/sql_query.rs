//! `SqlQuery`/`SqlSchema`: execute arbitrary SQL (or a schema-only probe)
//! against one worker and return its `ProtocolResponseSql`. Per-worker
//! success; a MySQL errno riding along in `extendedStatus` is the caller's
//! to interpret, not this job's.

use async_trait::async_trait;
use hashbrown::HashMap;
use qmeta_types::WorkerName;
use worker_rpc::{SqlResultSet, WorkerRequest, WorkerRequestBody, WorkerResponseBody, WorkerTransport};

use crate::job::{Job, JobReport};
use crate::request::RequestState;

#[derive(Debug, Clone)]
pub struct SqlQueryJob {
    pub worker: WorkerName,
    pub query: String,
    pub user: String,
    pub password: String,
    pub max_rows: u32,
    /// `SqlSchema` sets this so the worker runs a schema-only probe
    /// instead of executing `query` for its rows.
    pub is_schema_only: bool,
}

impl SqlQueryJob {
    pub async fn execute(&self, transport: &dyn WorkerTransport) -> Result<(String, Vec<SqlResultSet>), String> {
        let request = WorkerRequest {
            id: 0,
            body: WorkerRequestBody::SqlRequest {
                query: self.query.clone(),
                user: self.user.clone(),
                password: self.password.clone(),
                max_rows: self.max_rows,
                is_schema_only: self.is_schema_only,
            },
        };
        match transport.send(self.worker.as_str(), request).await {
            Ok(response) => match response.body {
                WorkerResponseBody::ResponseSql {
                    extended_status,
                    results,
                } => Ok((extended_status, results)),
                _ => Err("worker returned a non-SQL response".to_string()),
            },
            Err(e) => Err(e.to_string()),
        }
    }
}

#[async_trait]
impl Job for SqlQueryJob {
    fn kind(&self) -> &'static str {
        if self.is_schema_only {
            "SqlSchema"
        } else {
            "SqlQuery"
        }
    }

    async fn run(&self, transport: &dyn WorkerTransport) -> JobReport {
        let mut per_worker = HashMap::new();
        match self.execute(transport).await {
            Ok((status, _results)) => {
                per_worker.insert(self.worker.clone(), RequestState::Finished);
                JobReport::success(per_worker, status)
            }
            Err(detail) => {
                per_worker.insert(self.worker.clone(), RequestState::Failed);
                JobReport::failure(per_worker, detail)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use worker_rpc::{InMemoryTransport, WorkerResponse};

    #[tokio::test]
    async fn reports_the_extended_status_on_success() {
        let transport = InMemoryTransport::new();
        transport
            .set_response(
                "worker01",
                WorkerResponse {
                    id: 0,
                    body: WorkerResponseBody::ResponseSql {
                        extended_status: "SUCCESS".to_string(),
                        results: Vec::new(),
                    },
                },
            )
            .await;
        let job = SqlQueryJob {
            worker: WorkerName::from("worker01"),
            query: "SELECT 1".to_string(),
            user: "qsmaster".to_string(),
            password: String::new(),
            max_rows: 0,
            is_schema_only: false,
        };
        let (status, _) = job.execute(&transport).await.unwrap();
        assert_eq!(status, "SUCCESS");
    }
}
