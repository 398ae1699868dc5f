//! The entry point every HTTP handler and background task in C8 goes
//! through: dispatches jobs against the current worker list, records each
//! one to the controller event log, and gates database un-publish on
//! [`trans::Registry::blocks_unpublish`].

use std::sync::Arc;

use czar_config::ConfigService;
use czar_time::SharedTimeProvider;
use metastore::Metastore;
use observability_deps::tracing::info;
use worker_rpc::WorkerTransport;

use crate::error::{BlockedByTransactionSnafu, Result};
use crate::job::{Job, JobReport, JobState};
use crate::replica_index::ReplicaIndex;

#[derive(Debug)]
pub struct Controller {
    store: Metastore,
    config: Arc<ConfigService>,
    transactions: Arc<trans::Registry>,
    transport: Arc<dyn WorkerTransport>,
    replicas: Arc<ReplicaIndex>,
    time: SharedTimeProvider,
}

impl Controller {
    pub fn new(
        store: Metastore,
        config: Arc<ConfigService>,
        transactions: Arc<trans::Registry>,
        transport: Arc<dyn WorkerTransport>,
        time: SharedTimeProvider,
    ) -> Self {
        Self {
            store,
            config,
            transactions,
            transport,
            replicas: Arc::new(ReplicaIndex::new()),
            time,
        }
    }

    pub fn replicas(&self) -> &Arc<ReplicaIndex> {
        &self.replicas
    }

    pub fn config(&self) -> &ConfigService {
        &self.config
    }

    /// Runs `job`, records the outcome to the controller event log, and
    /// returns its report.
    pub async fn run_job(&self, job: &dyn Job) -> Result<JobReport> {
        let report = job.run(self.transport.as_ref()).await;
        let now_ms = self.time.now().timestamp_millis();
        self.store
            .events()
            .record(now_ms, job.kind(), &report.detail)
            .await?;
        info!(kind = job.kind(), state = ?report.state, "replication job finished");
        Ok(report)
    }

    /// `PUT /replication/config/database/:database` with `{publish: 0}`.
    /// Un-publishing is refused while any transaction against `database`
    /// is non-terminal, per §4.9's cross-reference from C8.
    pub async fn set_published(&self, database: &str, published: bool) -> Result<()> {
        if !published && self.transactions.blocks_unpublish(database).await? {
            return BlockedByTransactionSnafu {
                database: database.to_string(),
            }
            .fail();
        }
        self.config.set_published(database, published).await?;
        Ok(())
    }
}

/// `JobState::FinishedSuccess` only — used by callers that need a plain
/// bool rather than the full report (e.g. a one-shot CLI admin command).
pub fn job_succeeded(report: &JobReport) -> bool {
    report.state == JobState::FinishedSuccess
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_succeeded_reads_the_terminal_state() {
        let report = JobReport::success(Default::default(), "ok");
        assert!(job_succeeded(&report));
        let report = JobReport::failure(Default::default(), "no");
        assert!(!job_succeeded(&report));
    }
}
