//! Drives one [`Executive`] to completion: submits UberJobs to workers
//! through a [`WorkerChannel`], reconciles outcomes in a single loop (to
//! avoid the nested job/result/message lock-order hazards the original
//! callback-based dispatcher had), and retries on worker loss. The
//! wire-level transport is supplied by the caller — `worker_rpc` provides
//! the production implementation, `czar`'s worker simulator provides an
//! in-memory one for tests.

use std::sync::Arc;

use async_trait::async_trait;
use observability_deps::tracing::warn;
use qmeta_types::UberJob;
use tokio::sync::mpsc;

use crate::{
    executive::{Executive, RetryAction},
    locator::ChunkLocator,
};

/// One UberJob's outcome, as reported by the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UberJobResult {
    pub uber_job_id: qmeta_types::UberJobId,
    pub success: bool,
}

/// The wire-level seam: submits an UberJob to its worker and reports back
/// on `results` once a response (or a transport failure) arrives.
#[async_trait]
pub trait WorkerChannel: Send + Sync {
    async fn submit(&self, uber_job: UberJob, results: mpsc::UnboundedSender<UberJobResult>);
    async fn cancel(&self, uber_job_id: qmeta_types::UberJobId, worker: qmeta_types::WorkerName);
}

/// Runs assignment, submission, and retry-reconciliation for `executive`
/// until every Job reaches a terminal state or the query is cancelled. A
/// retryable UberJob failure sleeps `attempt_sleep` (fixed, not
/// exponential — the original reassigns after a flat pause rather than
/// backing off) before the next dispatch round.
pub async fn run_to_completion(
    executive: Arc<Executive>,
    locator: Arc<dyn ChunkLocator>,
    channel: Arc<dyn WorkerChannel>,
) {
    if executive.zero_chunks() {
        return;
    }
    executive.set_ready();

    let (tx, mut rx) = mpsc::unbounded_channel();

    dispatch_round(&executive, &locator, &channel, &tx).await;

    while !executive.all_terminal() && !executive.is_cancelled() {
        let Some(result) = rx.recv().await else {
            break;
        };
        match executive.report_outcome(result.uber_job_id, result.success) {
            RetryAction::None => {}
            RetryAction::Reassign { attempt_sleep } => {
                tokio::time::sleep(attempt_sleep).await;
                dispatch_round(&executive, &locator, &channel, &tx).await;
            }
        }
    }
}

async fn dispatch_round(
    executive: &Arc<Executive>,
    locator: &Arc<dyn ChunkLocator>,
    channel: &Arc<dyn WorkerChannel>,
    tx: &mpsc::UnboundedSender<UberJobResult>,
) {
    let uber_jobs = executive.assign_pending(locator.as_ref());
    for uber_job in uber_jobs {
        executive.mark_running(uber_job.uber_job_id);
        let channel = Arc::clone(channel);
        let tx = tx.clone();
        tokio::spawn(async move {
            channel.submit(uber_job, tx).await;
        });
    }
}

/// Cancels every in-flight UberJob for `executive` through `channel`.
pub async fn cancel(executive: &Executive, channel: &dyn WorkerChannel) {
    for (uber_job_id, worker) in executive.cancel() {
        channel.cancel(uber_job_id, worker).await;
    }
    warn!(query_id = %executive.query_id(), "query cancelled");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locator::StaticLocator;
    use qmeta_types::{ChunkId, JobId, QueryId, WorkerName};

    struct AlwaysSucceeds;

    #[async_trait]
    impl WorkerChannel for AlwaysSucceeds {
        async fn submit(&self, uber_job: UberJob, results: mpsc::UnboundedSender<UberJobResult>) {
            let _ = results.send(UberJobResult {
                uber_job_id: uber_job.uber_job_id,
                success: true,
            });
        }

        async fn cancel(&self, _uber_job_id: qmeta_types::UberJobId, _worker: WorkerName) {}
    }

    #[tokio::test]
    async fn run_to_completion_resolves_all_jobs_on_success() {
        let executive = Arc::new(Executive::new(QueryId::new(1), Default::default()));
        executive.add_chunk(JobId::new(1), ChunkId::new(1));
        let locator: Arc<dyn ChunkLocator> =
            Arc::new(StaticLocator::new().with_assignment(ChunkId::new(1), WorkerName::from("w1")));
        let channel: Arc<dyn WorkerChannel> = Arc::new(AlwaysSucceeds);

        run_to_completion(executive.clone(), locator, channel).await;

        assert!(executive.all_terminal());
    }

    #[tokio::test]
    async fn zero_chunk_query_completes_without_dispatching() {
        let executive = Arc::new(Executive::new(QueryId::new(1), Default::default()));
        let locator: Arc<dyn ChunkLocator> = Arc::new(StaticLocator::new());
        let channel: Arc<dyn WorkerChannel> = Arc::new(AlwaysSucceeds);

        run_to_completion(executive, locator, channel).await;
    }
}
