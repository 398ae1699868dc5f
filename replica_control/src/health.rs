//! Periodic worker probes. A worker that fails to answer for
//! `worker_evict_timeout_sec` is marked *evicted*; the caller is expected
//! to invoke `Executive::kill_incomplete_uber_jobs_on_worker` for every
//! in-flight query against that worker, returning its Jobs to `PENDING`.
//! This module only tracks *which* workers are down for *how long* — it
//! has no visibility into live queries, which live in `ccontrol`.

use std::time::Duration;

use czar_time::SharedTimeProvider;
use hashbrown::HashMap;
use observability_deps::tracing::warn;
use parking_lot::Mutex;
use qmeta_types::WorkerName;
use worker_rpc::WorkerTransport;

use crate::jobs::ClusterHealthJob;

#[derive(Debug, Clone, Copy)]
struct FailureWindow {
    since_ms: i64,
}

#[derive(Debug)]
pub struct HealthMonitor {
    time: SharedTimeProvider,
    evict_timeout: Duration,
    failing_since: Mutex<HashMap<WorkerName, FailureWindow>>,
}

impl HealthMonitor {
    pub fn new(time: SharedTimeProvider, evict_timeout: Duration) -> Self {
        Self {
            time,
            evict_timeout,
            failing_since: Mutex::new(HashMap::new()),
        }
    }

    /// Probes every worker once and returns the set newly crossing the
    /// eviction threshold. A worker that recovers before the threshold is
    /// forgotten, not evicted.
    pub async fn probe_once(&self, transport: &dyn WorkerTransport, workers: Vec<WorkerName>) -> Vec<WorkerName> {
        let job = ClusterHealthJob { workers };
        let health = job.probe(transport).await;
        let now_ms = self.time.now().timestamp_millis();
        let mut failing_since = self.failing_since.lock();
        let mut evicted = Vec::new();

        for (worker, status) in &health {
            let reachable = status.replication && status.qserv;
            if reachable {
                failing_since.remove(worker);
                continue;
            }
            let window = failing_since.entry(worker.clone()).or_insert(FailureWindow { since_ms: now_ms });
            let down_for = Duration::from_millis((now_ms - window.since_ms).max(0) as u64);
            if down_for >= self.evict_timeout {
                warn!(%worker, down_for_secs = down_for.as_secs(), "worker evicted after health probe timeout");
                evicted.push(worker.clone());
            }
        }
        evicted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use czar_time::{MockProvider, Time};
    use std::sync::Arc;
    use worker_rpc::InMemoryTransport;

    #[tokio::test]
    async fn a_worker_is_evicted_only_after_the_timeout_elapses() {
        let provider = Arc::new(MockProvider::new(Time::from_timestamp_nanos(0)));
        let monitor = HealthMonitor::new(provider.clone(), Duration::from_secs(30));
        let transport = InMemoryTransport::new();
        let workers = vec![WorkerName::from("worker01")];

        let evicted = monitor.probe_once(&transport, workers.clone()).await;
        assert!(evicted.is_empty());

        provider.inc(Duration::from_secs(31));
        let evicted = monitor.probe_once(&transport, workers).await;
        assert_eq!(evicted, vec![WorkerName::from("worker01")]);
    }

    #[tokio::test]
    async fn recovery_before_the_timeout_clears_the_failure_window() {
        let provider = Arc::new(MockProvider::new(Time::from_timestamp_nanos(0)));
        let monitor = HealthMonitor::new(provider.clone(), Duration::from_secs(30));
        let transport = InMemoryTransport::new();
        let workers = vec![WorkerName::from("worker01")];

        monitor.probe_once(&transport, workers.clone()).await;
        transport
            .set_response(
                "worker01",
                worker_rpc::WorkerResponse {
                    id: 0,
                    body: worker_rpc::WorkerResponseBody::ServiceResponse {
                        service: worker_rpc::ServiceStatus {
                            start_time_ms: 0,
                            state: worker_rpc::ServiceState::Running,
                            new_requests: Vec::new(),
                            in_progress: Vec::new(),
                            finished: Vec::new(),
                        },
                    },
                },
            )
            .await;
        provider.inc(Duration::from_secs(31));
        let evicted = monitor.probe_once(&transport, workers).await;
        assert!(evicted.is_empty());
    }
}
