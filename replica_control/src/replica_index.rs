//! The in-memory replica cache backing C5's [`ChunkLocator`] and C8's
//! `Replication`/`QservSync` jobs. Rebuilt from worker `GET_REPLICAS`
//! reports at startup rather than persisted — the metadata database
//! (`metastore`) only durably stores configuration, query metadata,
//! transactions and the controller event log, not live replica status.

use hashbrown::HashMap;
use parking_lot::RwLock;
use qdisp::ChunkLocator;
use qmeta_types::{ChunkId, Replica, WorkerName};

#[derive(Debug, Default)]
pub struct ReplicaIndex {
    // (database, chunk) -> worker -> replica
    by_chunk: RwLock<HashMap<(String, ChunkId), HashMap<WorkerName, Replica>>>,
}

impl ReplicaIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, replica: Replica) {
        self.by_chunk
            .write()
            .entry((replica.database.clone(), replica.chunk))
            .or_default()
            .insert(WorkerName::from(replica.worker.clone()), replica);
    }

    pub fn remove(&self, database: &str, chunk: ChunkId, worker: &WorkerName) {
        if let Some(workers) = self.by_chunk.write().get_mut(&(database.to_string(), chunk)) {
            workers.remove(worker);
        }
    }

    /// Workers holding a fully verified replica of `chunk`, in a
    /// deterministic (sorted by name) order.
    pub fn usable_workers(&self, database: &str, chunk: ChunkId) -> Vec<WorkerName> {
        let guard = self.by_chunk.read();
        let mut workers: Vec<WorkerName> = guard
            .get(&(database.to_string(), chunk))
            .into_iter()
            .flat_map(|m| m.iter())
            .filter(|(_, r)| r.is_usable())
            .map(|(w, _)| w.clone())
            .collect();
        workers.sort();
        workers
    }

    /// Number of complete, verified replicas of `chunk` — the count
    /// `Replication` compares against a family's `minLevel`.
    pub fn replication_level(&self, database: &str, chunk: ChunkId) -> usize {
        self.usable_workers(database, chunk).len()
    }

    /// Every chunk of `database` with at least one usable replica, mapped
    /// to its usable workers — the input `DirectorIndexJob` needs to know
    /// which chunks must contribute and who can be asked.
    pub fn chunks_for_database(&self, database: &str) -> HashMap<ChunkId, Vec<WorkerName>> {
        let guard = self.by_chunk.read();
        let mut out = HashMap::new();
        for (key, workers) in guard.iter() {
            if key.0 != database {
                continue;
            }
            let mut usable: Vec<WorkerName> = workers
                .iter()
                .filter(|(_, r)| r.is_usable())
                .map(|(w, _)| w.clone())
                .collect();
            if usable.is_empty() {
                continue;
            }
            usable.sort();
            out.insert(key.1, usable);
        }
        out
    }

    /// A [`ChunkLocator`] scoped to one database: the Executive only ever
    /// dispatches chunks of a single query's default database.
    pub fn locator_for(self: std::sync::Arc<Self>, database: impl Into<String>) -> DatabaseLocator {
        DatabaseLocator {
            index: self,
            database: database.into(),
        }
    }
}

/// Deterministically picks the lexicographically-first usable worker for
/// a chunk, matching the teacher's preference for reproducible assignment
/// over load-aware scheduling (out of scope here).
#[derive(Debug)]
pub struct DatabaseLocator {
    index: std::sync::Arc<ReplicaIndex>,
    database: String,
}

impl ChunkLocator for DatabaseLocator {
    fn worker_for_chunk(&self, chunk_id: ChunkId) -> Option<WorkerName> {
        self.index.usable_workers(&self.database, chunk_id).into_iter().next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qmeta_types::{ReplicaStatus, WorkerName};

    fn usable(worker: &str, database: &str, chunk: i32) -> Replica {
        Replica {
            worker: worker.to_string(),
            database: database.to_string(),
            chunk: ChunkId::new(chunk),
            status: ReplicaStatus::Complete,
            verify_time_ms: 0,
            files: Vec::new(),
        }
    }

    #[test]
    fn locator_picks_the_lexicographically_first_usable_worker() {
        let index = std::sync::Arc::new(ReplicaIndex::new());
        index.record(usable("worker02", "LSST", 1));
        index.record(usable("worker01", "LSST", 1));
        let locator = index.locator_for("LSST");
        assert_eq!(
            locator.worker_for_chunk(ChunkId::new(1)),
            Some(WorkerName::from("worker01"))
        );
    }

    #[test]
    fn removing_a_replica_drops_it_from_usable_workers() {
        let index = std::sync::Arc::new(ReplicaIndex::new());
        index.record(usable("worker01", "LSST", 1));
        index.remove("LSST", ChunkId::new(1), &WorkerName::from("worker01"));
        assert!(index.usable_workers("LSST", ChunkId::new(1)).is_empty());
    }

    #[test]
    fn chunks_for_database_skips_other_databases_and_empty_chunks() {
        let index = ReplicaIndex::new();
        index.record(usable("worker01", "LSST", 1));
        index.record(usable("worker01", "other", 7));
        index.remove("LSST", ChunkId::new(1), &WorkerName::from("worker01"));
        index.record(usable("worker01", "LSST", 1));

        let chunks = index.chunks_for_database("LSST");
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[&ChunkId::new(1)], vec![WorkerName::from("worker01")]);
    }
}
