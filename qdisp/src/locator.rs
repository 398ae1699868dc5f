//! Where to send a chunk's job. The actual replica-index lookup lives in
//! `replica_control`; this trait is the seam the Executive dispatches
//! through so it never depends on that crate directly.

use qmeta_types::{ChunkId, WorkerName};

pub trait ChunkLocator: Send + Sync {
    /// The worker currently responsible for this chunk, per the catalog
    /// and replica index, or `None` if no worker currently holds it.
    fn worker_for_chunk(&self, chunk_id: ChunkId) -> Option<WorkerName>;
}

/// A locator backed by a fixed map, used in tests and for the worker
/// simulator binary.
#[derive(Debug, Default)]
pub struct StaticLocator {
    assignments: hashbrown::HashMap<ChunkId, WorkerName>,
}

impl StaticLocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_assignment(mut self, chunk_id: ChunkId, worker: WorkerName) -> Self {
        self.assignments.insert(chunk_id, worker);
        self
    }
}

impl ChunkLocator for StaticLocator {
    fn worker_for_chunk(&self, chunk_id: ChunkId) -> Option<WorkerName> {
        self.assignments.get(&chunk_id).cloned()
    }
}
