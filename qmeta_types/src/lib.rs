//! Data shapes shared by every crate in the czar workspace: identifiers,
//! the user-query and job/uberjob records, replica status, cluster
//! configuration records, and transaction records.
#![deny(rustdoc::broken_intra_doc_links, rustdoc::bare_urls, rust_2018_idioms)]
#![warn(missing_debug_implementations, clippy::explicit_iter_loop, clippy::use_self)]

mod config;
mod ids;
mod query;
mod replica;
mod transaction;

pub use config::{
    ColumnDef, Database, DbEndpoint, Endpoint, Family, ParamSchema, ParamType, StagingEndpoint,
    Worker, WorkerUpdate,
};
pub use ids::{
    ChunkId, ContributionId, CzarId, JobId, QueryId, SubChunkId, TransactionId, UberJobId,
    WorkerName,
};
pub use query::{
    Job, JobState, MessageSeverity, QueryMessage, QueryStatus, UberJob, UserQueryMeta,
};
pub use replica::{Replica, ReplicaFile, ReplicaStatus};
pub use transaction::{Contribution, Transaction, TransactionState};
