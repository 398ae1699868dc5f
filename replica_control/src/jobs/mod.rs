//! The job catalog: one module per row of §4.8's table.

mod cluster_health;
mod director_index;
mod qserv_sync;
mod replication;
mod service_management;
mod sql_query;

pub use cluster_health::{ClusterHealthJob, WorkerHealth};
pub use director_index::DirectorIndexJob;
pub use qserv_sync::QservSyncJob;
pub use replication::{ReplicaOp, ReplicationJob};
pub use service_management::ServiceManagementJob;
pub use sql_query::SqlQueryJob;
