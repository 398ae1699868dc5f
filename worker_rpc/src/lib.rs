//! Worker RPC envelope and transport (ambient C14): the JSON structs that
//! stand in for the real system's protobuf messages (§6), a
//! [`WorkerTransport`] seam for the control-plane RPCs `replica_control`
//! drives, and an [`HttpWorkerChannel`] implementing
//! [`qdisp::WorkerChannel`] for query dispatch.
#![deny(rustdoc::broken_intra_doc_links, rustdoc::bare_urls, rust_2018_idioms)]
#![warn(missing_debug_implementations, clippy::explicit_iter_loop, clippy::use_self)]

mod channel;
mod envelope;
mod error;
mod transport;

pub use channel::{HttpWorkerChannel, InMemoryWorkerChannel};
pub use envelope::{
    ProtocolFileInfo, ProtocolReplicaInfo, ReplicaStatus, ServiceOperation, ServiceState,
    ServiceStatus, SqlField, SqlResultSet, SqlRow, WorkerRequest, WorkerRequestBody,
    WorkerResponse, WorkerResponseBody,
};
pub use error::{Error, Result};
pub use transport::{HttpTransport, InMemoryTransport, WorkerTransport};
