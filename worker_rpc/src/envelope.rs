//! Wire-level request/response bodies, one-to-one with the protobuf
//! messages the real worker speaks, reimplemented here as JSON-tagged
//! Rust enums rather than generated `prost` code — there is no `.proto`
//! source in this workspace to generate from, and `hyper` carries JSON
//! bodies just as well as it would a gRPC stream for this envelope's
//! shape.

use qmeta_types::ChunkId;
use serde::{Deserialize, Serialize};

/// `ServiceManagement`'s operation selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServiceOperation {
    Status,
    Suspend,
    Resume,
    Requests,
    Drain,
}

/// One file belonging to a chunk replica, as reported in
/// `ProtocolReplicaInfo.file_info_many`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProtocolFileInfo {
    pub name: String,
    pub size: u64,
    pub mtime: i64,
    pub cs: String,
    pub begin_transfer_time: i64,
    pub end_transfer_time: i64,
    pub in_size: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReplicaStatus {
    NotFound,
    Corrupt,
    Incomplete,
    Complete,
}

/// A worker's report on one chunk replica, returned by
/// `ADD_REPLICA`/`REMOVE_REPLICA`/`SET_REPLICAS`/`GET_REPLICAS`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProtocolReplicaInfo {
    pub status: ReplicaStatus,
    pub worker: String,
    pub database: String,
    pub chunk: ChunkId,
    pub verify_time: i64,
    pub file_info_many: Vec<ProtocolFileInfo>,
}

/// One field descriptor in a `ProtocolResponseSql` result set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SqlField {
    pub name: String,
    pub org_name: String,
    pub table: String,
    pub org_table: String,
    pub db: String,
    pub catalog: String,
    pub def: String,
    pub length: u32,
    pub max_length: u32,
    pub flags: u32,
    pub decimals: u32,
    pub field_type: String,
}

/// One row: `nulls[i]` is true iff `cells[i]` carries no meaningful value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SqlRow {
    pub cells: Vec<String>,
    pub nulls: Vec<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SqlResultSet {
    pub error: Option<String>,
    pub char_set_name: String,
    pub has_result: bool,
    pub fields: Vec<SqlField>,
    pub rows: Vec<SqlRow>,
}

/// The request payload, one variant per job type in §4.8's table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum WorkerRequestBody {
    ServiceRequest {
        operation: ServiceOperation,
    },
    SqlRequest {
        query: String,
        user: String,
        password: String,
        max_rows: u32,
        is_schema_only: bool,
    },
    AddReplica {
        database: String,
        chunk: ChunkId,
    },
    RemoveReplica {
        database: String,
        chunk: ChunkId,
    },
    SetReplicas {
        family: String,
        good_chunks: Vec<ChunkId>,
        force: bool,
    },
    GetReplicas {
        database: String,
    },
}

/// A fully addressed request: the envelope always carries the id the
/// response must repeat, per §6.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerRequest {
    pub id: u64,
    pub body: WorkerRequestBody,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServiceState {
    Running,
    Suspended,
    Draining,
}

/// `{startTime, state, newRequests[], inProgress[], finished[]}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceStatus {
    pub start_time_ms: i64,
    pub state: ServiceState,
    pub new_requests: Vec<u64>,
    pub in_progress: Vec<u64>,
    pub finished: Vec<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum WorkerResponseBody {
    ServiceResponse { service: ServiceStatus },
    ReplicaInfo { replicas: Vec<ProtocolReplicaInfo> },
    ResponseSql { extended_status: String, results: Vec<SqlResultSet> },
    Error { message: String },
}

/// The response envelope. `id` always matches the request's `id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerResponse {
    pub id: u64,
    pub body: WorkerResponseBody,
}

impl WorkerResponse {
    pub fn error(id: u64, message: impl Into<String>) -> Self {
        Self {
            id,
            body: WorkerResponseBody::Error {
                message: message.into(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_round_trips_through_json() {
        let req = WorkerRequest {
            id: 7,
            body: WorkerRequestBody::ServiceRequest {
                operation: ServiceOperation::Drain,
            },
        };
        let encoded = serde_json::to_string(&req).unwrap();
        let decoded: WorkerRequest = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded.id, 7);
        assert!(matches!(
            decoded.body,
            WorkerRequestBody::ServiceRequest {
                operation: ServiceOperation::Drain
            }
        ));
    }

    #[test]
    fn response_repeats_the_request_id() {
        let resp = WorkerResponse::error(11, "worker unreachable");
        let encoded = serde_json::to_string(&resp).unwrap();
        let decoded: WorkerResponse = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded.id, 11);
        assert!(matches!(decoded.body, WorkerResponseBody::Error { .. }));
    }
}
