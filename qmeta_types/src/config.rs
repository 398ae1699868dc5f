//! Cluster configuration records (§C7): workers, families, databases and
//! their tables, plus the schema-declared parameter shape.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::ids::WorkerName;

/// A category/parameter pair's declared schema: type, default, description,
/// and the two access-control flags the config service enforces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamSchema {
    pub category: String,
    pub param: String,
    pub value_type: ParamType,
    pub default: String,
    pub description: String,
    pub read_only: bool,
    /// Security-context parameters (e.g. passwords) are redacted on read.
    pub security_context: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParamType {
    Int,
    Float,
    Bool,
    String,
}

/// A host/port endpoint, reused across a worker's several services.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
}

/// A host/port/tmp-dir endpoint (loader, exporter, HTTP loader services).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagingEndpoint {
    pub host: String,
    pub port: u16,
    pub tmp_dir: String,
}

/// A worker's `db` service: host/port plus the user the czar connects as.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DbEndpoint {
    pub host: String,
    pub port: u16,
    pub user: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Worker {
    pub name: WorkerName,
    pub is_enabled: bool,
    pub is_read_only: bool,
    pub svc: Endpoint,
    pub fs: Endpoint,
    pub db: DbEndpoint,
    pub loader: StagingEndpoint,
    pub exporter: StagingEndpoint,
    pub http_loader: StagingEndpoint,
    pub data_dir: String,
}

/// A partial worker update. Every field is an `Option`; `None` means
/// "leave unchanged" — the wire-level tri-state encoding (`-1` for
/// unspecified numeric fields) is handled at the HTTP/config boundary and
/// collapses to `None` here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerUpdate {
    pub is_enabled: Option<bool>,
    pub is_read_only: Option<bool>,
    pub svc: Option<Endpoint>,
    pub fs: Option<Endpoint>,
    pub db: Option<DbEndpoint>,
    pub loader: Option<StagingEndpoint>,
    pub exporter: Option<StagingEndpoint>,
    pub http_loader: Option<StagingEndpoint>,
    pub data_dir: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Family {
    pub name: String,
    pub replication_level: u32,
    pub num_stripes: u32,
    pub num_sub_stripes: u32,
    pub overlap: f64,
}

/// A column's declared name and SQL type, as recorded per-table in
/// `Database::columns`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDef {
    pub name: String,
    pub sql_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Database {
    pub name: String,
    pub family: String,
    pub is_published: bool,
    pub partitioned_tables: Vec<String>,
    pub regular_tables: Vec<String>,
    pub director_table: Option<String>,
    pub director_table_key: Option<String>,
    pub chunk_id_col_name: String,
    pub sub_chunk_id_col_name: String,
    pub columns: BTreeMap<String, Vec<ColumnDef>>,
}

impl Database {
    /// Every table name this database declares, partitioned or not.
    pub fn all_tables(&self) -> impl Iterator<Item = &str> {
        self.partitioned_tables
            .iter()
            .chain(self.regular_tables.iter())
            .map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_tables_covers_both_kinds() {
        let db = Database {
            name: "LSST".into(),
            family: "layout1".into(),
            is_published: true,
            partitioned_tables: vec!["Object".into()],
            regular_tables: vec!["Filter".into()],
            director_table: Some("Object".into()),
            director_table_key: Some("objectId".into()),
            chunk_id_col_name: "chunkId".into(),
            sub_chunk_id_col_name: "subChunkId".into(),
            columns: BTreeMap::new(),
        };
        let names: Vec<_> = db.all_tables().collect();
        assert_eq!(names, vec!["Object", "Filter"]);
    }
}
