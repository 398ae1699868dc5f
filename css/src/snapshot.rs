//! The in-memory shape of the catalog, mirroring the `/DBS/...` key/value
//! tree. Built by `czar_config` from the metastore and handed to
//! [`crate::Facade::new`] / [`crate::Facade::reload`].

use hashbrown::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkLevel {
    NotPartitioned,
    Chunked,
    SubChunked,
}

/// `/PARTITIONING/_<id>/{nStripes,nSubStripes,overlap}`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StripingParams {
    pub num_stripes: u32,
    pub num_sub_stripes: u32,
    pub overlap: f64,
}

/// `/DBS/<db>/TABLES/<t>/match/{dirTable1,dirColName1,dirTable2,dirColName2,flagColName}`.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchTableParams {
    pub dir_table1: String,
    pub dir_col_name1: String,
    pub dir_table2: String,
    pub dir_col_name2: String,
    pub flag_col_name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableMeta {
    pub chunk_level: ChunkLevel,
    pub partition_cols: Vec<String>,
    pub dir_table: Option<String>,
    pub dir_col_name: Option<String>,
    pub sec_index_col_names: Vec<String>,
    pub match_params: Option<MatchTableParams>,
}

impl TableMeta {
    /// A plain, unpartitioned table.
    pub fn regular() -> Self {
        Self {
            chunk_level: ChunkLevel::NotPartitioned,
            partition_cols: Vec::new(),
            dir_table: None,
            dir_col_name: None,
            sec_index_col_names: Vec::new(),
            match_params: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DbMeta {
    pub striping: StripingParams,
    pub tables: HashMap<String, TableMeta>,
}

/// The full catalog image, keyed by database name, plus the schema-version
/// key every loaded catalog must carry.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CatalogSnapshot {
    pub schema_version: Option<u32>,
    pub databases: HashMap<String, DbMeta>,
}

#[cfg(any(test, feature = "test-fixtures"))]
pub mod test_fixtures {
    use super::*;
    use crate::EXPECTED_SCHEMA_VERSION;

    /// A small LSST-shaped catalog: one director table, one match table,
    /// one regular table, used across `css`'s and its dependents' tests.
    pub fn sample_snapshot() -> CatalogSnapshot {
        let mut tables = HashMap::new();
        tables.insert(
            "Object".to_string(),
            TableMeta {
                chunk_level: ChunkLevel::SubChunked,
                partition_cols: vec!["ra".to_string(), "decl".to_string()],
                dir_table: Some("Object".to_string()),
                dir_col_name: Some("objectId".to_string()),
                sec_index_col_names: vec!["objectId".to_string()],
                match_params: None,
            },
        );
        tables.insert(
            "RefObject".to_string(),
            TableMeta {
                chunk_level: ChunkLevel::SubChunked,
                partition_cols: vec!["ra".to_string(), "decl".to_string()],
                dir_table: Some("RefObject".to_string()),
                dir_col_name: Some("refObjectId".to_string()),
                sec_index_col_names: vec!["refObjectId".to_string()],
                match_params: None,
            },
        );
        tables.insert(
            "RefObjMatch".to_string(),
            TableMeta {
                chunk_level: ChunkLevel::Chunked,
                partition_cols: Vec::new(),
                dir_table: None,
                dir_col_name: None,
                sec_index_col_names: Vec::new(),
                match_params: Some(MatchTableParams {
                    dir_table1: "Object".to_string(),
                    dir_col_name1: "objectId".to_string(),
                    dir_table2: "RefObject".to_string(),
                    dir_col_name2: "refObjectId".to_string(),
                    flag_col_name: "flag".to_string(),
                }),
            },
        );
        tables.insert("Filter".to_string(), TableMeta::regular());

        let mut databases = HashMap::new();
        databases.insert(
            "LSST".to_string(),
            DbMeta {
                striping: StripingParams {
                    num_stripes: 200,
                    num_sub_stripes: 5,
                    overlap: 0.01667,
                },
                tables,
            },
        );

        CatalogSnapshot {
            schema_version: Some(EXPECTED_SCHEMA_VERSION),
            databases,
        }
    }
}
