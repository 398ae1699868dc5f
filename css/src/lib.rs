//! Read-only facade over the cluster catalog: the hierarchical key/value
//! tree describing which databases and tables exist, how they are
//! partitioned, and which pairs form match tables.
//!
//! The facade never mutates the catalog; the [`czar_config`](../czar_config)
//! crate is the only writer. A [`Facade`] holds an atomically-swappable
//! snapshot so readers never observe a half-applied [`reload`](Facade::reload).
#![deny(rustdoc::broken_intra_doc_links, rustdoc::bare_urls, rust_2018_idioms)]
#![warn(missing_debug_implementations, clippy::explicit_iter_loop, clippy::use_self)]

mod error;
mod snapshot;

pub use error::{Error, Result};
pub use snapshot::{
    CatalogSnapshot, ChunkLevel, DbMeta, MatchTableParams, StripingParams, TableMeta,
};
#[cfg(feature = "test-fixtures")]
pub use snapshot::test_fixtures;

use std::sync::Arc;

use arc_swap::ArcSwap;
use observability_deps::tracing::info;

/// The schema version this build of the czar expects the catalog to carry.
/// Loading a catalog stamped with any other version is a hard failure.
pub const EXPECTED_SCHEMA_VERSION: u32 = 1;

/// A read-only view over the cluster catalog.
///
/// Construction verifies the schema-version key; every accessor afterwards
/// reads a currently-published [`CatalogSnapshot`] without taking a lock.
#[derive(Debug)]
pub struct Facade {
    current: ArcSwap<CatalogSnapshot>,
}

impl Facade {
    /// Build a facade from an already-loaded snapshot, checking its schema
    /// version against [`EXPECTED_SCHEMA_VERSION`].
    pub fn new(snapshot: CatalogSnapshot) -> Result<Self> {
        Self::check_version(&snapshot)?;
        Ok(Self {
            current: ArcSwap::from_pointee(snapshot),
        })
    }

    fn check_version(snapshot: &CatalogSnapshot) -> Result<()> {
        match snapshot.schema_version {
            None => error::VersionMissingSnafu.fail(),
            Some(v) if v != EXPECTED_SCHEMA_VERSION => error::VersionMismatchSnafu {
                loaded: v,
                expected: EXPECTED_SCHEMA_VERSION,
            }
            .fail(),
            Some(_) => Ok(()),
        }
    }

    /// Replace the published snapshot, verifying its version first. Readers
    /// already holding an `Arc` to the old snapshot keep a consistent view.
    pub fn reload(&self, snapshot: CatalogSnapshot) -> Result<()> {
        Self::check_version(&snapshot)?;
        info!(db_count = snapshot.databases.len(), "catalog reloaded");
        self.current.store(Arc::new(snapshot));
        Ok(())
    }

    fn snap(&self) -> Arc<CatalogSnapshot> {
        self.current.load_full()
    }

    fn db(&self, db_name: &str) -> Result<Arc<CatalogSnapshot>> {
        let snap = self.snap();
        if !snap.databases.contains_key(db_name) {
            return error::NoSuchDbSnafu { db: db_name }.fail();
        }
        Ok(snap)
    }

    fn table<'a>(&self, snap: &'a CatalogSnapshot, db_name: &str, table: &str) -> Result<&'a TableMeta> {
        snap.databases
            .get(db_name)
            .and_then(|d| d.tables.get(table))
            .ok_or_else(|| {
                error::NoSuchTableSnafu {
                    db: db_name,
                    table,
                }
                .build()
            })
    }

    pub fn contains_db(&self, db_name: &str) -> bool {
        self.snap().databases.contains_key(db_name)
    }

    pub fn contains_table(&self, db_name: &str, table: &str) -> Result<bool> {
        let snap = self.db(db_name)?;
        Ok(snap.databases[db_name].tables.contains_key(table))
    }

    pub fn table_is_chunked(&self, db_name: &str, table: &str) -> Result<bool> {
        let snap = self.db(db_name)?;
        Ok(self.table(&snap, db_name, table)?.chunk_level != ChunkLevel::NotPartitioned)
    }

    pub fn table_is_sub_chunked(&self, db_name: &str, table: &str) -> Result<bool> {
        let snap = self.db(db_name)?;
        Ok(self.table(&snap, db_name, table)?.chunk_level == ChunkLevel::SubChunked)
    }

    pub fn is_match_table(&self, db_name: &str, table: &str) -> Result<bool> {
        let snap = self.db(db_name)?;
        Ok(self.table(&snap, db_name, table)?.match_params.is_some())
    }

    pub fn get_allowed_dbs(&self) -> Vec<String> {
        self.snap().databases.keys().cloned().collect()
    }

    pub fn get_chunked_tables(&self, db_name: &str) -> Result<Vec<String>> {
        let snap = self.db(db_name)?;
        Ok(snap.databases[db_name]
            .tables
            .iter()
            .filter(|(_, t)| t.chunk_level != ChunkLevel::NotPartitioned)
            .map(|(name, _)| name.clone())
            .collect())
    }

    pub fn get_sub_chunked_tables(&self, db_name: &str) -> Result<Vec<String>> {
        let snap = self.db(db_name)?;
        Ok(snap.databases[db_name]
            .tables
            .iter()
            .filter(|(_, t)| t.chunk_level == ChunkLevel::SubChunked)
            .map(|(name, _)| name.clone())
            .collect())
    }

    pub fn get_partition_cols(&self, db_name: &str, table: &str) -> Result<Vec<String>> {
        let snap = self.db(db_name)?;
        Ok(self.table(&snap, db_name, table)?.partition_cols.clone())
    }

    pub fn get_chunk_level(&self, db_name: &str, table: &str) -> Result<ChunkLevel> {
        let snap = self.db(db_name)?;
        Ok(self.table(&snap, db_name, table)?.chunk_level)
    }

    pub fn get_dir_table(&self, db_name: &str, table: &str) -> Result<String> {
        let snap = self.db(db_name)?;
        self.table(&snap, db_name, table)?
            .dir_table
            .clone()
            .ok_or_else(|| {
                error::NoSuchKeySnafu {
                    key: format!("{db_name}.{table}/partitioning/dirTable"),
                }
                .build()
            })
    }

    pub fn get_dir_col_name(&self, db_name: &str, table: &str) -> Result<String> {
        let snap = self.db(db_name)?;
        self.table(&snap, db_name, table)?
            .dir_col_name
            .clone()
            .ok_or_else(|| {
                error::NoSuchKeySnafu {
                    key: format!("{db_name}.{table}/partitioning/dirColName"),
                }
                .build()
            })
    }

    pub fn get_sec_index_col_names(&self, db_name: &str, table: &str) -> Result<Vec<String>> {
        let snap = self.db(db_name)?;
        Ok(self.table(&snap, db_name, table)?.sec_index_col_names.clone())
    }

    pub fn get_db_striping(&self, db_name: &str) -> Result<StripingParams> {
        let snap = self.db(db_name)?;
        Ok(snap.databases[db_name].striping)
    }

    pub fn get_overlap(&self, db_name: &str) -> Result<f64> {
        Ok(self.get_db_striping(db_name)?.overlap)
    }

    pub fn get_match_table_params(&self, db_name: &str, table: &str) -> Result<MatchTableParams> {
        let snap = self.db(db_name)?;
        self.table(&snap, db_name, table)?
            .match_params
            .clone()
            .ok_or_else(|| {
                error::NoSuchKeySnafu {
                    key: format!("{db_name}.{table}/match"),
                }
                .build()
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use snapshot::test_fixtures::sample_snapshot;

    #[test]
    fn rejects_mismatched_schema_version() {
        let mut snap = sample_snapshot();
        snap.schema_version = Some(999);
        let err = Facade::new(snap).unwrap_err();
        assert!(matches!(err, Error::VersionMismatch { .. }));
    }

    #[test]
    fn rejects_missing_schema_version() {
        let mut snap = sample_snapshot();
        snap.schema_version = None;
        assert!(matches!(Facade::new(snap), Err(Error::VersionMissing)));
    }

    #[test]
    fn looks_up_chunked_and_match_tables() {
        let facade = Facade::new(sample_snapshot()).unwrap();
        assert!(facade.contains_db("LSST"));
        assert!(!facade.contains_db("NoSuch"));
        assert!(facade.table_is_chunked("LSST", "Object").unwrap());
        assert!(facade.table_is_sub_chunked("LSST", "Object").unwrap());
        assert!(facade.is_match_table("LSST", "RefObjMatch").unwrap());
        assert!(!facade.is_match_table("LSST", "Object").unwrap());

        let params = facade.get_match_table_params("LSST", "RefObjMatch").unwrap();
        assert_eq!(params.dir_table1, "Object");
        assert_eq!(params.dir_table2, "RefObject");
    }

    #[test]
    fn unknown_db_and_table_are_reported() {
        let facade = Facade::new(sample_snapshot()).unwrap();
        assert!(matches!(
            facade.contains_table("NoSuch", "t"),
            Err(Error::NoSuchDb { .. })
        ));
        assert!(matches!(
            facade.contains_table("LSST", "NoSuch"),
            Err(Error::NoSuchTable { .. })
        ));
    }

    #[test]
    fn reload_replaces_the_published_snapshot() {
        let facade = Facade::new(sample_snapshot()).unwrap();
        assert!(facade.contains_db("LSST"));
        let mut empty = sample_snapshot();
        empty.databases.clear();
        facade.reload(empty).unwrap();
        assert!(!facade.contains_db("LSST"));
    }
}
