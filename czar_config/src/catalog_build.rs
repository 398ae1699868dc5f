//! Builds a [`css::CatalogSnapshot`] from the configuration service's own
//! worker/family/database records, the view [`css::Facade`] publishes to
//! every reader in the workspace.

use css::{CatalogSnapshot, ChunkLevel, DbMeta, StripingParams, TableMeta};
use hashbrown::HashMap;
use qmeta_types::{Database, Family};

pub fn build_snapshot(databases: &[Database], families: &[Family]) -> CatalogSnapshot {
    let families: HashMap<&str, &Family> =
        families.iter().map(|f| (f.name.as_str(), f)).collect();

    let mut out = HashMap::new();
    for db in databases {
        let family = families.get(db.family.as_str());
        let striping = StripingParams {
            num_stripes: family.map_or(0, |f| f.num_stripes),
            num_sub_stripes: family.map_or(0, |f| f.num_sub_stripes),
            overlap: family.map_or(0.0, |f| f.overlap),
        };
        let sub_chunked = striping.num_sub_stripes > 0;

        let mut tables = HashMap::new();
        for table in &db.partitioned_tables {
            tables.insert(
                table.clone(),
                TableMeta {
                    chunk_level: if sub_chunked {
                        ChunkLevel::SubChunked
                    } else {
                        ChunkLevel::Chunked
                    },
                    partition_cols: Vec::new(),
                    dir_table: db.director_table.clone(),
                    dir_col_name: db.director_table_key.clone(),
                    sec_index_col_names: db
                        .director_table_key
                        .clone()
                        .into_iter()
                        .collect(),
                    match_params: None,
                },
            );
        }
        for table in &db.regular_tables {
            tables.insert(table.clone(), TableMeta::regular());
        }

        out.insert(
            db.name.clone(),
            DbMeta {
                striping,
                tables,
            },
        );
    }

    CatalogSnapshot {
        schema_version: Some(css::EXPECTED_SCHEMA_VERSION),
        databases: out,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn director_table_is_subchunked_when_family_has_substripes() {
        let family = Family {
            name: "layout1".into(),
            replication_level: 1,
            num_stripes: 200,
            num_sub_stripes: 5,
            overlap: 0.01667,
        };
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
        let snapshot = build_snapshot(&[db], &[family]);
        let lsst = &snapshot.databases["LSST"];
        assert_eq!(lsst.tables["Object"].chunk_level, ChunkLevel::SubChunked);
        assert_eq!(lsst.tables["Filter"].chunk_level, ChunkLevel::NotPartitioned);
    }
}
