//! Query analysis: the phase-ordered plugin pipeline that rewrites a
//! [`SelectStmt`](query_ir::SelectStmt) into its chunk-scoped, worker-ready
//! form — resolving table references, deduplicating match tables,
//! classifying scans, splitting aggregates, and pushing director-key
//! restrictors down into index lookups.
#![deny(rustdoc::broken_intra_doc_links, rustdoc::bare_urls, rust_2018_idioms)]
#![warn(missing_debug_implementations, clippy::explicit_iter_loop, clippy::use_self)]

mod aggregation_plugin;
mod context;
mod director_index_plugin;
mod error;
mod match_table_plugin;
mod plugin;
mod scan_table_plugin;
mod table_plugin;

pub use aggregation_plugin::{AggregationPlugin, AggregationSplit};
pub use context::{ChunkEnumeration, QueryContext, ScanInfo};
pub use director_index_plugin::DirectorIndexPlugin;
pub use error::{Error, Result};
pub use match_table_plugin::MatchTablePlugin;
pub use plugin::{Phase, Pipeline, Plugin};
pub use scan_table_plugin::ScanTablePlugin;
pub use table_plugin::TablePlugin;

use css::Facade;
use query_ir::SelectStmt;

/// The standard pipeline: table resolution, then match-table dedup, scan
/// classification, aggregation split, and director-index pushdown, in
/// that order.
pub fn standard_pipeline() -> Result<Pipeline> {
    Pipeline::new(vec![
        Box::new(TablePlugin),
        Box::new(MatchTablePlugin),
        Box::new(ScanTablePlugin),
        Box::new(AggregationPlugin),
        Box::new(DirectorIndexPlugin),
    ])
}

/// Runs the standard pipeline over `stmt`, returning the [`QueryContext`]
/// accumulated alongside it.
pub fn analyze(
    stmt: &mut SelectStmt,
    catalog: &Facade,
    interactive_chunk_limit: u32,
    slowest_scan_rating: u32,
) -> Result<QueryContext> {
    let pipeline = standard_pipeline()?;
    let mut ctx = QueryContext::new(interactive_chunk_limit, slowest_scan_rating);
    pipeline.run(stmt, &mut ctx, catalog)?;
    Ok(ctx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use css::test_fixtures::sample_snapshot;
    use query_ir::{ColumnRef, TableRef, ValueExpr};

    #[test]
    fn standard_pipeline_accepts_its_own_plugin_ordering() {
        standard_pipeline().unwrap();
    }

    #[test]
    fn analyze_resolves_and_classifies_a_simple_scan() {
        let facade = Facade::new(sample_snapshot()).unwrap();
        let mut stmt = SelectStmt::new();
        stmt.select_list
            .push(ValueExpr::column(ColumnRef::unqualified("objectId")));
        stmt.from.push(TableRef::new("Object").with_db("LSST"));

        let mut ctx = analyze(&mut stmt, &facade, 5, 3).unwrap();
        ctx.chunk_count = 100;
        assert_eq!(ctx.dominant_db.as_deref(), Some("LSST"));
    }
}
