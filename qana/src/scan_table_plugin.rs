//! Classifies a query as a *scan* (reads columns with no secondary-index
//! restrictor) or a *point lookup*, and downgrades low-chunk-count scans
//! to interactive so they skip the shared scan schedulers entirely.

use css::Facade;
use query_ir::SelectStmt;

use crate::{
    context::{QueryContext, ScanInfo},
    error::Result,
    plugin::{Phase, Plugin},
};

#[derive(Debug, Clone, Copy)]
pub struct ScanTablePlugin;

impl Plugin for ScanTablePlugin {
    fn name(&self) -> &'static str {
        "scan_table_plugin"
    }

    fn phase(&self) -> Phase {
        Phase::ScanClassification
    }

    fn apply(&self, stmt: &mut SelectStmt, ctx: &mut QueryContext, catalog: &Facade) -> Result<()> {
        let is_point_lookup = !stmt.sec_idx_restrictors.is_empty();
        if is_point_lookup {
            ctx.scan_info.clear();
            ctx.is_interactive = false;
            return Ok(());
        }

        ctx.scan_info.clear();
        for t in &stmt.from {
            let Some(db) = &t.db else { continue };
            if !catalog.table_is_chunked(db, &t.table)? {
                continue;
            }
            let rating = catalog
                .get_db_striping(db)
                .map(|s| s.num_sub_stripes)
                .unwrap_or(0)
                .min(ctx.slowest_scan_rating);
            ctx.scan_info.push(ScanInfo {
                db: db.clone(),
                table: t.table.clone(),
                lock_in_memory: false,
                scan_rating: rating,
            });
        }

        if ctx.chunk_count < ctx.interactive_chunk_limit {
            ctx.scan_info.clear();
            ctx.is_interactive = true;
        } else {
            ctx.is_interactive = ctx.scan_info.is_empty();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use css::test_fixtures::sample_snapshot;
    use query_ir::{CompOp, SecIdxRestrictor, TableRef};

    fn base_stmt() -> SelectStmt {
        let mut stmt = SelectStmt::new();
        stmt.from.push(TableRef::new("Object").with_db("LSST"));
        stmt
    }

    #[test]
    fn point_lookup_has_no_scan_info() {
        let facade = Facade::new(sample_snapshot()).unwrap();
        let mut stmt = base_stmt();
        stmt.sec_idx_restrictors.push(SecIdxRestrictor::Compare {
            column: "objectId".into(),
            op: CompOp::Eq,
            value: "1".into(),
        });
        let mut ctx = QueryContext::new(20, 10);
        ctx.chunk_count = 100;

        ScanTablePlugin.apply(&mut stmt, &mut ctx, &facade).unwrap();
        assert!(ctx.scan_info.is_empty());
        assert!(!ctx.is_interactive);
    }

    #[test]
    fn scan_below_interactive_limit_is_downgraded() {
        let facade = Facade::new(sample_snapshot()).unwrap();
        let mut stmt = base_stmt();
        let mut ctx = QueryContext::new(20, 10);
        ctx.chunk_count = 2;

        ScanTablePlugin.apply(&mut stmt, &mut ctx, &facade).unwrap();
        assert!(ctx.scan_info.is_empty());
        assert!(ctx.is_interactive);
    }

    #[test]
    fn large_scan_records_scan_info_per_table() {
        let facade = Facade::new(sample_snapshot()).unwrap();
        let mut stmt = base_stmt();
        let mut ctx = QueryContext::new(20, 10);
        ctx.chunk_count = 500;

        ScanTablePlugin.apply(&mut stmt, &mut ctx, &facade).unwrap();
        assert_eq!(ctx.scan_info.len(), 1);
        assert_eq!(ctx.scan_info[0].table, "Object");
        assert!(!ctx.is_interactive);
    }
}
