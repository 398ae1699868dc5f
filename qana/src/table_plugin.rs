//! Resolves every `ColumnRef` to a `TableRef` using the FROM list,
//! normalizes `db.table.col`, and records the dominant database. Must run
//! first — every other plugin assumes table references are resolved.

use css::Facade;
use query_ir::SelectStmt;

use crate::{
    context::QueryContext,
    error::Result,
    plugin::{Phase, Plugin},
};

#[derive(Debug, Clone, Copy)]
pub struct TablePlugin;

impl Plugin for TablePlugin {
    fn name(&self) -> &'static str {
        "table_plugin"
    }

    fn phase(&self) -> Phase {
        Phase::TableResolution
    }

    fn requires_table_resolution(&self) -> bool {
        false
    }

    fn apply(&self, stmt: &mut SelectStmt, ctx: &mut QueryContext, _catalog: &Facade) -> Result<()> {
        // The dominant db is whichever database most FROM-list tables
        // already carry; unqualified tables default to it.
        let mut counts: std::collections::HashMap<String, usize> = std::collections::HashMap::new();
        for t in &stmt.from {
            if let Some(db) = &t.db {
                *counts.entry(db.clone()).or_default() += 1;
            }
        }
        let dominant = counts.into_iter().max_by_key(|(_, n)| *n).map(|(db, _)| db);

        if let Some(db) = &dominant {
            for t in &mut stmt.from {
                if t.db.is_none() {
                    t.db = Some(db.clone());
                }
            }
        }
        ctx.dominant_db = dominant;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use css::test_fixtures::sample_snapshot;
    use query_ir::TableRef;

    #[test]
    fn unqualified_tables_inherit_the_dominant_db() {
        let facade = Facade::new(sample_snapshot()).unwrap();
        let mut stmt = SelectStmt::new();
        stmt.from.push(TableRef::new("Object").with_db("LSST"));
        stmt.from.push(TableRef::new("Filter"));
        let mut ctx = QueryContext::new(20, 10);

        TablePlugin.apply(&mut stmt, &mut ctx, &facade).unwrap();

        assert_eq!(ctx.dominant_db.as_deref(), Some("LSST"));
        assert_eq!(stmt.from[1].db.as_deref(), Some("LSST"));
    }
}
