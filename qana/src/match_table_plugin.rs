//! For a non-join query whose sole table is a match table, ANDs
//! `(dirCol1 IS NULL OR flagCol<>2)` into the WHERE clause so rows
//! duplicated by the partitioner (rows whose first director reference
//! fell outside this chunk's overlap, flagged accordingly) are dropped.
//! Joins are left for the general table plugin to resolve.

use css::Facade;
use query_ir::{
    BoolFactorTerm, BoolTerm, ColumnRef, CompOp, CompPredicate, NullPredicate, SelectStmt,
    ValueExpr,
};

use crate::{
    context::QueryContext,
    error::Result,
    plugin::{Phase, Plugin},
};

#[derive(Debug, Clone, Copy)]
pub struct MatchTablePlugin;

impl Plugin for MatchTablePlugin {
    fn name(&self) -> &'static str {
        "match_table_plugin"
    }

    fn phase(&self) -> Phase {
        Phase::MatchTableDedup
    }

    fn apply(&self, stmt: &mut SelectStmt, _ctx: &mut QueryContext, catalog: &Facade) -> Result<()> {
        if stmt.from.len() != 1 {
            return Ok(());
        }
        let t = &stmt.from[0];
        let Some(db) = &t.db else { return Ok(()) };
        if !catalog.is_match_table(db, &t.table)? {
            return Ok(());
        }
        let params = catalog.get_match_table_params(db, &t.table)?;

        let dedup_filter = BoolTerm::Or(vec![
            BoolTerm::BoolFactor(vec![BoolFactorTerm::NullPredicate(NullPredicate {
                expr: ValueExpr::column(ColumnRef::unqualified(params.dir_col_name1.clone())),
                is_not: false,
            })]),
            BoolTerm::BoolFactor(vec![BoolFactorTerm::CompPredicate(CompPredicate {
                lhs: ValueExpr::column(ColumnRef::unqualified(params.flag_col_name.clone())),
                op: CompOp::Ne,
                rhs: ValueExpr::literal("2"),
            })]),
        ]);

        stmt.where_clause = Some(match stmt.where_clause.take() {
            Some(existing) => BoolTerm::And(vec![dedup_filter, existing]),
            None => dedup_filter,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use css::test_fixtures::sample_snapshot;
    use query_ir::TableRef;

    #[test]
    fn single_match_table_query_gets_dedup_filter_prepended() {
        let facade = Facade::new(sample_snapshot()).unwrap();
        let mut stmt = SelectStmt::new();
        stmt.from.push(TableRef::new("RefObjMatch").with_db("LSST"));
        let mut ctx = QueryContext::new(20, 10);

        MatchTablePlugin.apply(&mut stmt, &mut ctx, &facade).unwrap();

        match stmt.where_clause.unwrap() {
            BoolTerm::Or(terms) => assert_eq!(terms.len(), 2),
            other => panic!("expected an OR filter, got {other:?}"),
        }
    }

    #[test]
    fn leaves_non_match_tables_untouched() {
        let facade = Facade::new(sample_snapshot()).unwrap();
        let mut stmt = SelectStmt::new();
        stmt.from.push(TableRef::new("Object").with_db("LSST"));
        let mut ctx = QueryContext::new(20, 10);

        MatchTablePlugin.apply(&mut stmt, &mut ctx, &facade).unwrap();

        assert!(stmt.where_clause.is_none());
    }

    #[test]
    fn joins_are_left_to_the_table_plugin() {
        let facade = Facade::new(sample_snapshot()).unwrap();
        let mut stmt = SelectStmt::new();
        stmt.from.push(TableRef::new("RefObjMatch").with_db("LSST"));
        stmt.from.push(TableRef::new("Object").with_db("LSST"));
        let mut ctx = QueryContext::new(20, 10);

        MatchTablePlugin.apply(&mut stmt, &mut ctx, &facade).unwrap();

        assert!(stmt.where_clause.is_none());
    }
}
