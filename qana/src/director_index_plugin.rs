//! If a secondary-index restrictor names a known director key, rewrites
//! chunk enumeration to a lookup against the director index instead of
//! scanning every chunk, and drops the restrictor from the fragment WHERE
//! clause — the worker never sees it, the lookup already pinned the rows.

use css::Facade;
use query_ir::{BoolFactorTerm, BoolTerm, SelectStmt};

use crate::{
    context::{ChunkEnumeration, QueryContext},
    error::Result,
    plugin::{Phase, Plugin},
};

#[derive(Debug, Clone, Copy)]
pub struct DirectorIndexPlugin;

impl Plugin for DirectorIndexPlugin {
    fn name(&self) -> &'static str {
        "director_index_plugin"
    }

    fn phase(&self) -> Phase {
        Phase::DirectorIndexPushdown
    }

    fn apply(&self, stmt: &mut SelectStmt, ctx: &mut QueryContext, catalog: &Facade) -> Result<()> {
        let Some(db) = &stmt.dominant_db.clone().or_else(|| ctx.dominant_db.clone()) else {
            return Ok(());
        };
        let Some(table) = stmt.from.first().map(|t| t.table.clone()) else {
            return Ok(());
        };
        if !catalog.table_is_chunked(db, &table)? {
            return Ok(());
        }
        let dir_col = match catalog.get_dir_col_name(db, &table) {
            Ok(col) => col,
            Err(css::Error::NoSuchKey { .. }) => return Ok(()),
            Err(e) => return Err(e.into()),
        };

        let Some(pos) = stmt
            .sec_idx_restrictors
            .iter()
            .position(|r| r.column() == dir_col)
        else {
            return Ok(());
        };

        let restrictor = stmt.sec_idx_restrictors.remove(pos);
        let key_value = match &restrictor {
            query_ir::SecIdxRestrictor::Compare { value, .. } => value.clone(),
            query_ir::SecIdxRestrictor::Between { lo, .. } => lo.clone(),
        };

        ctx.chunk_enumeration = ChunkEnumeration::DirectorIndexLookup {
            database: db.clone(),
            director_index_table: format!("{table}_director_index"),
            key_column: dir_col,
            key_value,
        };

        strip_restrictor_from_where(&mut stmt.where_clause, pos, &restrictor);
        ctx.consumed_restrictors.push(restrictor);
        Ok(())
    }
}

/// The restrictor was already removed from `sec_idx_restrictors` above; this
/// only clears a matching reference to it that the parser may also have left
/// inside the WHERE predicate tree as a plain comparison term, if present.
fn strip_restrictor_from_where(
    where_clause: &mut Option<BoolTerm>,
    _pos: usize,
    restrictor: &query_ir::SecIdxRestrictor,
) {
    let Some(term) = where_clause else { return };
    if let BoolTerm::BoolFactor(factors) = term {
        factors.retain(|f| !matches!(f, BoolFactorTerm::CompPredicate(p)
            if matches!(&p.lhs.core, query_ir::ValueExprCore::Column(c) if c.column == restrictor.column())));
        if factors.is_empty() {
            *where_clause = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use css::test_fixtures::sample_snapshot;
    use query_ir::{CompOp, SecIdxRestrictor, TableRef};

    #[test]
    fn director_key_restrictor_becomes_a_lookup() {
        let facade = Facade::new(sample_snapshot()).unwrap();
        let mut stmt = SelectStmt::new();
        stmt.from.push(TableRef::new("Object").with_db("LSST"));
        stmt.dominant_db = Some("LSST".to_string());
        stmt.sec_idx_restrictors.push(SecIdxRestrictor::Compare {
            column: "objectId".into(),
            op: CompOp::Eq,
            value: "12345".into(),
        });
        let mut ctx = QueryContext::new(20, 10);

        DirectorIndexPlugin.apply(&mut stmt, &mut ctx, &facade).unwrap();

        assert!(stmt.sec_idx_restrictors.is_empty());
        match &ctx.chunk_enumeration {
            ChunkEnumeration::DirectorIndexLookup { key_value, key_column, .. } => {
                assert_eq!(key_value, "12345");
                assert_eq!(key_column, "objectId");
            }
            other => panic!("expected a director index lookup, got {other:?}"),
        }
        assert_eq!(ctx.consumed_restrictors.len(), 1);
    }

    #[test]
    fn non_director_restrictor_is_left_untouched() {
        let facade = Facade::new(sample_snapshot()).unwrap();
        let mut stmt = SelectStmt::new();
        stmt.from.push(TableRef::new("Filter").with_db("LSST"));
        stmt.dominant_db = Some("LSST".to_string());
        stmt.sec_idx_restrictors.push(SecIdxRestrictor::Compare {
            column: "filterId".into(),
            op: CompOp::Eq,
            value: "1".into(),
        });
        let mut ctx = QueryContext::new(20, 10);

        DirectorIndexPlugin.apply(&mut stmt, &mut ctx, &facade).unwrap();

        assert_eq!(stmt.sec_idx_restrictors.len(), 1);
        assert_eq!(ctx.chunk_enumeration, ChunkEnumeration::AllChunks);
    }
}
