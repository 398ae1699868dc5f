//! The top-level IR node a submitted query is turned into before the
//! plugin pipeline runs over it.

use crate::{
    bool_term::BoolTerm,
    restrictor::{AreaRestrictor, SecIdxRestrictor},
    template::QueryTemplate,
    value_expr::ValueExpr,
};

/// One entry in the FROM list, already or not-yet resolved to a concrete
/// `db.table` pair by the table plugin.
#[derive(Debug, Clone, PartialEq)]
pub struct TableRef {
    pub db: Option<String>,
    pub table: String,
    pub alias: Option<String>,
}

impl TableRef {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            db: None,
            table: table.into(),
            alias: None,
        }
    }

    pub fn with_db(mut self, db: impl Into<String>) -> Self {
        self.db = Some(db.into());
        self
    }
}

/// A deep-copyable, mutable representation of one `SELECT`, the unit the
/// plugin pipeline rewrites and the dispatcher renders per chunk.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectStmt {
    pub select_list: Vec<ValueExpr>,
    pub from: Vec<TableRef>,
    pub where_clause: Option<BoolTerm>,
    pub area_restrictors: Vec<AreaRestrictor>,
    pub sec_idx_restrictors: Vec<SecIdxRestrictor>,
    pub group_by: Vec<ValueExpr>,
    pub order_by: Vec<ValueExpr>,
    pub limit: Option<u64>,
    /// Set by the table plugin: the database most FROM-list tables belong
    /// to, used to resolve unqualified table names.
    pub dominant_db: Option<String>,
}

impl SelectStmt {
    pub fn new() -> Self {
        Self {
            select_list: Vec::new(),
            from: Vec::new(),
            where_clause: None,
            area_restrictors: Vec::new(),
            sec_idx_restrictors: Vec::new(),
            group_by: Vec::new(),
            order_by: Vec::new(),
            limit: None,
            dominant_db: None,
        }
    }

    /// Deep copy — every field here is owned, so `clone()` already gives
    /// plugins an independent mutable copy to rewrite.
    pub fn deep_copy(&self) -> Self {
        self.clone()
    }

    pub fn render_select_and_from(&self, qt: &mut QueryTemplate) {
        qt.push_literal("SELECT");
        for (i, expr) in self.select_list.iter().enumerate() {
            if i > 0 {
                qt.push_literal(",");
            }
            expr.render_to(qt);
        }
        qt.push_literal("FROM");
        for (i, t) in self.from.iter().enumerate() {
            if i > 0 {
                qt.push_literal(",");
            }
            if let Some(db) = &t.db {
                qt.push_literal(db);
                qt.push_literal(".");
            }
            qt.push_literal(&t.table);
            if let Some(alias) = &t.alias {
                qt.push_literal("AS").push_literal(alias);
            }
        }
    }

    pub fn render_where(&self, qt: &mut QueryTemplate) {
        if let Some(where_clause) = &self.where_clause {
            qt.push_literal("WHERE");
            where_clause.render_to(qt);
        }
    }
}

impl Default for SelectStmt {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column_ref::ColumnRef;

    #[test]
    fn renders_select_from_with_dominant_db_qualified_table() {
        let mut stmt = SelectStmt::new();
        stmt.select_list
            .push(ValueExpr::column(ColumnRef::unqualified("objectId")));
        stmt.from.push(TableRef::new("Object").with_db("LSST"));

        let mut qt = QueryTemplate::new();
        stmt.render_select_and_from(&mut qt);
        assert_eq!(qt.render_plain(), "SELECT objectId FROM LSST.Object");
    }

    #[test]
    fn deep_copy_is_independent_of_the_original() {
        let mut stmt = SelectStmt::new();
        stmt.from.push(TableRef::new("Object"));
        let mut copy = stmt.deep_copy();
        copy.from.push(TableRef::new("RefObject"));
        assert_eq!(stmt.from.len(), 1);
        assert_eq!(copy.from.len(), 2);
    }
}
