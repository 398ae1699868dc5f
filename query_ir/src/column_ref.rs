//! A possibly-qualified column reference, e.g. `LSST.Object.objectId`.

use crate::template::QueryTemplate;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnRef {
    pub db: Option<String>,
    pub table: Option<String>,
    pub column: String,
}

impl ColumnRef {
    pub fn unqualified(column: impl Into<String>) -> Self {
        Self {
            db: None,
            table: None,
            column: column.into(),
        }
    }

    pub fn qualified(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            db: None,
            table: Some(table.into()),
            column: column.into(),
        }
    }

    /// `db.table.col`, `table.col`, or `col`, normalized to the most
    /// qualified form the table plugin has resolved so far.
    pub fn render_to(&self, qt: &mut QueryTemplate) {
        if let Some(db) = &self.db {
            qt.push_literal(db);
            qt.push_literal(".");
        }
        if let Some(table) = &self.table {
            qt.push_literal(table);
            qt.push_literal(".");
        }
        qt.push_literal(&self.column);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_fully_qualified_reference() {
        let col = ColumnRef {
            db: Some("LSST".into()),
            table: Some("Object".into()),
            column: "objectId".into(),
        };
        let mut qt = QueryTemplate::new();
        col.render_to(&mut qt);
        assert_eq!(qt.render_plain(), "LSST.Object.objectId");
    }
}
