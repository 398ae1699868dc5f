//! Renders an IR tree back to SQL text as a sequence of tokens, some of
//! which are chunk-scoped table-name placeholders resolved only once a
//! [`ChunkContext`] is known. Token-level spacing follows a single rule:
//! two adjacent identifier characters must be separated by a space;
//! punctuation need not be.

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Literal(String),
    ChunkTable { db: String, table: String },
    SubChunkTable { db: String, table: String },
    OverlapTable { db: String, table: String },
}

/// The chunk/sub-chunk numbers substituted into chunk-scoped placeholders
/// when a template is rendered for dispatch to a specific worker.
#[derive(Debug, Clone, Copy)]
pub struct ChunkContext {
    pub chunk_id: i32,
    pub sub_chunk_id: Option<i32>,
}

/// A deep-copyable, equality-comparable sequence of render tokens.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QueryTemplate {
    tokens: Vec<Token>,
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn needs_space(prev: &str, next: &str) -> bool {
    match (prev.chars().last(), next.chars().next()) {
        (Some(a), Some(b)) => is_ident_char(a) && is_ident_char(b),
        _ => false,
    }
}

impl QueryTemplate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_literal(&mut self, text: impl Into<String>) -> &mut Self {
        self.tokens.push(Token::Literal(text.into()));
        self
    }

    /// `<db>.<table>_<chunkId>`.
    pub fn push_chunk_table(&mut self, db: impl Into<String>, table: impl Into<String>) -> &mut Self {
        self.tokens.push(Token::ChunkTable {
            db: db.into(),
            table: table.into(),
        });
        self
    }

    /// `<db>.<table>_<chunkId>_<subChunkId>`.
    pub fn push_sub_chunk_table(
        &mut self,
        db: impl Into<String>,
        table: impl Into<String>,
    ) -> &mut Self {
        self.tokens.push(Token::SubChunkTable {
            db: db.into(),
            table: table.into(),
        });
        self
    }

    /// `Subchunks_<db>_<chunkId>.<table>_<chunkId>_<subChunkId>`, used for
    /// overlap joins.
    pub fn push_overlap_table(
        &mut self,
        db: impl Into<String>,
        table: impl Into<String>,
    ) -> &mut Self {
        self.tokens.push(Token::OverlapTable {
            db: db.into(),
            table: table.into(),
        });
        self
    }

    pub fn append(&mut self, other: &QueryTemplate) -> &mut Self {
        self.tokens.extend(other.tokens.iter().cloned());
        self
    }

    /// Render with no chunk context; panics if the template contains any
    /// chunk-scoped placeholder. Used for fragments known not to need one
    /// (e.g. a bare column reference in a unit test).
    pub fn render_plain(&self) -> String {
        self.render_with(None)
    }

    pub fn render(&self, ctx: ChunkContext) -> String {
        self.render_with(Some(ctx))
    }

    fn render_with(&self, ctx: Option<ChunkContext>) -> String {
        let mut out = String::new();
        for token in &self.tokens {
            let piece = match token {
                Token::Literal(s) => s.clone(),
                Token::ChunkTable { db, table } => {
                    let ctx = ctx.expect("chunk-scoped template rendered without a ChunkContext");
                    format!("{db}.{table}_{}", ctx.chunk_id)
                }
                Token::SubChunkTable { db, table } => {
                    let ctx = ctx.expect("chunk-scoped template rendered without a ChunkContext");
                    let sub = ctx
                        .sub_chunk_id
                        .expect("sub-chunk table rendered without a sub_chunk_id");
                    format!("{db}.{table}_{}_{}", ctx.chunk_id, sub)
                }
                Token::OverlapTable { db, table } => {
                    let ctx = ctx.expect("chunk-scoped template rendered without a ChunkContext");
                    let sub = ctx
                        .sub_chunk_id
                        .expect("overlap table rendered without a sub_chunk_id");
                    format!(
                        "Subchunks_{db}_{}.{table}_{}_{}",
                        ctx.chunk_id, ctx.chunk_id, sub
                    )
                }
            };
            if let Some(last) = out.chars().last() {
                if needs_space(&last.to_string(), &piece) {
                    out.push(' ');
                }
            }
            out.push_str(&piece);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adjacent_identifiers_get_a_separating_space() {
        let mut qt = QueryTemplate::new();
        qt.push_literal("SELECT").push_literal("objectId");
        assert_eq!(qt.render_plain(), "SELECT objectId");
    }

    #[test]
    fn punctuation_does_not_force_a_space() {
        let mut qt = QueryTemplate::new();
        qt.push_literal("objectId").push_literal(",").push_literal("ra");
        assert_eq!(qt.render_plain(), "objectId,ra");
    }

    #[test]
    fn chunk_table_placeholder_substitutes_chunk_id() {
        let mut qt = QueryTemplate::new();
        qt.push_chunk_table("LSST", "Object");
        let rendered = qt.render(ChunkContext {
            chunk_id: 42,
            sub_chunk_id: None,
        });
        assert_eq!(rendered, "LSST.Object_42");
    }

    #[test]
    fn overlap_table_placeholder_includes_subchunks_prefix() {
        let mut qt = QueryTemplate::new();
        qt.push_overlap_table("LSST", "Object");
        let rendered = qt.render(ChunkContext {
            chunk_id: 42,
            sub_chunk_id: Some(3),
        });
        assert_eq!(rendered, "Subchunks_LSST_42.Object_42_3");
    }

    #[test]
    #[should_panic(expected = "without a ChunkContext")]
    fn chunk_placeholder_without_context_panics() {
        let mut qt = QueryTemplate::new();
        qt.push_chunk_table("LSST", "Object");
        qt.render_plain();
    }
}
