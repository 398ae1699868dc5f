//! The query intermediate representation: a deep-copyable, mutable tree
//! the plugin pipeline (C3) rewrites in place, plus the [`QueryTemplate`]
//! renderer that turns a rewritten [`SelectStmt`] fragment back into SQL
//! text for dispatch to a specific chunk.
//!
//! Parsing SQL text into this IR is an external collaborator's job — only
//! the shape the rewriter consumes is defined here.
#![deny(rustdoc::broken_intra_doc_links, rustdoc::bare_urls, rust_2018_idioms)]
#![warn(missing_debug_implementations, clippy::explicit_iter_loop, clippy::use_self)]

mod bool_term;
mod column_ref;
mod restrictor;
mod select_stmt;
mod template;
mod value_expr;

pub use bool_term::{BetweenPredicate, BoolFactorTerm, BoolTerm, CompOp, CompPredicate, NullPredicate};
pub use column_ref::ColumnRef;
pub use restrictor::{AreaRestrictor, SecIdxRestrictor};
pub use select_stmt::{SelectStmt, TableRef};
pub use template::{ChunkContext, QueryTemplate};
pub use value_expr::{ValueExpr, ValueExprCore};
