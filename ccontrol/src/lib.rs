//! User-query session (C4): `submit()`/`join()`/`kill()`/`discard()`, the
//! proxy-visible `getResultQuery()` string, and the weak-referenced map of
//! in-flight sessions the czar process owns.
#![deny(rustdoc::broken_intra_doc_links, rustdoc::bare_urls, rust_2018_idioms)]
#![warn(missing_debug_implementations, clippy::explicit_iter_loop, clippy::use_self)]

mod error;
mod registry;
mod result_db;
mod service;
mod session;

pub use error::{Error, Result};
pub use registry::SessionRegistry;
pub use result_db::{
    create_message_table_sql, create_result_table_sql, lock_message_table_sql, result_query,
    unlock_tables_sql, ResultDbExecutor,
};
pub use service::SessionService;
pub use session::UserQuery;
