//! Super-transaction registry (C9): named-mutex serialized `begin`, the
//! `IS_STARTING → STARTED → {IS_FINISHING, IS_ABORTING} → {FINISHED,
//! ABORTED}` state machine (with `*_FAILED` dead ends), and the append-only
//! contribution audit.
#![deny(rustdoc::broken_intra_doc_links, rustdoc::bare_urls, rust_2018_idioms)]
#![warn(missing_debug_implementations, clippy::explicit_iter_loop, clippy::use_self)]

mod error;
mod registry;
mod transitions;

pub use error::{Error, Result};
pub use registry::Registry;
pub use transitions::is_valid_transition;
