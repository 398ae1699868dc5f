//! Chunk dispatcher (Executive, C5) and result merger (C6): the per-query
//! Job/UberJob state machines, deterministic worker assignment, retry on
//! worker loss, squash, LIMIT early termination, progress sampling, and
//! single-writer result merge with `(queryId, jobId, attemptNumber)`
//! fingerprinting.
#![deny(rustdoc::broken_intra_doc_links, rustdoc::bare_urls, rust_2018_idioms)]
#![warn(missing_debug_implementations, clippy::explicit_iter_loop, clippy::use_self)]

mod dispatch;
mod executive;
mod locator;
mod merger;
mod progress;

pub use dispatch::{cancel, run_to_completion, UberJobResult, WorkerChannel};
pub use executive::{Executive, ExecutiveConfig, ExecutiveStats, RetryAction};
pub use locator::{ChunkLocator, StaticLocator};
pub use merger::{MergeOutcome, ResultMerger};
pub use progress::{ProgressCounters, ProgressSnapshot};
