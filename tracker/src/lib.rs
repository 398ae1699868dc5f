//! Concurrency primitives shared across the `czar` workspace.
#![deny(rustdoc::broken_intra_doc_links, rustdoc::bare_urls, rust_2018_idioms)]
#![warn(
    missing_debug_implementations,
    clippy::explicit_iter_loop,
    clippy::use_self,
    clippy::clone_on_ref_ptr,
    clippy::future_not_send
)]

mod named_mutex;
mod tracked_future;

pub use named_mutex::*;
pub use tracked_future::*;
