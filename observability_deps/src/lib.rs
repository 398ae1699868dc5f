//! A re-export of the `tracing` crate so that every workspace member links
//! against the same version and nobody needs to depend on `tracing` directly.
//!
//! Every log statement in this workspace goes through `observability_deps::tracing`
//! rather than `println!`/`eprintln!`, so output is structured and leveled and
//! can be routed through [`logfmt`] or JSON by the binary's CLI flags.
#![deny(rustdoc::broken_intra_doc_links, rustdoc::bare_urls, rust_2018_idioms)]

pub use tracing;
