//! Versioned JSON REST control surface (C10): §4.10's configuration,
//! replication and ingest endpoints over hand-rolled `hyper` routing, plus
//! the `/meta` routes ambient observability always carries. Handlers are
//! thin — parse request JSON, call one [`czar_config::ConfigService`]/
//! [`trans::Registry`]/[`replica_control::Controller`] method, serialize
//! the result — the embedded HTTP framework itself is the one piece the
//! spec treats as an external collaborator, not the I/O around it.
#![deny(rustdoc::broken_intra_doc_links, rustdoc::bare_urls, rust_2018_idioms)]
#![warn(missing_debug_implementations, clippy::explicit_iter_loop, clippy::use_self)]

mod auth;
mod body;
mod error;
mod routes;
mod server;
mod state;
mod version;

pub use error::{Error, Result};
pub use server::serve;
pub use state::{AppState, AuthType};
pub use version::API_VERSION;
