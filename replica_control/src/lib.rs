//! Replica/request control plane (C8): the `Request`/`Job` state
//! machines, the six job types of §4.8's table, the health monitor, the
//! in-memory replica index (and the [`qdisp::ChunkLocator`] it backs),
//! and the [`Controller`] every HTTP handler and background task drives
//! through.
#![deny(rustdoc::broken_intra_doc_links, rustdoc::bare_urls, rust_2018_idioms)]
#![warn(missing_debug_implementations, clippy::explicit_iter_loop, clippy::use_self)]

mod controller;
mod error;
mod health;
mod job;
pub mod jobs;
mod replica_index;
mod request;

pub use controller::{job_succeeded, Controller};
pub use error::{Error, Result};
pub use health::HealthMonitor;
pub use job::{Job, JobReport, JobState};
pub use replica_index::{DatabaseLocator, ReplicaIndex};
pub use request::{Request, RequestState};
