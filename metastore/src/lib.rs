//! The one crate that speaks SQL: a Postgres-backed repository for cluster
//! configuration, per-query metadata (`QInfo`/`QMessages`/`QProgress`),
//! super-transactions and contributions, and the controller event log.
//!
//! Every other crate that needs persisted state goes through a
//! [`Metastore`] handle rather than touching `sqlx` directly.
#![deny(rustdoc::broken_intra_doc_links, rustdoc::bare_urls, rust_2018_idioms)]
#![warn(missing_debug_implementations, clippy::explicit_iter_loop, clippy::use_self)]

mod config_repo;
mod error;
mod event_repo;
mod query_meta_repo;
mod transaction_repo;

pub use config_repo::ConfigRepo;
pub use error::{Error, Result};
pub use event_repo::{ControllerEvent, EventRepo};
pub use query_meta_repo::QueryMetaRepo;
pub use transaction_repo::TransactionRepo;

use std::sync::Arc;

use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx_hotswap_pool::HotSwapPool;

/// A connected handle to the metadata database. Cheap to clone; every repo
/// method borrows the pool fresh so a [`reconnect`](Metastore::reconnect)
/// takes effect for subsequent calls without invalidating this handle.
#[derive(Debug, Clone)]
pub struct Metastore {
    pool: Arc<HotSwapPool>,
}

impl Metastore {
    /// Connect using `options`, running no migrations — the schema is
    /// expected to already exist (versioned by an external migration tool,
    /// out of scope here).
    pub async fn connect(options: PgConnectOptions) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect_with(options)
            .await?;
        Ok(Self {
            pool: Arc::new(HotSwapPool::new(pool)),
        })
    }

    /// Wrap an already-open pool, e.g. one built against a test database.
    pub fn from_pool(pool: sqlx::Pool<sqlx::Postgres>) -> Self {
        Self {
            pool: Arc::new(HotSwapPool::new(pool)),
        }
    }

    /// Rotate connection credentials without restarting the process.
    pub async fn reconnect(&self, options: PgConnectOptions) -> Result<()> {
        self.pool.reconnect(options).await.map_err(Into::into)
    }

    pub fn config(&self) -> ConfigRepo<'_> {
        ConfigRepo::new(&self.pool)
    }

    pub fn query_meta(&self) -> QueryMetaRepo<'_> {
        QueryMetaRepo::new(&self.pool)
    }

    pub fn transactions(&self) -> TransactionRepo<'_> {
        TransactionRepo::new(&self.pool)
    }

    pub fn events(&self) -> EventRepo<'_> {
        EventRepo::new(&self.pool)
    }
}
