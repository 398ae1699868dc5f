//! `sqlx::Pool` does not support rotating connection credentials in place
//! (e.g. a managed-Postgres password rotation). [`HotSwapPool`] wraps a pool
//! behind an [`ArcSwap`] so `czar_config` can build a brand-new pool with
//! fresh [`sqlx::postgres::PgConnectOptions`] and publish it atomically,
//! without restarting the process or blocking in-flight queries against the
//! old pool.
#![deny(rustdoc::broken_intra_doc_links, rustdoc::bare_urls, rust_2018_idioms)]
#![warn(missing_debug_implementations, clippy::explicit_iter_loop, clippy::use_self)]

use std::sync::Arc;

use arc_swap::ArcSwap;
use sqlx::{postgres::PgConnectOptions, Pool, Postgres};

/// A `Pool<Postgres>` whose underlying pool can be swapped out atomically.
#[derive(Debug)]
pub struct HotSwapPool {
    current: ArcSwap<Pool<Postgres>>,
}

impl HotSwapPool {
    /// Wrap an existing pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            current: ArcSwap::from_pointee(pool),
        }
    }

    /// The currently active pool. Cheap (`Arc` clone); callers should grab
    /// this once per logical operation rather than holding it across a
    /// long-lived task, so a later swap takes effect for new work.
    pub fn pool(&self) -> Arc<Pool<Postgres>> {
        self.current.load_full()
    }

    /// Connect a fresh pool with `options` and publish it, replacing
    /// whatever pool was active. Existing connections already checked out
    /// from the old pool keep working until returned; new checkouts go
    /// through the new pool's options.
    pub async fn reconnect(&self, options: PgConnectOptions) -> Result<(), sqlx::Error> {
        let new_pool = Pool::<Postgres>::connect_with(options).await?;
        self.current.store(Arc::new(new_pool));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // No live Postgres in unit tests; this exercises only the swap bookkeeping.
    #[test]
    fn pool_handle_is_cheap_to_clone_repeatedly() {
        // Constructing a real `Pool` requires a runtime + connection, so this
        // test is limited to checking `ArcSwap` wiring compiles and the type
        // is `Send + Sync` as required by every caller that shares it across
        // tasks (`static_assertions`-style check without the extra dep).
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<HotSwapPool>();
    }
}
