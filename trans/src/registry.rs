//! [`Registry`]: the service `czar`'s ingest endpoints and C8's
//! publish/un-publish steps go through for every super-transaction
//! operation.

use czar_time::SharedTimeProvider;
use metastore::Metastore;
use observability_deps::tracing::info;
use qmeta_types::{Contribution, Transaction, TransactionId, TransactionState};
use snafu::ensure;
use tracker::NamedMutexRegistry;

use crate::{
    error::{InvalidTransitionSnafu, Result},
    transitions::is_valid_transition,
};

#[derive(Debug)]
pub struct Registry {
    store: Metastore,
    database_locks: NamedMutexRegistry,
    time: SharedTimeProvider,
}

impl Registry {
    pub fn new(store: Metastore, time: SharedTimeProvider) -> Self {
        Self {
            store,
            database_locks: NamedMutexRegistry::new(),
            time,
        }
    }

    /// Acquires `"database:<db>"`, then inserts the row in `IS_STARTING` —
    /// the mutex only serializes the insert-and-uniqueness-check step
    /// against concurrent `begin_transaction` calls on the same database,
    /// consistent with the `at most one IS_STARTING per database at a
    /// time` invariant.
    pub async fn begin_transaction(&self, database: &str, context: Option<&str>) -> Result<Transaction> {
        let _lock = self.database_locks.lock(&format!("database:{database}")).await;
        let now_ms = self.time.now().timestamp_millis();
        let txn = self.store.transactions().begin(database, context, now_ms).await?;
        info!(transaction_id = %txn.id, %database, "transaction started");
        Ok(txn)
    }

    pub async fn update_transaction(&self, id: TransactionId, new_state: TransactionState) -> Result<Transaction> {
        let current = self.store.transactions().get(id).await?;
        ensure!(
            is_valid_transition(current.state, new_state),
            InvalidTransitionSnafu {
                id,
                from: current.state,
                to: new_state,
            }
        );
        let now_ms = self.time.now().timestamp_millis();
        self.store.transactions().update_state(id, new_state, now_ms).await?;
        self.store.transactions().get(id).await.map_err(Into::into)
    }

    pub async fn transaction(&self, id: TransactionId) -> Result<Transaction> {
        self.store.transactions().get(id).await.map_err(Into::into)
    }

    pub async fn transactions(&self, database: Option<&str>) -> Result<Vec<Transaction>> {
        self.store.transactions().list(database).await.map_err(Into::into)
    }

    pub async fn add_contribution(&self, contribution: &Contribution) -> Result<()> {
        self.store.transactions().add_contribution(contribution).await?;
        Ok(())
    }

    pub async fn contributions(&self, id: TransactionId) -> Result<Vec<Contribution>> {
        self.store.transactions().contributions(id).await.map_err(Into::into)
    }

    /// Whether `database` has any non-terminal transaction, the gate C8
    /// checks before un-publishing it.
    pub async fn blocks_unpublish(&self, database: &str) -> Result<bool> {
        self.store.transactions().has_active(database).await.map_err(Into::into)
    }
}
