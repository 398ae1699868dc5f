//! Typed configuration service (§C7): parameter get/set with schema-driven
//! validation and access control, worker/family/database/table CRUD, and
//! the [`css::Facade`] this service is the sole writer of.
//!
//! Readers see an immutable snapshot; writers drain nothing (there is no
//! reader-blocking involved) but always persist through [`metastore`]
//! before publishing the new snapshot, so a crash between the two leaves
//! the database — not the in-memory view — as the source of truth on
//! restart.
#![deny(rustdoc::broken_intra_doc_links, rustdoc::bare_urls, rust_2018_idioms)]
#![warn(missing_debug_implementations, clippy::explicit_iter_loop, clippy::use_self)]

mod catalog_build;
mod error;
mod params;

pub use error::{Error, Result};
pub use params::ParamEntry;

use std::sync::Arc;

use css::Facade;
use metastore::Metastore;
use observability_deps::tracing::{info, warn};
use parking_lot::RwLock;
use params::ParamSnapshot;
use qmeta_types::{Database, Family, Worker, WorkerUpdate};

/// Owns the published [`css::Facade`] and the parameter image; every
/// mutation re-reads the full config set from [`Metastore`] and republishes
/// both in one step so the two never disagree about database contents.
#[derive(Debug)]
pub struct ConfigService {
    store: Metastore,
    facade: Facade,
    params: RwLock<Arc<ParamSnapshot>>,
}

impl ConfigService {
    /// Load the full configuration from `store` and publish the initial
    /// snapshot.
    pub async fn load(store: Metastore) -> Result<Self> {
        let schemas = store.config().list_params(None).await?;
        let params = RwLock::new(Arc::new(ParamSnapshot::from_schemas(schemas)));

        let databases = store.config().list_databases().await?;
        let families = store.config().list_families().await?;
        let facade = Facade::new(catalog_build::build_snapshot(&databases, &families))?;

        Ok(Self {
            store,
            facade,
            params,
        })
    }

    /// The read-only catalog view every other crate queries.
    pub fn catalog(&self) -> &Facade {
        &self.facade
    }

    pub fn get_param(&self, category: &str, param: &str) -> Result<String> {
        Ok(self.params.read().get(category, param)?.value.clone())
    }

    pub fn list_params(&self, category: Option<&str>) -> Vec<ParamEntry> {
        self.params
            .read()
            .list(category)
            .into_iter()
            .cloned()
            .collect()
    }

    pub async fn set_param(&self, category: &str, param: &str, value: &str) -> Result<()> {
        let next = self
            .params
            .read()
            .with_value(category, param, value.to_string())?;
        self.store.config().set_param(category, param, value).await?;
        *self.params.write() = Arc::new(next);
        info!(category, param, "configuration parameter updated");
        Ok(())
    }

    pub async fn list_workers(&self) -> Result<Vec<Worker>> {
        Ok(self.store.config().list_workers().await?)
    }

    pub async fn get_worker(&self, name: &str) -> Result<Worker> {
        Ok(self.store.config().get_worker(name).await?)
    }

    pub async fn add_worker(&self, worker: Worker) -> Result<()> {
        self.store.config().add_worker(&worker).await?;
        info!(worker = worker.name.as_str(), "worker registered");
        Ok(())
    }

    pub async fn update_worker(&self, name: &str, update: WorkerUpdate) -> Result<()> {
        self.store.config().update_worker(name, &update).await?;
        Ok(())
    }

    /// Removes the worker from the configuration. Per the catalog
    /// invariant, replica rows for this worker name are left in place.
    pub async fn delete_worker(&self, name: &str) -> Result<()> {
        self.store.config().delete_worker(name).await?;
        warn!(worker = name, "worker deleted");
        Ok(())
    }

    pub async fn add_family(&self, family: Family) -> Result<()> {
        self.store.config().add_family(&family).await?;
        self.republish_catalog().await
    }

    /// Cascades to the family's databases and their replicas.
    pub async fn delete_family(&self, name: &str) -> Result<()> {
        self.store.config().delete_family(name).await?;
        self.republish_catalog().await
    }

    pub async fn add_database(&self, database: Database) -> Result<()> {
        self.store.config().add_database(&database).await?;
        self.republish_catalog().await
    }

    pub async fn get_database(&self, name: &str) -> Result<Database> {
        Ok(self.store.config().get_database(name).await?)
    }

    pub async fn set_published(&self, name: &str, published: bool) -> Result<()> {
        self.store.config().set_published(name, published).await?;
        self.republish_catalog().await
    }

    async fn republish_catalog(&self) -> Result<()> {
        let databases = self.store.config().list_databases().await?;
        let families = self.store.config().list_families().await?;
        self.facade
            .reload(catalog_build::build_snapshot(&databases, &families))?;
        Ok(())
    }
}
