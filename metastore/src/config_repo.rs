//! `config_param`, `config_worker`, `config_database_family`,
//! `config_database`, `config_table`.

use qmeta_types::{Database, Family, ParamSchema, ParamType, Worker, WorkerName, WorkerUpdate};
use sqlx::{types::Json, FromRow};
use sqlx_hotswap_pool::HotSwapPool;

use crate::error::{self, Result};

#[derive(Debug)]
pub struct ConfigRepo<'a> {
    pool: &'a HotSwapPool,
}

#[derive(FromRow)]
struct ParamRow {
    category: String,
    param: String,
    value_type: String,
    default_value: String,
    description: String,
    read_only: bool,
    security_context: bool,
}

impl From<ParamRow> for ParamSchema {
    fn from(r: ParamRow) -> Self {
        let value_type = match r.value_type.as_str() {
            "int" => ParamType::Int,
            "float" => ParamType::Float,
            "bool" => ParamType::Bool,
            _ => ParamType::String,
        };
        Self {
            category: r.category,
            param: r.param,
            value_type,
            default: r.default_value,
            description: r.description,
            read_only: r.read_only,
            security_context: r.security_context,
        }
    }
}

#[derive(FromRow)]
struct WorkerRow {
    name: String,
    is_enabled: bool,
    is_read_only: bool,
    svc: Json<qmeta_types::Endpoint>,
    fs: Json<qmeta_types::Endpoint>,
    db: Json<qmeta_types::DbEndpoint>,
    loader: Json<qmeta_types::StagingEndpoint>,
    exporter: Json<qmeta_types::StagingEndpoint>,
    http_loader: Json<qmeta_types::StagingEndpoint>,
    data_dir: String,
}

impl From<WorkerRow> for Worker {
    fn from(r: WorkerRow) -> Self {
        Self {
            name: WorkerName::new(r.name),
            is_enabled: r.is_enabled,
            is_read_only: r.is_read_only,
            svc: r.svc.0,
            fs: r.fs.0,
            db: r.db.0,
            loader: r.loader.0,
            exporter: r.exporter.0,
            http_loader: r.http_loader.0,
            data_dir: r.data_dir,
        }
    }
}

#[derive(FromRow)]
struct FamilyRow {
    name: String,
    replication_level: i32,
    num_stripes: i32,
    num_sub_stripes: i32,
    overlap: f64,
}

impl From<FamilyRow> for Family {
    fn from(r: FamilyRow) -> Self {
        Self {
            name: r.name,
            replication_level: r.replication_level as u32,
            num_stripes: r.num_stripes as u32,
            num_sub_stripes: r.num_sub_stripes as u32,
            overlap: r.overlap,
        }
    }
}

#[derive(FromRow)]
struct DatabaseRow {
    name: String,
    family: String,
    is_published: bool,
    partitioned_tables: Vec<String>,
    regular_tables: Vec<String>,
    director_table: Option<String>,
    director_table_key: Option<String>,
    chunk_id_col_name: String,
    sub_chunk_id_col_name: String,
    columns: Json<std::collections::BTreeMap<String, Vec<qmeta_types::ColumnDef>>>,
}

impl From<DatabaseRow> for Database {
    fn from(r: DatabaseRow) -> Self {
        Self {
            name: r.name,
            family: r.family,
            is_published: r.is_published,
            partitioned_tables: r.partitioned_tables,
            regular_tables: r.regular_tables,
            director_table: r.director_table,
            director_table_key: r.director_table_key,
            chunk_id_col_name: r.chunk_id_col_name,
            sub_chunk_id_col_name: r.sub_chunk_id_col_name,
            columns: r.columns.0,
        }
    }
}

impl<'a> ConfigRepo<'a> {
    pub(crate) fn new(pool: &'a HotSwapPool) -> Self {
        Self { pool }
    }

    pub async fn list_params(&self, category: Option<&str>) -> Result<Vec<ParamSchema>> {
        let rows: Vec<ParamRow> = sqlx::query_as(
            "SELECT category, param, value_type, default_value, description, read_only, \
             security_context FROM config_param WHERE $1::text IS NULL OR category = $1",
        )
        .bind(category)
        .fetch_all(self.pool.pool().as_ref())
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    pub async fn set_param(&self, category: &str, param: &str, value: &str) -> Result<()> {
        sqlx::query(
            "UPDATE config_param SET default_value = $3 WHERE category = $1 AND param = $2",
        )
        .bind(category)
        .bind(param)
        .bind(value)
        .execute(self.pool.pool().as_ref())
        .await?;
        Ok(())
    }

    pub async fn list_workers(&self) -> Result<Vec<Worker>> {
        let rows: Vec<WorkerRow> = sqlx::query_as(
            "SELECT name, is_enabled, is_read_only, svc, fs, db, loader, exporter, \
             http_loader, data_dir FROM config_worker ORDER BY name",
        )
        .fetch_all(self.pool.pool().as_ref())
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    pub async fn get_worker(&self, name: &str) -> Result<Worker> {
        let row: Option<WorkerRow> = sqlx::query_as(
            "SELECT name, is_enabled, is_read_only, svc, fs, db, loader, exporter, \
             http_loader, data_dir FROM config_worker WHERE name = $1",
        )
        .bind(name)
        .fetch_optional(self.pool.pool().as_ref())
        .await?;
        row.map(Into::into)
            .ok_or_else(|| error::NoSuchWorkerSnafu { name }.build())
    }

    pub async fn add_worker(&self, worker: &Worker) -> Result<()> {
        sqlx::query(
            "INSERT INTO config_worker (name, is_enabled, is_read_only, svc, fs, db, loader, \
             exporter, http_loader, data_dir) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10)",
        )
        .bind(worker.name.as_str())
        .bind(worker.is_enabled)
        .bind(worker.is_read_only)
        .bind(Json(&worker.svc))
        .bind(Json(&worker.fs))
        .bind(Json(&worker.db))
        .bind(Json(&worker.loader))
        .bind(Json(&worker.exporter))
        .bind(Json(&worker.http_loader))
        .bind(&worker.data_dir)
        .execute(self.pool.pool().as_ref())
        .await?;
        Ok(())
    }

    /// Partial update — tri-state fields already collapsed to `Option` by
    /// the caller (`czar_config`), `None` fields are left untouched.
    pub async fn update_worker(&self, name: &str, update: &WorkerUpdate) -> Result<()> {
        let existing = self.get_worker(name).await?;
        let merged = Worker {
            name: existing.name,
            is_enabled: update.is_enabled.unwrap_or(existing.is_enabled),
            is_read_only: update.is_read_only.unwrap_or(existing.is_read_only),
            svc: update.svc.clone().unwrap_or(existing.svc),
            fs: update.fs.clone().unwrap_or(existing.fs),
            db: update.db.clone().unwrap_or(existing.db),
            loader: update.loader.clone().unwrap_or(existing.loader),
            exporter: update.exporter.clone().unwrap_or(existing.exporter),
            http_loader: update.http_loader.clone().unwrap_or(existing.http_loader),
            data_dir: update.data_dir.clone().unwrap_or(existing.data_dir),
        };
        sqlx::query(
            "UPDATE config_worker SET is_enabled=$2, is_read_only=$3, svc=$4, fs=$5, db=$6, \
             loader=$7, exporter=$8, http_loader=$9, data_dir=$10 WHERE name=$1",
        )
        .bind(name)
        .bind(merged.is_enabled)
        .bind(merged.is_read_only)
        .bind(Json(&merged.svc))
        .bind(Json(&merged.fs))
        .bind(Json(&merged.db))
        .bind(Json(&merged.loader))
        .bind(Json(&merged.exporter))
        .bind(Json(&merged.http_loader))
        .bind(&merged.data_dir)
        .execute(self.pool.pool().as_ref())
        .await?;
        Ok(())
    }

    /// Removes the worker row. The spec leaves replica metadata for the
    /// deleted worker's name in place rather than cascading the delete, so
    /// readmitting the same name later sees its prior replica history.
    pub async fn delete_worker(&self, name: &str) -> Result<()> {
        let result = sqlx::query("DELETE FROM config_worker WHERE name = $1")
            .bind(name)
            .execute(self.pool.pool().as_ref())
            .await?;
        if result.rows_affected() == 0 {
            return error::NoSuchWorkerSnafu { name }.fail();
        }
        Ok(())
    }

    pub async fn list_families(&self) -> Result<Vec<Family>> {
        let rows: Vec<FamilyRow> = sqlx::query_as(
            "SELECT name, replication_level, num_stripes, num_sub_stripes, overlap \
             FROM config_database_family ORDER BY name",
        )
        .fetch_all(self.pool.pool().as_ref())
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    pub async fn add_family(&self, family: &Family) -> Result<()> {
        sqlx::query(
            "INSERT INTO config_database_family (name, replication_level, num_stripes, \
             num_sub_stripes, overlap) VALUES ($1,$2,$3,$4,$5)",
        )
        .bind(&family.name)
        .bind(family.replication_level as i32)
        .bind(family.num_stripes as i32)
        .bind(family.num_sub_stripes as i32)
        .bind(family.overlap)
        .execute(self.pool.pool().as_ref())
        .await?;
        Ok(())
    }

    /// Cascades to the family's databases and their replica records, per
    /// the catalog invariant that a family's lifetime bounds its databases'.
    pub async fn delete_family(&self, name: &str) -> Result<()> {
        let mut txn = self.pool.pool().begin().await?;
        sqlx::query("DELETE FROM replica WHERE database IN (SELECT name FROM config_database WHERE family = $1)")
            .bind(name)
            .execute(&mut txn)
            .await?;
        sqlx::query("DELETE FROM config_database WHERE family = $1")
            .bind(name)
            .execute(&mut txn)
            .await?;
        let result = sqlx::query("DELETE FROM config_database_family WHERE name = $1")
            .bind(name)
            .execute(&mut txn)
            .await?;
        if result.rows_affected() == 0 {
            return error::NoSuchFamilySnafu { name }.fail();
        }
        txn.commit().await?;
        Ok(())
    }

    pub async fn list_databases(&self) -> Result<Vec<Database>> {
        let rows: Vec<DatabaseRow> = sqlx::query_as(
            "SELECT name, family, is_published, partitioned_tables, regular_tables, \
             director_table, director_table_key, chunk_id_col_name, sub_chunk_id_col_name, \
             columns FROM config_database ORDER BY name",
        )
        .fetch_all(self.pool.pool().as_ref())
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    pub async fn get_database(&self, name: &str) -> Result<Database> {
        let row: Option<DatabaseRow> = sqlx::query_as(
            "SELECT name, family, is_published, partitioned_tables, regular_tables, \
             director_table, director_table_key, chunk_id_col_name, sub_chunk_id_col_name, \
             columns FROM config_database WHERE name = $1",
        )
        .bind(name)
        .fetch_optional(self.pool.pool().as_ref())
        .await?;
        row.map(Into::into)
            .ok_or_else(|| error::NoSuchDatabaseSnafu { name }.build())
    }

    pub async fn add_database(&self, database: &Database) -> Result<()> {
        sqlx::query(
            "INSERT INTO config_database (name, family, is_published, partitioned_tables, \
             regular_tables, director_table, director_table_key, chunk_id_col_name, \
             sub_chunk_id_col_name, columns) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10)",
        )
        .bind(&database.name)
        .bind(&database.family)
        .bind(database.is_published)
        .bind(&database.partitioned_tables)
        .bind(&database.regular_tables)
        .bind(&database.director_table)
        .bind(&database.director_table_key)
        .bind(&database.chunk_id_col_name)
        .bind(&database.sub_chunk_id_col_name)
        .bind(Json(&database.columns))
        .execute(self.pool.pool().as_ref())
        .await?;
        Ok(())
    }

    pub async fn set_published(&self, name: &str, published: bool) -> Result<()> {
        let result = sqlx::query("UPDATE config_database SET is_published = $2 WHERE name = $1")
            .bind(name)
            .bind(published)
            .execute(self.pool.pool().as_ref())
            .await?;
        if result.rows_affected() == 0 {
            return error::NoSuchDatabaseSnafu { name }.fail();
        }
        Ok(())
    }
}
