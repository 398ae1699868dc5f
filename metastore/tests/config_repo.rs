//! Integration tests against a real Postgres instance. Skipped unless
//! `TEST_DATABASE_URL` is set, matching the surrounding workspace's
//! convention for tests that need a live database.

use metastore::Metastore;
use qmeta_types::{DbEndpoint, Endpoint, StagingEndpoint, Worker, WorkerName};
use sqlx::postgres::PgPoolOptions;

async fn maybe_connect() -> Option<Metastore> {
    let url = std::env::var("TEST_DATABASE_URL").ok()?;
    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&url)
        .await
        .expect("connect to TEST_DATABASE_URL");
    Some(Metastore::from_pool(pool))
}

fn sample_worker(name: &str) -> Worker {
    Worker {
        name: WorkerName::new(name),
        is_enabled: true,
        is_read_only: false,
        svc: Endpoint {
            host: "worker-host".into(),
            port: 25000,
        },
        fs: Endpoint {
            host: "worker-host".into(),
            port: 25001,
        },
        db: DbEndpoint {
            host: "worker-host".into(),
            port: 3306,
            user: "qsmaster".into(),
        },
        loader: StagingEndpoint {
            host: "worker-host".into(),
            port: 25002,
            tmp_dir: "/tmp/loader".into(),
        },
        exporter: StagingEndpoint {
            host: "worker-host".into(),
            port: 25003,
            tmp_dir: "/tmp/exporter".into(),
        },
        http_loader: StagingEndpoint {
            host: "worker-host".into(),
            port: 25004,
            tmp_dir: "/tmp/http-loader".into(),
        },
        data_dir: "/data/worker".into(),
    }
}

#[tokio::test]
async fn add_and_fetch_worker_round_trips() {
    let Some(store) = maybe_connect().await else {
        eprintln!("skipping: TEST_DATABASE_URL not set");
        return;
    };
    let worker = sample_worker("worker_test_round_trip");
    store.config().add_worker(&worker).await.unwrap();
    let fetched = store.config().get_worker(worker.name.as_str()).await.unwrap();
    assert_eq!(fetched, worker);
    store
        .config()
        .delete_worker(worker.name.as_str())
        .await
        .unwrap();
}

#[tokio::test]
async fn deleting_unknown_worker_is_an_error() {
    let Some(store) = maybe_connect().await else {
        eprintln!("skipping: TEST_DATABASE_URL not set");
        return;
    };
    let err = store.config().delete_worker("definitely-not-a-worker").await;
    assert!(err.is_err());
}
