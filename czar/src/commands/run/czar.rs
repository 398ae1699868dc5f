//! `czar run czar`: loads the process config, connects the metastore,
//! builds every C1–C16 component and serves the HTTP control surface
//! until the process receives a shutdown signal.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use czar_config::ConfigService;
use czar_time::SystemProvider;
use httpapi::AppState;
use metastore::Metastore;
use observability_deps::tracing::{info, warn};
use replica_control::{Controller, HealthMonitor};
use snafu::{ResultExt, Snafu};
use trogging::cli::LoggingConfig;
use worker_rpc::HttpTransport;

use crate::process_config::{self, ProcessConfig};

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("{source}"))]
    Config { source: process_config::Error },

    #[snafu(display("could not connect to the metastore: {source}"))]
    Connect { source: metastore::Error },

    #[snafu(display("could not load configuration service: {source}"))]
    Load { source: czar_config::Error },

    #[snafu(display("http server error: {source}"))]
    Serve { source: hyper::Error },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, clap::Parser)]
pub struct Config {
    /// Path to a process config file.
    #[clap(long = "config", env = "CZAR_CONFIG")]
    config_path: PathBuf,

    #[clap(flatten)]
    pub(crate) logging_config: LoggingConfig,
}

/// Worker RPC request timeout. Not currently a process-config knob: every
/// job type shares it, and no deployment in this workspace has needed to
/// tune it independently of `evict_timeout_secs`.
const WORKER_RPC_TIMEOUT: Duration = Duration::from_secs(10);
const HEALTH_PROBE_INTERVAL: Duration = Duration::from_secs(10);

pub async fn command(config: Config) -> Result<()> {
    let process_config = ProcessConfig::load(&config.config_path).context(ConfigSnafu)?;

    let store = Metastore::connect(process_config.pg_connect_options())
        .await
        .context(ConnectSnafu)?;
    let config_service = Arc::new(ConfigService::load(store.clone()).await.context(LoadSnafu)?);

    let time = Arc::new(SystemProvider::new());
    let transactions = Arc::new(trans::Registry::new(store.clone(), time.clone()));
    let transport: Arc<dyn worker_rpc::WorkerTransport> = Arc::new(HttpTransport::new(WORKER_RPC_TIMEOUT));
    let controller = Arc::new(Controller::new(
        store.clone(),
        Arc::clone(&config_service),
        Arc::clone(&transactions),
        Arc::clone(&transport),
        time.clone(),
    ));
    let evict_timeout = Duration::from_secs(process_config.evict_timeout_secs);
    let health_monitor = Arc::new(HealthMonitor::new(time, evict_timeout));
    tokio::spawn(health_probe_loop(Arc::clone(&config_service), transport, health_monitor));

    let state = AppState {
        config: config_service,
        transactions,
        controller,
        metrics: metric::Registry::new(),
        auth_token: process_config.auth_token.clone(),
    };

    let addr = process_config.bind_socket_addr().context(ConfigSnafu)?;
    info!(%addr, "starting czar");
    httpapi::serve(addr, state).await.context(ServeSnafu)
}

/// Probes worker reachability on a fixed interval for the lifetime of the
/// process. Eviction decisions are logged only: killing in-flight queries
/// against an evicted worker is `Executive::kill_incomplete_uber_jobs_on_worker`'s
/// job, reachable once a session-submission path (the proxy protocol this
/// binary doesn't speak) is wired up to populate a `ccontrol::SessionRegistry`.
async fn health_probe_loop(
    config: Arc<ConfigService>,
    transport: Arc<dyn worker_rpc::WorkerTransport>,
    monitor: Arc<HealthMonitor>,
) {
    let mut ticker = tokio::time::interval(HEALTH_PROBE_INTERVAL);
    loop {
        ticker.tick().await;
        let workers = match config.list_workers().await {
            Ok(workers) => workers.into_iter().map(|w| w.name).collect(),
            Err(e) => {
                warn!(error = %e, "could not list workers for health probe");
                continue;
            }
        };
        let evicted = monitor.probe_once(transport.as_ref(), workers).await;
        for worker in evicted {
            warn!(%worker, "worker evicted by health monitor");
        }
    }
}
