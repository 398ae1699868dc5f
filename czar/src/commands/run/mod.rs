mod czar;
mod worker_sim;

use snafu::{ResultExt, Snafu};
use trogging::cli::LoggingConfig;

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("error in czar subcommand: {source}"))]
    Czar { source: czar::Error },

    #[snafu(display("error in worker-sim subcommand: {source}"))]
    WorkerSim { source: worker_sim::Error },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, clap::Parser)]
pub struct Config {
    #[clap(subcommand)]
    command: Command,
}

impl Config {
    pub fn logging_config(&self) -> &LoggingConfig {
        match &self.command {
            Command::Czar(config) => &config.logging_config,
            Command::WorkerSim(config) => &config.logging_config,
        }
    }
}

#[derive(Debug, clap::Parser)]
enum Command {
    /// Run the czar coordinator itself.
    Czar(czar::Config),

    /// Run an in-memory worker stub for local/integration testing of the
    /// dispatcher without a real Qserv worker.
    WorkerSim(worker_sim::Config),
}

pub async fn command(config: Config) -> Result<()> {
    match config.command {
        Command::Czar(config) => czar::command(config).await.context(CzarSnafu),
        Command::WorkerSim(config) => worker_sim::command(config).await.context(WorkerSimSnafu),
    }
}
