pub(crate) mod run;
mod show;

use snafu::{ResultExt, Snafu};
use trogging::cli::LoggingConfig;

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("error in run subcommand: {source}"))]
    Run { source: run::Error },

    #[snafu(display("error in show subcommand: {source}"))]
    Show { source: show::Error },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, clap::Parser)]
pub enum Command {
    /// Start a long-running service (the czar itself, or a worker stub).
    Run(run::Config),

    /// Validate and print a configuration file.
    Show(show::Config),
}

impl Command {
    /// `None` for subcommands (like `show`) that never install logging.
    pub fn logging_config(&self) -> Option<&LoggingConfig> {
        match self {
            Self::Run(config) => Some(config.logging_config()),
            Self::Show(_) => None,
        }
    }
}

pub async fn command(command: Command) -> Result<()> {
    match command {
        Command::Run(config) => run::command(config).await.context(RunSnafu),
        Command::Show(config) => show::command(config).context(ShowSnafu),
    }
}
