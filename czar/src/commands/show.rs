//! `czar show config <path>`: parse a process config file and print it,
//! without starting anything — the fast path an operator uses to catch a
//! typo before it reaches a running coordinator.

use std::path::PathBuf;

use snafu::{ResultExt, Snafu};

use crate::process_config::{self, ProcessConfig};

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("{source}"))]
    Config { source: process_config::Error },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, clap::Parser)]
pub struct Config {
    /// Path to a process config file, in the `[ProcessConfig]` TOML shape.
    path: PathBuf,
}

pub fn command(config: Config) -> Result<()> {
    let process_config = ProcessConfig::load(&config.path).context(ConfigSnafu)?;
    println!("{process_config:#?}");
    Ok(())
}
