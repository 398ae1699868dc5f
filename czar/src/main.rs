//! The `czar` binary: CLI entry point (C13). Parses arguments, installs
//! logging, and dispatches to the `run`/`show` subcommand.

mod commands;
mod process_config;

use clap::Parser;
use observability_deps::tracing::error;

#[derive(Debug, Parser)]
#[clap(name = "czar", about = "Qserv-style distributed-query coordinator")]
struct Args {
    #[clap(subcommand)]
    command: commands::Command,
}

fn main() {
    dotenvy::dotenv().ok();

    let args = Args::parse();

    if let Some(logging_config) = args.command.logging_config() {
        if let Err(e) = logging_config.install() {
            eprintln!("error installing logging: {e}");
            std::process::exit(1);
        }
    }

    let runtime = tokio::runtime::Runtime::new().expect("failed to start tokio runtime");
    let result = runtime.block_on(commands::command(args.command));

    if let Err(e) = result {
        error!(%e, "command failed");
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
