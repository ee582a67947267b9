//! leetpush CLI - Push accepted LeetCode solutions to GitHub
//!
//! Configure credentials once, then push files directly or watch a page
//! snapshot exported by the browser shim.

mod cli;
mod commands;
mod config_store;
mod error;
mod notifier;
mod secrets;
mod snapshot_host;

use clap::Parser;

use crate::cli::{Cli, Commands};
use crate::commands::completions::run_completions;
use crate::commands::config::run_config;
use crate::commands::inspect::run_inspect;
use crate::commands::push::run_push;
use crate::commands::test_connection::run_test_connection;
use crate::commands::watch::run_watch;
use crate::config_store::resolve_config_path;
use crate::error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    let directive = "leetpush=info"
        .parse()
        .map_err(|error| CliError::Config(format!("Invalid log directive: {error}")))?;
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(directive))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config_path = resolve_config_path(cli.config);

    match cli.command {
        Commands::Config { command } => run_config(command, &config_path)?,
        Commands::Push {
            problem,
            language,
            file,
        } => run_push(&config_path, &problem, &language, &file).await?,
        Commands::TestConnection => run_test_connection(&config_path).await?,
        Commands::Inspect { snapshot, json } => run_inspect(&snapshot, json)?,
        Commands::Watch { snapshot, poll_ms } => {
            run_watch(&config_path, &snapshot, poll_ms).await?;
        }
        Commands::Completions { shell, output } => {
            run_completions(shell, output.as_deref())?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests;
