//! devstats CLI entry point

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod args;
mod commands;
mod config;
mod server;
mod wiring;

use args::{Cli, Commands};
use config::AppConfig;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let loaded = AppConfig::load(cli.config.as_deref());

    // --log-level beats the config file; RUST_LOG beats both
    let log_level = cli
        .log_level
        .clone()
        .or_else(|| loaded.as_ref().ok().map(|c| c.general.log_level.clone()))
        .unwrap_or_else(|| "info".to_string());
    init_logging(&log_level)?;

    match cli.command {
        Commands::Config(args) => commands::config::execute(args).await,
        Commands::Doctor(args) => commands::doctor::execute(args, cli.config).await,
        Commands::Serve(args) => commands::serve::execute(args, loaded?).await,
        Commands::Fetch(args) => commands::fetch::execute(args, loaded?).await,
        Commands::Aggregate(args) => commands::aggregate::execute(args, loaded?).await,
        Commands::Handles(args) => commands::handles::execute(args, loaded?).await,
    }
}

fn init_logging(level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(level))?;

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(filter)
        .init();

    Ok(())
}
