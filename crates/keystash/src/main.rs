//! Keystash CLI - session auth state in object storage
//!
//! This is the main entry point for the keystash command-line interface.

mod cli;
mod commands;
mod output;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose, cli.quiet);

    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Init(args) => commands::init::run(args, config_path, &cli.store).await,
        Commands::Creds(args) => commands::creds::run(args, config_path, &cli.store).await,
        Commands::Keys(args) => commands::keys::run(args, config_path, &cli.store).await,
        Commands::ObjectKey(args) => commands::object_key::run(args, config_path, &cli.store),
    }
}

/// Initialize tracing with appropriate verbosity
fn init_tracing(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            // Store round-trips log at debug, so -v shows every object touched
            0 => EnvFilter::new("info"),
            1 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}
