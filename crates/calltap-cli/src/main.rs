mod catalog;
mod cli;
mod commands;
mod config;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    calltap_runtime::init_logging();

    // Parse CLI args
    let cli = Cli::parse();

    // Handle init command early (doesn't need config)
    if let Commands::Init { path } = &cli.command {
        return commands::init::run_init(path);
    }

    // Load config
    let config = config::load_config(cli.config.as_deref())?;

    // Dispatch to command
    match cli.command {
        Commands::Init { .. } => {
            // Already handled above
            unreachable!()
        }
        Commands::Drill { only } => {
            commands::drill::execute(only, &config).await?;
        }
        Commands::Asset { path, prod } => {
            commands::asset::execute(&path, prod, &config)?;
        }
    }

    Ok(())
}
