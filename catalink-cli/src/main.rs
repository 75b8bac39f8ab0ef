// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! catalink CLI entry point

use clap::Parser;

mod cli;
use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse command line arguments first to get log level
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        log::LevelFilter::Debug
    } else if let Some(level) = cli.log_level {
        level.to_level_filter()
    } else {
        // Default to Warn (can still be overridden by RUST_LOG env var)
        log::LevelFilter::Warn
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Version { format } => cli::handle_version(format)?,

        Commands::Sync {
            catalogs,
            table,
            format,
        } => {
            let config = cli::load_config(config_path, None)?;
            cli::handle_sync(catalogs, config, table, format).await?
        }

        Commands::Watch {
            catalogs,
            table,
            interval,
        } => {
            let config = cli::load_config(config_path, interval)?;
            cli::handle_watch(catalogs, config, table).await?
        }

        Commands::Console { catalogs, interval } => {
            let config = cli::load_config(config_path, interval)?;
            cli::handle_console(catalogs, config).await?
        }
    }

    Ok(())
}
