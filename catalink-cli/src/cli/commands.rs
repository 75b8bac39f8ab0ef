// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! CLI command definitions for catalink

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Log level options
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum LogLevel {
    /// Only errors
    Error,
    /// Warnings and errors
    Warn,
    /// Info, warnings, and errors
    Info,
    /// Debug messages and above (verbose)
    Debug,
    /// All messages including trace (very verbose)
    Trace,
    /// Disable all logging
    Off,
}

impl LogLevel {
    /// Convert to log::LevelFilter
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
            LogLevel::Off => log::LevelFilter::Off,
        }
    }
}

/// catalink CLI - catalog lifecycle and connector synchronization
#[derive(Parser)]
#[command(name = "catalink")]
#[command(about = "catalink - keep query-engine connectors in step with a catalog metadata source")]
#[command(version)]
pub struct Cli {
    /// Sync configuration file (JSON); defaults apply to missing fields
    #[arg(short = 'c', long = "config", global = true)]
    pub config: Option<PathBuf>,

    /// Set log level (error, warn, info, debug, trace, off)
    #[arg(short = 'l', long = "log-level", global = true, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Verbose mode (equivalent to --log-level debug)
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Show build information
    Version {
        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Run one reconciliation cycle and print a system table
    Sync {
        /// Catalog descriptor file
        #[arg(long, default_value = "./catalogs.json")]
        catalogs: PathBuf,

        /// System table to print afterwards
        #[arg(short, long, default_value = "catalogs")]
        table: String,

        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Keep syncing in the background and print changes until Ctrl-C
    Watch {
        /// Catalog descriptor file
        #[arg(long, default_value = "./catalogs.json")]
        catalogs: PathBuf,

        /// System table to print after every change
        #[arg(short, long, default_value = "catalog_status")]
        table: String,

        /// Seconds between cycles (overrides the config file)
        #[arg(short, long)]
        interval: Option<u64>,
    },

    /// Interactive console (REPL) over a running sync engine
    Console {
        /// Catalog descriptor file
        #[arg(long, default_value = "./catalogs.json")]
        catalogs: PathBuf,

        /// Seconds between cycles (overrides the config file)
        #[arg(short, long)]
        interval: Option<u64>,
    },
}

/// Output format options
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            "csv" => Ok(OutputFormat::Csv),
            _ => Err(format!("Unknown output format: {}", s)),
        }
    }
}
