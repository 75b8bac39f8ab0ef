// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! CLI command handlers for catalink

use colored::Colorize;
use rustyline::{error::ReadlineError, CompletionType, Config, EditMode, Editor};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::runtime::Handle;

use super::commands::OutputFormat;
use super::output::ResultFormatter;
use catalink::{build_info, CatalogError, CatalogService, SyncConfig};

/// How often `watch` checks for a new registry version
const WATCH_POLL: Duration = Duration::from_millis(250);

const HISTORY_PATH: &str = ".catalink/.console_history.txt";

#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error("Console error: {0}")]
    Readline(#[from] ReadlineError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Catalog file not found: {0}")]
    MissingCatalogFile(PathBuf),

    #[error("Console task failed: {0}")]
    ConsoleTask(#[from] tokio::task::JoinError),
}

pub type CliResult<T> = Result<T, CliError>;

/// Resolve the sync configuration from an optional file and interval override
pub fn load_config(path: Option<&Path>, interval_secs: Option<u64>) -> CliResult<SyncConfig> {
    let mut config = match path {
        Some(path) => SyncConfig::from_file(path)?,
        None => SyncConfig::default(),
    };
    if let Some(secs) = interval_secs {
        config = config.with_interval(Duration::from_secs(secs));
    }
    config.validate()?;
    Ok(config)
}

fn open_service(catalogs: &Path, config: SyncConfig) -> CliResult<CatalogService> {
    if !catalogs.exists() {
        return Err(CliError::MissingCatalogFile(catalogs.to_path_buf()));
    }
    Ok(CatalogService::from_file(catalogs, config)?)
}

/// Handle the version command
pub fn handle_version(format: OutputFormat) -> CliResult<()> {
    println!("{}", ResultFormatter::format_build_info(build_info(), format));
    Ok(())
}

/// Handle the sync command (one cycle, then print a table)
pub async fn handle_sync(
    catalogs: PathBuf,
    config: SyncConfig,
    table: String,
    format: OutputFormat,
) -> CliResult<()> {
    let service = open_service(&catalogs, config)?;

    let result = service.refresh().await;
    let outcome = match result {
        Ok(report) => {
            if format == OutputFormat::Table {
                println!("{}\n", ResultFormatter::format_report(&report));
            }
            service.scan(&table).map(|scan| {
                println!("{}", ResultFormatter::format(&scan, format));
            })
        }
        Err(e) => Err(e),
    };

    service.shutdown().await;
    Ok(outcome?)
}

/// Handle the watch command
pub async fn handle_watch(catalogs: PathBuf, config: SyncConfig, table: String) -> CliResult<()> {
    let service = open_service(&catalogs, config)?;
    // fail fast on a bad table name
    service.system_tables().columns(&table)?;

    println!(
        "{} {} {}",
        "Watching".bold().green(),
        catalogs.display(),
        "(Ctrl-C to stop)".dimmed()
    );
    service.start();

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut ticker = tokio::time::interval(WATCH_POLL);
    let mut shown_version = 0;

    loop {
        tokio::select! {
            _ = &mut ctrl_c => break,
            _ = ticker.tick() => {
                let snapshot = service.snapshot();
                if snapshot.version() == shown_version {
                    continue;
                }
                shown_version = snapshot.version();
                println!(
                    "{}",
                    format!(
                        "Registry v{} published {}",
                        snapshot.version(),
                        snapshot.published_at().format("%Y-%m-%d %H:%M:%S UTC")
                    )
                    .dimmed()
                );
                match service.scan(&table) {
                    Ok(scan) => println!("{}", ResultFormatter::format(&scan, OutputFormat::Table)),
                    Err(e) => eprintln!("{}", format!("Error: {}", e).red()),
                }
            }
        }
    }

    println!("{}", "Stopping...".yellow());
    service.shutdown().await;
    Ok(())
}

/// Handle the console (REPL) command
///
/// The line editor blocks, so the REPL runs on a blocking thread while the
/// background sync keeps running on the runtime.
pub async fn handle_console(catalogs: PathBuf, config: SyncConfig) -> CliResult<()> {
    let service = Arc::new(open_service(&catalogs, config)?);
    service.start();

    let console = service.clone();
    let runtime = Handle::current();
    let result =
        tokio::task::spawn_blocking(move || run_console(&console, &runtime, &catalogs)).await;

    service.shutdown().await;
    result?
}

fn run_console(service: &CatalogService, runtime: &Handle, catalogs: &Path) -> CliResult<()> {
    println!("{}", "catalink console".bold().green());
    println!("Syncing from {}", catalogs.display().to_string().cyan());
    println!("Type 'help' for commands, 'exit' or 'quit' to exit\n");

    let config = Config::builder()
        .edit_mode(EditMode::Emacs)
        .history_ignore_space(true)
        .completion_type(CompletionType::List)
        .auto_add_history(true)
        .build();
    let mut rl = Editor::<(), _>::with_config(config)?;

    if let Some(parent) = Path::new(HISTORY_PATH).parent() {
        std::fs::create_dir_all(parent)?;
    }
    let _ = rl.load_history(HISTORY_PATH);

    loop {
        let prompt = format!("{}> ", format!("v{}", service.registry().version()).cyan());
        let line = match rl.readline(&prompt) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) => continue,
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                eprintln!("{}", format!("Error: {:?}", err).red());
                break;
            }
        };

        if run_console_command(service, runtime, &line) == ConsoleStep::Exit {
            break;
        }
    }

    let _ = rl.save_history(HISTORY_PATH);
    println!("{}", "Goodbye!".green());
    Ok(())
}

/// Whether the console keeps reading after a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConsoleStep {
    Continue,
    Exit,
}

/// Execute one console line; must be called off the async runtime
fn run_console_command(service: &CatalogService, runtime: &Handle, line: &str) -> ConsoleStep {
    let mut words = line.split_whitespace();
    let command = words.next().unwrap_or("").to_lowercase();
    let argument = words.next();

    match (command.as_str(), argument) {
        ("", _) => {}
        ("exit" | "quit", _) => return ConsoleStep::Exit,
        ("help", _) => print_help(),
        ("clear", _) => print!("\x1B[2J\x1B[1;1H"),
        ("tables", _) => {
            for name in service.system_tables().table_names() {
                println!("  system.{}", name);
            }
        }
        ("show", Some(table)) => {
            let format = words
                .next()
                .and_then(|f| f.parse().ok())
                .unwrap_or(OutputFormat::Table);
            match service.scan(table) {
                Ok(scan) => println!("{}", ResultFormatter::format(&scan, format)),
                Err(e) => eprintln!("{}", format!("Error: {}", e).red()),
            }
        }
        ("lookup", Some(name)) => match service.lookup(name) {
            Some(handle) => println!("{}", ResultFormatter::format_handle(&handle)),
            None => println!("{}", format!("Catalog '{}' is not registered", name).yellow()),
        },
        ("refresh", _) => match runtime.block_on(service.refresh()) {
            Ok(report) => println!("{}", ResultFormatter::format_report(&report)),
            Err(e) => eprintln!("{}", format!("Error: {}", e).red()),
        },
        ("stats", _) => println!("{}", ResultFormatter::format_stats(&service.stats())),
        ("show" | "lookup", None) => {
            eprintln!("{}", format!("Usage: {} <name>", command).yellow())
        }
        (other, _) => eprintln!(
            "{}",
            format!("Unknown command '{}', type 'help'", other).yellow()
        ),
    }
    ConsoleStep::Continue
}

fn print_help() {
    println!("{}", "Commands:".bold());
    println!("  show <table> [table|json|csv]  Print a system table");
    println!("  tables                         List system tables");
    println!("  lookup <catalog>               Show one catalog's handle");
    println!("  refresh                        Run a reconciliation cycle now");
    println!("  stats                          Show sync counters");
    println!("  clear                          Clear the screen");
    println!("  exit | quit                    Leave the console");
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalink::{CatalogDescriptor, ConnectorFactoryRegistry, StaticMetadataSource};

    #[test]
    fn test_interval_override_and_validation() {
        let config = load_config(None, Some(5)).unwrap();
        assert_eq!(config.interval, Duration::from_secs(5));

        assert!(matches!(
            load_config(None, Some(0)),
            Err(CliError::Catalog(CatalogError::InvalidConfig(_)))
        ));
    }

    #[tokio::test]
    async fn test_missing_catalog_file() {
        let result = handle_sync(
            PathBuf::from("/nonexistent/catalogs.json"),
            SyncConfig::fast(),
            "catalogs".to_string(),
            OutputFormat::Table,
        )
        .await;
        assert!(matches!(result, Err(CliError::MissingCatalogFile(_))));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_console_commands_run_on_blocking_thread() {
        let sales = CatalogDescriptor::new("sales", "memory");
        let source = Arc::new(StaticMetadataSource::new(vec![sales]));
        let service = Arc::new(
            CatalogService::new(
                source,
                ConnectorFactoryRegistry::with_builtins(),
                SyncConfig::fast(),
            )
            .unwrap(),
        );

        let console = service.clone();
        let runtime = Handle::current();
        let steps = tokio::task::spawn_blocking(move || {
            vec![
                run_console_command(&console, &runtime, "refresh"),
                run_console_command(&console, &runtime, "show catalogs csv"),
                run_console_command(&console, &runtime, "QUIT"),
            ]
        })
        .await
        .unwrap();

        assert_eq!(
            steps,
            vec![ConsoleStep::Continue, ConsoleStep::Continue, ConsoleStep::Exit]
        );
        assert!(service.get_catalog("sales").is_some());
        service.shutdown().await;
    }
}
