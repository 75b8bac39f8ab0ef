// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Result formatting for CLI output

use super::commands::OutputFormat;
use catalink::{BuildInfo, ConnectorHandle, ConnectorState, CycleReport, SyncStatsSnapshot, TableScan, Value};
use colored::*;
use comfy_table::{presets::UTF8_FULL, Cell, Color, Table};

/// Formatter for system table scans and engine reports
pub struct ResultFormatter;

impl ResultFormatter {
    /// Format a scan in the specified format
    pub fn format(scan: &TableScan, format: OutputFormat) -> String {
        match format {
            OutputFormat::Table => Self::format_table(scan),
            OutputFormat::Json => Self::format_json(scan),
            OutputFormat::Csv => Self::format_csv(scan),
        }
    }

    /// Format a scan as a table using comfy-table
    fn format_table(scan: &TableScan) -> String {
        let mut output = format!(
            "{} {}\n",
            format!("system.{}", scan.table).bold().green(),
            format!("(registry v{}, {} rows)", scan.snapshot_version, scan.row_count()).dimmed()
        );

        if scan.rows.is_empty() {
            output.push_str(&format!("{}\n", "No rows".yellow()));
            return output;
        }

        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        table.set_header(
            scan.columns
                .iter()
                .map(|col| Cell::new(col).fg(Color::Green))
                .collect::<Vec<_>>(),
        );

        for row in &scan.rows {
            table.add_row(row.values.iter().map(Self::value_cell).collect::<Vec<_>>());
        }

        output.push_str(&table.to_string());
        output.push('\n');
        output
    }

    fn value_cell(value: &Value) -> Cell {
        match value {
            Value::Error(_) => Cell::new(value.to_string()).fg(Color::Red),
            Value::Text(s) if s == "failed" => Cell::new(s).fg(Color::Red),
            Value::Text(s) if s == "loading" => Cell::new(s).fg(Color::Yellow),
            _ => Cell::new(value.to_string()),
        }
    }

    /// Format a scan as JSON
    fn format_json(scan: &TableScan) -> String {
        let rows: Vec<serde_json::Value> = scan
            .rows
            .iter()
            .map(|row| {
                let mut map = serde_json::Map::new();
                for (col, value) in scan.columns.iter().zip(&row.values) {
                    map.insert(col.clone(), Self::value_to_json(value));
                }
                serde_json::Value::Object(map)
            })
            .collect();

        let json = serde_json::json!({
            "table": format!("system.{}", scan.table),
            "snapshot_version": scan.snapshot_version,
            "columns": scan.columns,
            "rows": rows,
        });

        serde_json::to_string_pretty(&json).unwrap_or_else(|_| {
            "{\"status\": \"error\", \"error\": \"Could not serialize results to JSON\"}".to_string()
        })
    }

    /// Format a scan as CSV
    fn format_csv(scan: &TableScan) -> String {
        let mut output = scan.columns.join(",");
        output.push('\n');
        for row in &scan.rows {
            let cells: Vec<String> = row.values.iter().map(Self::value_to_csv_string).collect();
            output.push_str(&cells.join(","));
            output.push('\n');
        }
        output
    }

    fn value_to_json(value: &Value) -> serde_json::Value {
        match value {
            Value::Text(s) => serde_json::Value::String(s.clone()),
            Value::Integer(n) => serde_json::json!(n),
            Value::Timestamp(ts) => serde_json::Value::String(ts.to_rfc3339()),
            Value::Error(e) => serde_json::json!({ "error": e }),
            Value::Null => serde_json::Value::Null,
        }
    }

    fn value_to_csv_string(value: &Value) -> String {
        match value {
            Value::Null => String::new(),
            other => {
                let s = other.to_string();
                if s.contains(',') || s.contains('"') || s.contains('\n') {
                    format!("\"{}\"", s.replace('"', "\"\""))
                } else {
                    s
                }
            }
        }
    }

    /// One-line summary of a reconciliation cycle
    pub fn format_report(report: &CycleReport) -> String {
        let version = match report.published_version {
            Some(v) => format!("published v{}", v).green().to_string(),
            None => "no changes".dimmed().to_string(),
        };
        let mut line = format!(
            "Cycle finished in {:?}: {} (added {}, replaced {}, recovered {}, removed {}, unchanged {})",
            report.elapsed,
            version,
            report.added.len(),
            report.replaced.len(),
            report.recovered.len(),
            report.removed.len(),
            report.unchanged
        );
        if !report.failed.is_empty() {
            line.push_str(&format!(
                "\n{} {}",
                "Failed:".bold().red(),
                report.failed.join(", ").red()
            ));
        }
        line
    }

    pub fn format_stats(stats: &SyncStatsSnapshot) -> String {
        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        table.set_header(vec![
            Cell::new("counter").fg(Color::Green),
            Cell::new("value").fg(Color::Green),
        ]);
        let last_success = stats
            .last_success
            .map_or_else(|| "never".to_string(), |t| t.to_rfc3339());
        let rows: [(&str, String); 10] = [
            ("cycles", stats.cycles.to_string()),
            ("failed_cycles", stats.failed_cycles.to_string()),
            ("consecutive_failures", stats.consecutive_failures.to_string()),
            ("publishes", stats.publishes.to_string()),
            ("builds", stats.builds.to_string()),
            ("build_failures", stats.build_failures.to_string()),
            ("releases", stats.releases.to_string()),
            ("release_failures", stats.release_failures.to_string()),
            ("last_success", last_success),
            (
                "last_error",
                stats.last_error.clone().unwrap_or_else(|| "-".to_string()),
            ),
        ];
        for (name, value) in rows {
            table.add_row(vec![name.to_string(), value]);
        }
        table.to_string()
    }

    pub fn format_handle(handle: &ConnectorHandle) -> String {
        let state = match handle.state() {
            ConnectorState::Active => handle.state().to_string().green(),
            ConnectorState::Failed => handle.state().to_string().red(),
            ConnectorState::Loading | ConnectorState::Retiring => {
                handle.state().to_string().yellow()
            }
        };
        let mut output = format!(
            "{} [{}] attempts={}",
            handle.descriptor().to_string().bold(),
            state,
            handle.attempts()
        );
        for (key, value) in handle.descriptor().properties() {
            output.push_str(&format!("\n  {} = {}", key.cyan(), value));
        }
        if let Some(error) = handle.error() {
            output.push_str(&format!(
                "\n  {} [{}] {}",
                "error:".red(),
                error.kind(),
                error
            ));
        }
        output
    }

    pub fn format_build_info(info: &BuildInfo, format: OutputFormat) -> String {
        match format {
            OutputFormat::Json => serde_json::to_string_pretty(info)
                .unwrap_or_else(|_| format!("{{\"version\": \"{}\"}}", info.version())),
            OutputFormat::Csv => format!(
                "version,compile_date,git_commit\n{},{},{}\n",
                info.version(),
                info.compile_date(),
                info.git_commit()
            ),
            OutputFormat::Table => format!(
                "{} {}\nCompiled: {}\nCommit:   {}",
                "catalink".bold().green(),
                info.version(),
                info.compile_date(),
                info.git_commit()
            ),
        }
    }
}
