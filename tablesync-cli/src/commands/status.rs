//! `tablesync status`: settings, tables, watermarks and the last run.

use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use tablesync_core::{settings, store, Settings};
use tablesync_sync::{run_log, watermark, LastRun};

use super::home_dir;

/// Arguments for `tablesync status`.
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

impl StatusArgs {
    pub fn run(self) -> Result<()> {
        let home = home_dir()?;
        let report = build_report(&home)?;
        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&report).context("failed to serialize status JSON")?
            );
            return Ok(());
        }
        print_report(report);
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct StatusReport {
    settings: SettingsSummary,
    tables: Vec<TableStatus>,
    last_run: Option<LastRun>,
}

#[derive(Debug, Serialize)]
struct SettingsSummary {
    api_url: String,
    api_user: String,
    table_id: i64,
    configured: bool,
}

#[derive(Debug, Serialize, Tabled)]
struct TableStatus {
    #[tabled(rename = "table")]
    id: u64,
    #[tabled(rename = "name")]
    name: String,
    #[tabled(rename = "rows")]
    rows: usize,
    #[tabled(rename = "last sync")]
    last_sync: String,
}

fn build_report(home: &Path) -> Result<StatusReport> {
    let settings: Settings = settings::load_at(home).context("failed to load settings")?;
    let watermarks = watermark::load_at(home).context("failed to load watermarks")?;

    let mut tables = Vec::new();
    for table_id in store::list_tables().context("failed to list tables")? {
        let dataset = store::load_table_at(home, table_id)
            .with_context(|| format!("failed to load table {table_id}"))?;
        tables.push(TableStatus {
            id: table_id.0,
            name: dataset.name().unwrap_or_default().to_string(),
            rows: dataset.row_count(),
            last_sync: watermarks
                .get(&table_id.to_string())
                .cloned()
                .unwrap_or_default(),
        });
    }

    Ok(StatusReport {
        settings: SettingsSummary {
            configured: settings.validate().is_ok(),
            api_url: settings.api_url,
            api_user: settings.api_user,
            table_id: settings.table_id,
        },
        tables,
        last_run: run_log::load_at(home).context("failed to load last run")?,
    })
}

fn print_report(report: StatusReport) {
    println!("tablesync v{}", env!("CARGO_PKG_VERSION"));

    let configured = if report.settings.configured {
        "configured".green().to_string()
    } else {
        "incomplete".yellow().to_string()
    };
    println!(
        "Settings: {} | table {} | {}",
        configured,
        report.settings.table_id,
        if report.settings.api_url.is_empty() {
            "(no API URL)"
        } else {
            report.settings.api_url.as_str()
        }
    );

    if report.tables.is_empty() {
        println!("No tables. Run: tablesync table init <id>");
    } else {
        let rows: Vec<TableStatus> = report
            .tables
            .into_iter()
            .map(|mut t| {
                if t.last_sync.is_empty() {
                    t.last_sync = "never".to_string();
                }
                t
            })
            .collect();
        let mut table = Table::new(rows);
        table.with(Style::rounded());
        println!("{table}");
    }

    match report.last_run {
        None => println!("Last run: never"),
        Some(run) => {
            let badge = if run.success {
                "OK".green().bold()
            } else {
                "FAILED".red().bold()
            };
            println!(
                "Last run: {} {} - {}",
                badge,
                run.time_utc.format("%Y-%m-%d %H:%M:%S UTC"),
                run.message
            );
        }
    }
}
