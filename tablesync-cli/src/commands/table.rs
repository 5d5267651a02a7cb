//! `tablesync table init <id>` and `tablesync table show <id>`

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use tabled::{settings::Style, Table, Tabled};

use tablesync_core::{store, types::scalar_text, TableId};

use super::home_dir;

#[derive(Subcommand, Debug)]
pub enum TableCommand {
    /// Create an empty table with the default header. No-op if it exists.
    Init(InitArgs),

    /// Print a table's header and row summary.
    Show(ShowArgs),
}

#[derive(Args, Debug)]
pub struct InitArgs {
    pub id: i64,

    /// Human-readable table name.
    #[arg(long)]
    pub name: Option<String>,
}

#[derive(Args, Debug)]
pub struct ShowArgs {
    pub id: i64,

    /// Dump the stored table as JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Tabled)]
struct RowSummary {
    #[tabled(rename = "#")]
    position: usize,
    #[tabled(rename = "number")]
    number: String,
    #[tabled(rename = "name")]
    name: String,
    #[tabled(rename = "updated")]
    updated: String,
}

pub fn run(cmd: TableCommand) -> Result<()> {
    match cmd {
        TableCommand::Init(args) => init(args),
        TableCommand::Show(args) => show(args),
    }
}

fn table_id(raw: i64) -> Result<TableId> {
    TableId::from_signed(raw).context("table id must be a positive integer")
}

fn init(args: InitArgs) -> Result<()> {
    let home = home_dir()?;
    let id = table_id(args.id)?;
    let path = store::table_path_at(&home, id);
    let existed = path.exists();
    let dataset = store::init_table(id, args.name.as_deref())
        .with_context(|| format!("failed to initialize table {id}"))?;

    if existed {
        println!("Table {id} already exists ({} rows).", dataset.row_count());
    } else {
        println!("✓ Created table {id} at {}", path.display());
    }
    Ok(())
}

fn show(args: ShowArgs) -> Result<()> {
    let id = table_id(args.id)?;
    let dataset = store::load_table(id).with_context(|| format!("failed to load table {id}"))?;

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&dataset).context("failed to serialize table JSON")?
        );
        return Ok(());
    }

    println!(
        "Table {id}{} | {} rows",
        dataset.name().map(|n| format!(" ({n})")).unwrap_or_default(),
        dataset.row_count()
    );
    println!("Header: {}", dataset.header.join(" | "));
    if !dataset.options.is_null() {
        println!("Options: {}", scalar_text(&dataset.options));
    }
    if !dataset.visibility.is_null() {
        println!("Visibility: {}", scalar_text(&dataset.visibility));
    }

    if dataset.rows.is_empty() {
        return Ok(());
    }
    let cell = |cells: &[String], i: usize| cells.get(i).cloned().unwrap_or_default();
    let rows: Vec<RowSummary> = dataset
        .rows
        .iter()
        .enumerate()
        .map(|(i, row)| RowSummary {
            position: i + 1,
            number: row.key().to_string(),
            name: cell(row.cells(), 1),
            updated: cell(row.cells(), 8),
        })
        .collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");
    Ok(())
}
