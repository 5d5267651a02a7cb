//! tablesync: keep a local table in step with a remote record catalog.
//!
//! # Usage
//!
//! ```text
//! tablesync sync [--url U] [--user U] [--pass P] [--table N] [--dry-run] [--force-run] [--json]
//! tablesync lastsync [--table N] [--set TIMESTAMP]
//! tablesync config show
//! tablesync config set [--url U] [--user U] [--pass P] [--table N] [--timeout S] [--skip-status S]...
//! tablesync status [--json]
//! tablesync table init <id> [--name NAME]
//! tablesync table show <id> [--json]
//! ```
//!
//! Log output goes to stderr and is controlled by `RUST_LOG` (default `warn`).

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{
    config::ConfigCommand, lastsync::LastSyncArgs, status::StatusArgs, sync::SyncArgs,
    table::TableCommand,
};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "tablesync",
    version,
    about = "Sync a remote record catalog into a local table",
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Fetch records and merge them into the configured table.
    Sync(SyncArgs),

    /// Show or set the last-sync watermark of a table.
    Lastsync(LastSyncArgs),

    /// Show or change stored settings.
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },

    /// Show settings, tables, watermarks and the last run.
    Status(StatusArgs),

    /// Create or inspect local tables.
    Table {
        #[command(subcommand)]
        command: TableCommand,
    },
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Sync(args) => args.run(),
        Commands::Lastsync(args) => args.run(),
        Commands::Config { command } => commands::config::run(command),
        Commands::Status(args) => args.run(),
        Commands::Table { command } => commands::table::run(command),
    }
}

fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
