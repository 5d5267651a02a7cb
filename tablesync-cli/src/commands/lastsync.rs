//! `tablesync lastsync`: show or set a table's watermark.

use anyhow::{bail, Context, Result};
use clap::Args;

use tablesync_core::{settings, timestamp, TableId};
use tablesync_sync::watermark;

use super::home_dir;

#[derive(Args, Debug)]
pub struct LastSyncArgs {
    /// Table id; defaults to the configured table.
    #[arg(long)]
    pub table: Option<i64>,

    /// New watermark (read as UTC). An empty value clears it, forcing the
    /// next sync to rebuild.
    #[arg(long, value_name = "TIMESTAMP")]
    pub set: Option<String>,
}

impl LastSyncArgs {
    pub fn run(self) -> Result<()> {
        let home = home_dir()?;
        let configured = settings::load_at(&home).context("failed to load settings")?;
        let table_id = TableId::from_signed(self.table.unwrap_or(configured.table_id))
            .context("Provide --table=<id> or set the table in settings.")?;

        match self.set {
            Some(raw) => {
                let value = normalize(&raw)?;
                watermark::set_at(&home, table_id, &value)
                    .with_context(|| format!("failed to store last-sync for table {table_id}"))?;
                println!("Last-sync for table {table_id} set to {value} (UTC assumed).");
            }
            None => {
                let value = watermark::get_at(&home, table_id)
                    .with_context(|| format!("failed to read last-sync for table {table_id}"))?;
                let shown = if value.is_empty() { "(not set)" } else { value.as_str() };
                println!("Last-sync for table {table_id}: {shown}");
            }
        }
        Ok(())
    }
}

fn normalize(raw: &str) -> Result<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(String::new());
    }
    match timestamp::parse(raw) {
        Some(instant) => Ok(timestamp::format_watermark(instant)),
        None => bail!("unrecognised timestamp '{raw}'; expected e.g. 2024-06-12 09:30:00"),
    }
}
