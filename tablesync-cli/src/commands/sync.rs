//! `tablesync sync`: fetch, merge and persist one table.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use serde::Serialize;

use tablesync_core::{settings, FileDatasetStore, Settings};
use tablesync_renderer::Renderer;
use tablesync_sync::{
    pipeline, run_log, FileWatermarkStore, HttpRecordSource, LastRun, Mode, ReconcileOutcome,
    SkipStatusSet, SyncContext,
};

use super::{home_dir, template_dir};

/// Arguments for `tablesync sync`. Flags override stored settings for this
/// run only.
#[derive(Args, Debug)]
pub struct SyncArgs {
    /// API endpoint returning `{"result": [...]}`.
    #[arg(long)]
    pub url: Option<String>,

    #[arg(long)]
    pub user: Option<String>,

    #[arg(long)]
    pub pass: Option<String>,

    /// Target table id.
    #[arg(long)]
    pub table: Option<i64>,

    /// Report counts without writing the table or the watermark.
    #[arg(long)]
    pub dry_run: bool,

    /// Rebuild the whole table instead of merging changes.
    #[arg(long = "force-run")]
    pub force_run: bool,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize)]
struct SyncReportJson<'a> {
    table: u64,
    #[serde(flatten)]
    mode: &'a Mode,
    dry_run: bool,
    rows: usize,
    updated: usize,
    watermark: Option<&'a str>,
}

impl SyncArgs {
    pub fn run(self) -> Result<()> {
        let home = home_dir()?;
        let mut settings = settings::load_at(&home).context("failed to load settings")?;
        self.apply(&mut settings);

        let table_id = match settings.validate() {
            Ok(id) => id,
            Err(e) => {
                if let Err(log_err) = run_log::save_at(&home, &LastRun::failure(e.to_string())) {
                    tracing::warn!("could not record last run: {log_err}");
                }
                return Err(e.into());
            }
        };

        let source = HttpRecordSource::from_settings(&settings);
        let datasets = FileDatasetStore::new().context("failed to open table store")?;
        let watermarks = FileWatermarkStore::at(&home);
        let renderer =
            Renderer::with_template_dir(&template_dir(&home)).context("failed to load templates")?;
        let filter = SkipStatusSet::from_settings(&settings);
        let ctx = SyncContext {
            source: &source,
            datasets: &datasets,
            watermarks: &watermarks,
            renderer: &renderer,
            filter: &filter,
        };

        let outcome = pipeline::run_and_record(&home, &ctx, table_id, self.dry_run, self.force_run)
            .with_context(|| format!("sync failed for table {table_id}"))?;

        if self.json {
            print_json(table_id.0, &outcome)
        } else {
            println!("{} {}", "✓".green(), outcome.summary());
            Ok(())
        }
    }

    fn apply(&self, settings: &mut Settings) {
        if let Some(url) = &self.url {
            settings.api_url = url.clone();
        }
        if let Some(user) = &self.user {
            settings.api_user = user.clone();
        }
        if let Some(pass) = &self.pass {
            settings.api_pass = pass.clone();
        }
        if let Some(table) = self.table {
            settings.table_id = table;
        }
    }
}

fn print_json(table: u64, outcome: &ReconcileOutcome) -> Result<()> {
    let payload = SyncReportJson {
        table,
        mode: &outcome.mode,
        dry_run: outcome.dry_run,
        rows: outcome.row_count,
        updated: outcome.updated_count,
        watermark: outcome.watermark.as_deref(),
    };
    println!(
        "{}",
        serde_json::to_string_pretty(&payload).context("failed to serialize sync JSON")?
    );
    Ok(())
}
