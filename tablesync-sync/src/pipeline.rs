//! Shared sync pipeline entrypoint used by the CLI.
//!
//! Order of a run: read watermark → fetch → load table → reconcile → save
//! table → store watermark. Nothing is written before the merge succeeds, and
//! dry runs write nothing at all.

use std::path::Path;

use tablesync_core::{DatasetStore, StoreError, TableId};
use tablesync_renderer::RowRenderer;

use crate::engine::{ReconcileOutcome, ReconcileRequest, Reconciler};
use crate::fetch::RecordSource;
use crate::filter::RecordFilter;
use crate::run_log::{self, LastRun};
use crate::watermark::WatermarkStore;
use crate::SyncError;

/// Collaborators of one run, passed in explicitly.
pub struct SyncContext<'a> {
    pub source: &'a dyn RecordSource,
    pub datasets: &'a dyn DatasetStore,
    pub watermarks: &'a dyn WatermarkStore,
    pub renderer: &'a dyn RowRenderer,
    pub filter: &'a dyn RecordFilter,
}

/// Run one sync of `table_id`.
pub fn run(
    ctx: &SyncContext<'_>,
    table_id: TableId,
    dry_run: bool,
    force_rebuild: bool,
) -> Result<ReconcileOutcome, SyncError> {
    let previous = ctx.watermarks.get(table_id)?;
    let records = ctx.source.fetch()?;

    let existing = match ctx.datasets.load(table_id) {
        Ok(dataset) => dataset,
        Err(StoreError::TableNotFound { .. }) => return Err(SyncError::TableMissing { table_id }),
        Err(e) => return Err(e.into()),
    };

    let outcome = Reconciler::new(ctx.renderer, ctx.filter).reconcile(ReconcileRequest {
        table_id,
        existing: &existing,
        records: &records,
        previous_watermark: &previous,
        dry_run,
        force_rebuild,
    })?;

    if let Some(dataset) = &outcome.dataset {
        ctx.datasets.save(dataset)?;
        tracing::info!("wrote table {} ({} rows)", table_id, dataset.row_count());
    }
    if let Some(watermark) = &outcome.watermark {
        ctx.watermarks.set(table_id, watermark)?;
    }
    Ok(outcome)
}

/// [`run`], then record the outcome in the last-run log under `home`.
///
/// The log is written for failures too; the original error is returned even
/// if writing the log fails.
pub fn run_and_record(
    home: &Path,
    ctx: &SyncContext<'_>,
    table_id: TableId,
    dry_run: bool,
    force_rebuild: bool,
) -> Result<ReconcileOutcome, SyncError> {
    let result = run(ctx, table_id, dry_run, force_rebuild);
    let entry = match &result {
        Ok(outcome) => LastRun::success(outcome.summary(), outcome.row_count, outcome.updated_count),
        Err(e) => LastRun::failure(e.to_string()),
    };
    if let Err(e) = run_log::save_at(home, &entry) {
        tracing::warn!("could not record last run: {e}");
    }
    result
}
