//! Reconciliation engine: merges fetched records into a dataset.
//!
//! ## Mode selection
//!
//! A run **rebuilds** the table when the caller forces it, when no watermark
//! exists yet, or when the stored header no longer starts with `Number`
//! (schema drift). Otherwise it runs **incrementally**.
//!
//! ## Rebuild
//!
//! Every usable record contributes its `updated` instant to the watermark,
//! filtered or not. Surviving records are rendered in fetch order; old rows
//! are discarded.
//!
//! ## Incremental
//!
//! Only records strictly newer than the previous watermark are candidates.
//! Candidates contribute to the watermark before filtering. Known
//! identifiers are replaced in place, new ones are appended after all
//! existing rows in natural case-insensitive order.
//!
//! The engine is pure: it never touches a store. Dry runs produce the same
//! counts as real runs but hand back neither a dataset nor a watermark.

use std::collections::HashSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value};

use tablesync_core::{
    natord, timestamp,
    types::{default_header, COLUMN_COUNT},
    Dataset, Record, Row, TableId,
};
use tablesync_renderer::RowRenderer;

use crate::error::SyncError;
use crate::filter::RecordFilter;
use crate::index::OrderedRows;

/// Label that must head column 0 for incremental runs.
pub const KEY_COLUMN: &str = "Number";

/// Visibility column index that is always hidden.
pub const HIDDEN_COLUMN: i64 = 1;

// ---------------------------------------------------------------------------
// Mode
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RebuildReason {
    Forced,
    NoWatermark,
    SchemaDrift,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "mode", content = "reason")]
pub enum Mode {
    Rebuild(RebuildReason),
    Incremental,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Rebuild(RebuildReason::Forced) => f.write_str("rebuild (forced)"),
            Mode::Rebuild(RebuildReason::NoWatermark) => f.write_str("rebuild (no watermark)"),
            Mode::Rebuild(RebuildReason::SchemaDrift) => f.write_str("rebuild (schema drift)"),
            Mode::Incremental => f.write_str("incremental"),
        }
    }
}

/// Pick the run mode. `header_has_key` is the result of [`normalize_header`].
pub fn select_mode(force_rebuild: bool, previous_watermark: &str, header_has_key: bool) -> Mode {
    if force_rebuild {
        Mode::Rebuild(RebuildReason::Forced)
    } else if previous_watermark.trim().is_empty() {
        Mode::Rebuild(RebuildReason::NoWatermark)
    } else if !header_has_key {
        Mode::Rebuild(RebuildReason::SchemaDrift)
    } else {
        Mode::Incremental
    }
}

// ---------------------------------------------------------------------------
// Request / outcome
// ---------------------------------------------------------------------------

/// Inputs of one reconciliation.
#[derive(Debug, Clone, Copy)]
pub struct ReconcileRequest<'a> {
    pub table_id: TableId,
    pub existing: &'a Dataset,
    /// Raw items of the fetched `result` list.
    pub records: &'a [Value],
    /// Empty when the table was never synced.
    pub previous_watermark: &'a str,
    pub dry_run: bool,
    pub force_rebuild: bool,
}

/// Result of one reconciliation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReconcileOutcome {
    pub dry_run: bool,
    pub mode: Mode,
    /// Data rows in the resulting (or simulated) dataset, header excluded.
    pub row_count: usize,
    /// Distinct identifiers rendered in this run.
    pub updated_count: usize,
    /// New dataset to persist; `None` on dry runs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dataset: Option<Dataset>,
    /// New watermark to persist; `None` on dry runs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub watermark: Option<String>,
}

impl ReconcileOutcome {
    /// One-line human summary, as printed by the CLI and kept in the run log.
    pub fn summary(&self) -> String {
        if self.dry_run {
            format!(
                "Dry-run: would write {} rows. Updated items: {}",
                self.row_count, self.updated_count
            )
        } else {
            format!(
                "Table updated. Rows: {}. Updated items: {}",
                self.row_count, self.updated_count
            )
        }
    }
}

// ---------------------------------------------------------------------------
// Reconciler
// ---------------------------------------------------------------------------

/// The reconciliation engine, parameterised over how rows are rendered and
/// which records are skipped.
pub struct Reconciler<'a, R: RowRenderer + ?Sized, F: RecordFilter + ?Sized> {
    renderer: &'a R,
    filter: &'a F,
}

struct Merge {
    rows: Vec<Row>,
    updated: usize,
    newest: DateTime<Utc>,
}

impl<'a, R: RowRenderer + ?Sized, F: RecordFilter + ?Sized> Reconciler<'a, R, F> {
    pub fn new(renderer: &'a R, filter: &'a F) -> Self {
        Reconciler { renderer, filter }
    }

    /// Reconcile using the wall clock for the empty-run watermark fallback.
    pub fn reconcile(&self, request: ReconcileRequest<'_>) -> Result<ReconcileOutcome, SyncError> {
        self.reconcile_at(request, Utc::now())
    }

    /// Reconcile with an explicit "now".
    pub fn reconcile_at(
        &self,
        request: ReconcileRequest<'_>,
        now: DateTime<Utc>,
    ) -> Result<ReconcileOutcome, SyncError> {
        let (header, has_key) = normalize_header(&request.existing.header);
        let mode = select_mode(request.force_rebuild, request.previous_watermark, has_key);
        tracing::info!(
            "table {}: {} over {} fetched record(s)",
            request.table_id,
            mode,
            request.records.len()
        );

        let merge = match mode {
            Mode::Rebuild(_) => self.rebuild(request.records)?,
            Mode::Incremental => self.incremental(
                request.records,
                &request.existing.rows,
                request.previous_watermark,
            )?,
        };

        let row_count = merge.rows.len();
        let updated_count = merge.updated;

        if request.dry_run {
            tracing::info!(
                "[dry-run] table {}: would write {} row(s), {} updated",
                request.table_id,
                row_count,
                updated_count
            );
            return Ok(ReconcileOutcome {
                dry_run: true,
                mode,
                row_count,
                updated_count,
                dataset: None,
                watermark: None,
            });
        }

        let mut dataset = request.existing.clone();
        dataset.id = request.table_id;
        dataset.header = header;
        dataset.rows = merge.rows;
        ensure_hidden_column(&mut dataset.visibility);
        // Options go back exactly as loaded.
        dataset.options = request.existing.options.clone();

        let watermark = next_watermark(merge.newest, request.previous_watermark, now);
        tracing::info!("table {}: watermark -> {}", request.table_id, watermark);

        Ok(ReconcileOutcome {
            dry_run: false,
            mode,
            row_count,
            updated_count,
            dataset: Some(dataset),
            watermark: Some(watermark),
        })
    }

    fn rebuild(&self, records: &[Value]) -> Result<Merge, SyncError> {
        let mut rows = OrderedRows::new();
        let mut touched = HashSet::new();
        let mut newest = timestamp::zero();

        for record in records.iter().filter_map(usable_record) {
            let updated = timestamp::parse_or_zero(&record.updated_text());
            newest = newest.max(updated);

            if self.filter.excludes(&record) {
                tracing::debug!("skip {}: filtered by status", record.id());
                continue;
            }
            self.render_into(&record, &mut rows, &mut touched)?;
        }

        Ok(Merge {
            rows: rows.into_rows(),
            updated: touched.len(),
            newest,
        })
    }

    fn incremental(
        &self,
        records: &[Value],
        existing: &[Row],
        previous_watermark: &str,
    ) -> Result<Merge, SyncError> {
        let last = timestamp::parse_or_zero(previous_watermark);
        let mut rows = OrderedRows::from_rows(existing.iter().cloned());
        let mut pending = OrderedRows::new();
        let mut touched = HashSet::new();
        let mut newest = timestamp::zero();

        for record in records.iter().filter_map(usable_record) {
            let updated = timestamp::parse_or_zero(&record.updated_text());
            if updated <= last {
                continue;
            }
            newest = newest.max(updated);

            if self.filter.excludes(&record) {
                tracing::debug!("skip {}: filtered by status", record.id());
                continue;
            }
            if rows.contains(&record.id()) {
                self.render_into(&record, &mut rows, &mut touched)?;
            } else {
                self.render_into(&record, &mut pending, &mut touched)?;
            }
        }

        let mut inserts = pending.into_rows();
        inserts.sort_by(|a, b| natord::compare_ignore_case(a.key(), b.key()));
        let mut merged = rows.into_rows();
        merged.extend(inserts);

        Ok(Merge {
            rows: merged,
            updated: touched.len(),
            newest,
        })
    }

    fn render_into(
        &self,
        record: &Record,
        rows: &mut OrderedRows,
        touched: &mut HashSet<String>,
    ) -> Result<(), SyncError> {
        let id = record.id();
        let row = self.renderer.render_row(record)?;
        if rows.upsert(row) && touched.contains(&id) {
            tracing::warn!("duplicate identifier {id:?} in fetch; later record wins");
        } else {
            tracing::debug!("render {id}");
        }
        touched.insert(id);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn usable_record(value: &Value) -> Option<Record> {
    let Some(record) = Record::from_value(value.clone()) else {
        tracing::warn!("skipping fetched item that is not an object");
        return None;
    };
    if record.id().is_empty() {
        tracing::warn!("skipping fetched record without number");
        return None;
    }
    Some(record)
}

/// Header to persist, plus whether it identifies column 0 as the key column.
///
/// An empty header falls back to the default. A header whose first cell is
/// not `Number` (markup stripped) is replaced by the default as well. The
/// result always has exactly [`COLUMN_COUNT`] cells.
pub fn normalize_header(existing: &[String]) -> (Vec<String>, bool) {
    let mut header = if existing.is_empty() {
        default_header()
    } else {
        existing.to_vec()
    };
    let has_key = header
        .first()
        .is_some_and(|first| strip_markup(first) == KEY_COLUMN);
    if !has_key {
        header = default_header();
    }
    header.resize(COLUMN_COUNT, String::new());
    (header, has_key)
}

/// Remove `<...>` tags, keeping the text between them.
pub fn strip_markup(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_tag = false;
    for c in text.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out
}

/// Make sure `visibility.columns` lists [`HIDDEN_COLUMN`].
///
/// Other entries are left alone. A visibility value that is not an object
/// (including an absent one) becomes `{"columns": [1]}`.
pub fn ensure_hidden_column(visibility: &mut Value) {
    let Some(map) = visibility.as_object_mut() else {
        *visibility = json!({ "columns": [HIDDEN_COLUMN] });
        return;
    };
    let columns = map
        .entry("columns")
        .or_insert_with(|| Value::Array(Vec::new()));
    if !columns.is_array() {
        *columns = Value::Array(Vec::new());
    }
    if let Value::Array(items) = columns {
        if !items.iter().any(|v| v.as_i64() == Some(HIDDEN_COLUMN)) {
            items.push(json!(HIDDEN_COLUMN));
        }
    }
}

/// Watermark after a successful run.
///
/// The newest observed instant wins; with none observed the run time is used
/// so empty runs still advance. Never lower than the previous watermark.
pub fn next_watermark(newest: DateTime<Utc>, previous: &str, now: DateTime<Utc>) -> String {
    let candidate = if newest > timestamp::zero() { newest } else { now };
    let next = match timestamp::parse(previous) {
        Some(prev) if prev > candidate => prev,
        _ => candidate,
    };
    timestamp::format_watermark(next)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
