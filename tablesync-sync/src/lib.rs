//! # tablesync-sync
//!
//! Reconciliation of a remote record catalog into a persisted table.
//!
//! [`Reconciler`] is the pure merge engine. [`pipeline::run`] wires it to a
//! [`RecordSource`], a dataset store and a [`WatermarkStore`];
//! [`pipeline::run_and_record`] also writes the last-run log.

pub mod engine;
pub mod error;
pub mod fetch;
pub mod filter;
pub mod index;
pub mod pipeline;
pub mod run_log;
pub mod watermark;

pub use engine::{Mode, RebuildReason, ReconcileOutcome, ReconcileRequest, Reconciler};
pub use error::{FetchError, SyncError};
pub use fetch::{HttpRecordSource, RecordSource};
pub use filter::{RecordFilter, SkipStatusSet};
pub use pipeline::{run, run_and_record, SyncContext};
pub use run_log::LastRun;
pub use watermark::{FileWatermarkStore, WatermarkStore};
