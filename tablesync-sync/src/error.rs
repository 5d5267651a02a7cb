//! Error types for tablesync-sync.

use std::path::PathBuf;

use thiserror::Error;

use tablesync_core::{StoreError, TableId};
use tablesync_renderer::RenderError;

/// Failures of the remote record fetch. Surfaced verbatim, never retried.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Connection, TLS or timeout failure.
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The endpoint answered with something other than 200.
    #[error("HTTP {code} - {body}")]
    Status { code: u16, body: String },

    #[error("invalid JSON from API: {0}")]
    Json(#[from] serde_json::Error),
}

/// All errors that can arise from sync operations.
#[derive(Debug, Error)]
pub enum SyncError {
    /// An error from the dataset or settings store.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// An error from the rendering engine.
    #[error("render error: {0}")]
    Render(#[from] RenderError),

    #[error("fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// The target table does not exist; nothing was written.
    #[error("table {table_id} not found")]
    TableMissing { table_id: TableId },

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON error in the watermark or run-log files.
    #[error("state file JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience constructor for [`SyncError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SyncError {
    SyncError::Io {
        path: path.into(),
        source,
    }
}
