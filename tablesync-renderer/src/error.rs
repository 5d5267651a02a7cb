//! Error types for tablesync-renderer.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise from row rendering.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Tera template engine error (also covers context serialization).
    #[error("template engine error: {0}")]
    Tera(#[from] tera::Error),

    /// Filesystem error while loading user templates.
    #[error("template io error at {path}: {source}")]
    Io { path: PathBuf, source: std::io::Error },
}
