pub mod config;
pub mod lastsync;
pub mod status;
pub mod sync;
pub mod table;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tablesync_core::store;

pub(crate) fn home_dir() -> Result<PathBuf> {
    store::home().context("could not determine home directory")
}

/// `<home>/.tablesync/templates/`: user overrides of the cell templates.
pub(crate) fn template_dir(home: &Path) -> PathBuf {
    store::state_dir_at(home).join("templates")
}
