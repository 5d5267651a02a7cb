//! Last-run log: outcome of the most recent triggered run.
//!
//! `<home>/.tablesync/last_run.json`, overwritten after every run, successful
//! or not. Read by `tablesync status`.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tablesync_core::store;

use crate::error::{io_err, SyncError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastRun {
    pub time_utc: DateTime<Utc>,
    pub success: bool,
    pub message: String,
    #[serde(default)]
    pub rows: usize,
    #[serde(default)]
    pub updated: usize,
}

impl LastRun {
    pub fn success(message: impl Into<String>, rows: usize, updated: usize) -> Self {
        LastRun {
            time_utc: Utc::now(),
            success: true,
            message: message.into(),
            rows,
            updated,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        LastRun {
            time_utc: Utc::now(),
            success: false,
            message: message.into(),
            rows: 0,
            updated: 0,
        }
    }
}

/// `<home>/.tablesync/last_run.json`
pub fn log_path_at(home: &Path) -> PathBuf {
    store::state_dir_at(home).join("last_run.json")
}

/// The last recorded run, or `None` if nothing ran yet.
pub fn load_at(home: &Path) -> Result<Option<LastRun>, SyncError> {
    let path = log_path_at(home);
    if !path.exists() {
        return Ok(None);
    }
    let contents = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
    Ok(Some(serde_json::from_str(&contents)?))
}

pub fn save_at(home: &Path, run: &LastRun) -> Result<(), SyncError> {
    let json = serde_json::to_string_pretty(run)?;
    store::write_atomic(&log_path_at(home), &json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn none_before_first_run() {
        let tmp = TempDir::new().unwrap();
        assert_eq!(load_at(tmp.path()).unwrap(), None);
    }

    #[test]
    fn latest_run_overwrites_previous() {
        let tmp = TempDir::new().unwrap();
        save_at(tmp.path(), &LastRun::success("Table updated.", 4, 2)).unwrap();
        save_at(tmp.path(), &LastRun::failure("HTTP 500 - oops")).unwrap();
        let run = load_at(tmp.path()).unwrap().unwrap();
        assert!(!run.success);
        assert_eq!(run.message, "HTTP 500 - oops");
        assert_eq!((run.rows, run.updated), (0, 0));
    }
}
