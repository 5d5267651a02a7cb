//! Watermark store: last successfully incorporated `updated` instant per table.
//!
//! Persists one JSON object at `<home>/.tablesync/last_sync.json`, mapping the
//! table id (as a string key) to a `YYYY-MM-DD HH:MM:SS` UTC string. Writes use
//! the same atomic `.tmp` + rename pattern as the table store.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tablesync_core::{store, TableId};

use crate::error::{io_err, SyncError};

/// In-memory watermark map: table id → watermark string.
pub type Watermarks = BTreeMap<String, String>;

/// Read and write the watermark of a table. An unset watermark reads as `""`.
pub trait WatermarkStore {
    fn get(&self, table_id: TableId) -> Result<String, SyncError>;
    fn set(&self, table_id: TableId, watermark: &str) -> Result<(), SyncError>;
}

/// [`WatermarkStore`] backed by `last_sync.json` under `home`.
#[derive(Debug, Clone)]
pub struct FileWatermarkStore {
    home: PathBuf,
}

impl FileWatermarkStore {
    pub fn at(home: &Path) -> Self {
        FileWatermarkStore {
            home: home.to_path_buf(),
        }
    }
}

impl WatermarkStore for FileWatermarkStore {
    fn get(&self, table_id: TableId) -> Result<String, SyncError> {
        get_at(&self.home, table_id)
    }

    fn set(&self, table_id: TableId, watermark: &str) -> Result<(), SyncError> {
        set_at(&self.home, table_id, watermark)
    }
}

/// `<home>/.tablesync/last_sync.json`
pub fn store_path_at(home: &Path) -> PathBuf {
    store::state_dir_at(home).join("last_sync.json")
}

/// Load all watermarks. Returns an empty map if the file does not yet exist.
pub fn load_at(home: &Path) -> Result<Watermarks, SyncError> {
    let path = store_path_at(home);
    if !path.exists() {
        return Ok(Watermarks::new());
    }
    let contents = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
    Ok(serde_json::from_str(&contents)?)
}

/// Save all watermarks atomically.
pub fn save_at(home: &Path, watermarks: &Watermarks) -> Result<(), SyncError> {
    let json = serde_json::to_string_pretty(watermarks)?;
    store::write_atomic(&store_path_at(home), &json)?;
    Ok(())
}

/// Watermark for `table_id`, or `""` when never synced.
pub fn get_at(home: &Path, table_id: TableId) -> Result<String, SyncError> {
    Ok(load_at(home)?
        .remove(&table_id.to_string())
        .unwrap_or_default())
}

/// Store `watermark` for `table_id`, keeping every other table's entry.
pub fn set_at(home: &Path, table_id: TableId, watermark: &str) -> Result<(), SyncError> {
    let mut watermarks = load_at(home)?;
    watermarks.insert(table_id.to_string(), watermark.trim().to_string());
    save_at(home, &watermarks)?;
    tracing::debug!("watermark for table {table_id} set to {watermark}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn unset_when_file_missing() {
        let tmp = TempDir::new().unwrap();
        assert_eq!(get_at(tmp.path(), TableId(5)).unwrap(), "");
    }

    #[test]
    fn set_then_get_per_table() {
        let tmp = TempDir::new().unwrap();
        let store = FileWatermarkStore::at(tmp.path());
        store.set(TableId(1), "2024-01-01 00:00:00").unwrap();
        store.set(TableId(2), " 2024-02-02 10:00:00 ").unwrap();
        assert_eq!(store.get(TableId(1)).unwrap(), "2024-01-01 00:00:00");
        assert_eq!(store.get(TableId(2)).unwrap(), "2024-02-02 10:00:00");
        assert_eq!(store.get(TableId(3)).unwrap(), "");
    }

    #[test]
    fn tmp_file_cleaned_up_after_save() {
        let tmp = TempDir::new().unwrap();
        set_at(tmp.path(), TableId(1), "2024-01-01 00:00:00").unwrap();
        let path = store_path_at(tmp.path());
        assert!(path.exists());
        assert!(!path.with_file_name("last_sync.json.tmp").exists());
    }

    #[test]
    fn corrupt_file_is_a_json_error() {
        let tmp = TempDir::new().unwrap();
        let path = store_path_at(tmp.path());
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "[1, 2").unwrap();
        let err = get_at(tmp.path(), TableId(1)).unwrap_err();
        assert!(matches!(err, SyncError::Json(_)), "got: {err}");
    }
}
