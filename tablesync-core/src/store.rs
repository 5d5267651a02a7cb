//! File-backed table storage.
//!
//! # Storage layout
//!
//! ```text
//! ~/.tablesync/
//!   settings.yaml      (mode 0600: holds the API password)
//!   last_sync.json     (watermark per table)
//!   last_run.json      (outcome of the latest run)
//!   tables/
//!     <table_id>.json  (one file per table: mode 0600)
//! ```
//!
//! # API pattern
//!
//! Every filesystem function has two forms:
//! - `fn_at(home: &Path, …)`: explicit home; used in tests with `TempDir`
//! - `fn(…)`: derives home from `dirs::home_dir()`, delegates to `_at`
//!
//! Tests must NEVER call the no-arg wrappers; always use `_at`.

use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::error::{io_err, StoreError};
use crate::types::{Dataset, TableId};

// ---------------------------------------------------------------------------
// 1. Trait
// ---------------------------------------------------------------------------

/// Load/save access to persisted tables.
pub trait DatasetStore {
    /// Returns [`StoreError::TableNotFound`] when the table does not exist.
    fn load(&self, table_id: TableId) -> Result<Dataset, StoreError>;

    fn save(&self, dataset: &Dataset) -> Result<(), StoreError>;
}

/// [`DatasetStore`] backed by `<home>/.tablesync/tables/*.json`.
#[derive(Debug, Clone)]
pub struct FileDatasetStore {
    home: PathBuf,
}

impl FileDatasetStore {
    pub fn at(home: &Path) -> Self {
        FileDatasetStore {
            home: home.to_path_buf(),
        }
    }

    /// Store rooted at the user's home directory.
    pub fn new() -> Result<Self, StoreError> {
        Ok(Self::at(&home()?))
    }
}

impl DatasetStore for FileDatasetStore {
    fn load(&self, table_id: TableId) -> Result<Dataset, StoreError> {
        load_table_at(&self.home, table_id)
    }

    fn save(&self, dataset: &Dataset) -> Result<(), StoreError> {
        save_table_at(&self.home, dataset)
    }
}

// ---------------------------------------------------------------------------
// 2. Path helpers
// ---------------------------------------------------------------------------

/// `<home>/.tablesync/`: pure, no I/O.
pub fn state_dir_at(home: &Path) -> PathBuf {
    home.join(".tablesync")
}

/// `<home>/.tablesync/tables/<id>.json`: pure, no I/O.
pub fn table_path_at(home: &Path, table_id: TableId) -> PathBuf {
    state_dir_at(home)
        .join("tables")
        .join(format!("{table_id}.json"))
}

/// Ids of every table file under `<home>/.tablesync/tables/`, ascending.
pub fn list_tables_at(home: &Path) -> Result<Vec<TableId>, StoreError> {
    let dir = state_dir_at(home).join("tables");
    if !dir.exists() {
        return Ok(vec![]);
    }
    let mut ids: Vec<TableId> = std::fs::read_dir(&dir)
        .map_err(|e| io_err(&dir, e))?
        .filter_map(|e| e.ok())
        .filter_map(|e| {
            let name = e.file_name().to_string_lossy().into_owned();
            name.strip_suffix(".json")?.parse::<u64>().ok()
        })
        .map(TableId)
        .collect();
    ids.sort();
    Ok(ids)
}

/// `list_tables_at` convenience wrapper.
pub fn list_tables() -> Result<Vec<TableId>, StoreError> {
    list_tables_at(&home()?)
}

// ---------------------------------------------------------------------------
// 3. Load
// ---------------------------------------------------------------------------

/// Load a table from `<home>/.tablesync/tables/<id>.json`.
///
/// Returns `StoreError::TableNotFound` if absent,
/// `StoreError::Decode` (with path) if the file is malformed.
pub fn load_table_at(home: &Path, table_id: TableId) -> Result<Dataset, StoreError> {
    let path = table_path_at(home, table_id);
    if !path.exists() {
        return Err(StoreError::TableNotFound { table_id, path });
    }
    read_json(&path)
}

/// `load_table_at` convenience wrapper.
pub fn load_table(table_id: TableId) -> Result<Dataset, StoreError> {
    load_table_at(&home()?, table_id)
}

// ---------------------------------------------------------------------------
// 4. Save (atomic)
// ---------------------------------------------------------------------------

/// Atomically save a table to `<home>/.tablesync/tables/<id>.json`.
pub fn save_table_at(home: &Path, dataset: &Dataset) -> Result<(), StoreError> {
    let path = table_path_at(home, dataset.id);
    let json = serde_json::to_string_pretty(dataset)?;
    write_atomic(&path, &json)
}

// ---------------------------------------------------------------------------
// 5. Init
// ---------------------------------------------------------------------------

/// Create an empty table with the default header.
///
/// Idempotent: if the table already exists, loads and returns it unchanged.
pub fn init_table_at(
    home: &Path,
    table_id: TableId,
    name: Option<&str>,
) -> Result<Dataset, StoreError> {
    if table_path_at(home, table_id).exists() {
        return load_table_at(home, table_id);
    }
    let mut dataset = Dataset::new(table_id);
    if let Some(name) = name {
        dataset
            .extra
            .insert("name".to_string(), Value::String(name.to_string()));
    }
    save_table_at(home, &dataset)?;
    Ok(dataset)
}

/// `init_table_at` convenience wrapper.
pub fn init_table(table_id: TableId, name: Option<&str>) -> Result<Dataset, StoreError> {
    init_table_at(&home()?, table_id, name)
}

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

/// Home directory from `dirs::home_dir()`.
pub fn home() -> Result<PathBuf, StoreError> {
    dirs::home_dir().ok_or(StoreError::HomeNotFound)
}

/// Read and decode a JSON state file.
pub fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, StoreError> {
    let contents = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
    serde_json::from_str(&contents).map_err(|source| StoreError::Decode {
        path: path.to_path_buf(),
        source,
    })
}

/// Write `contents` to `path` atomically.
///
/// Write flow: create parent (`0700`) → `<name>.tmp` sibling → `chmod 0600`
/// → `rename`. The `.tmp` lives next to the target so the rename never
/// crosses filesystems.
pub fn write_atomic(path: &Path, contents: &str) -> Result<(), StoreError> {
    if let Some(dir) = path.parent() {
        if !dir.exists() {
            std::fs::create_dir_all(dir).map_err(|e| io_err(dir, e))?;
            set_dir_permissions(dir)?;
        }
    }

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tmp = path.with_file_name(format!("{file_name}.tmp"));

    std::fs::write(&tmp, contents).map_err(|e| io_err(&tmp, e))?;
    set_file_permissions(&tmp)?;
    if let Err(e) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(io_err(path, e));
    }
    Ok(())
}

#[cfg(unix)]
fn set_dir_permissions(path: &Path) -> Result<(), StoreError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o700))
        .map_err(|e| io_err(path, e))
}
#[cfg(not(unix))]
fn set_dir_permissions(_path: &Path) -> Result<(), StoreError> {
    Ok(())
}

#[cfg(unix)]
fn set_file_permissions(path: &Path) -> Result<(), StoreError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
        .map_err(|e| io_err(path, e))
}
#[cfg(not(unix))]
fn set_file_permissions(_path: &Path) -> Result<(), StoreError> {
    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
