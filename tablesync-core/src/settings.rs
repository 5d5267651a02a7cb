//! Persistent settings: API endpoint, credentials, target table, skip statuses.
//!
//! Stored as YAML at `<home>/.tablesync/settings.yaml` (mode `0600`, since it
//! holds the API password in clear text). A missing file yields defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{io_err, StoreError, ValidationError};
use crate::store::{home, state_dir_at, write_atomic};
use crate::types::TableId;

/// Default HTTP timeout for the record fetch.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Statuses that exclude a record when both sides carry one of them.
pub const DEFAULT_SKIP_STATUSES: [&str; 2] = ["ei käsitelty", "tarkastettavana"];

const MISSING_SETTINGS: &str =
    "Missing settings: provide API URL, username, password, and a valid table ID.";

/// Everything a sync run needs besides the data itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub api_url: String,
    pub api_user: String,
    pub api_pass: String,
    pub table_id: i64,
    pub timeout_secs: u64,
    pub skip_statuses: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            api_url: String::new(),
            api_user: String::new(),
            api_pass: String::new(),
            table_id: 0,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            skip_statuses: DEFAULT_SKIP_STATUSES.iter().map(|s| (*s).to_string()).collect(),
        }
    }
}

impl Settings {
    /// Check that a run can start; returns the validated table id.
    pub fn validate(&self) -> Result<TableId, ValidationError> {
        let table_id = TableId::from_signed(self.table_id);
        if self.api_url.trim().is_empty()
            || self.api_user.trim().is_empty()
            || self.api_pass.is_empty()
        {
            return Err(ValidationError(MISSING_SETTINGS.to_string()));
        }
        table_id.ok_or_else(|| ValidationError(MISSING_SETTINGS.to_string()))
    }

    /// Password replaced by asterisks, for display.
    pub fn masked_pass(&self) -> String {
        if self.api_pass.is_empty() {
            String::new()
        } else {
            "********".to_string()
        }
    }
}

/// `<home>/.tablesync/settings.yaml`: pure, no I/O.
pub fn settings_path_at(home: &Path) -> PathBuf {
    state_dir_at(home).join("settings.yaml")
}

/// Load settings, falling back to [`Settings::default`] when the file is absent.
///
/// Returns `StoreError::Parse` (with path + line context) on malformed YAML.
pub fn load_at(home: &Path) -> Result<Settings, StoreError> {
    let path = settings_path_at(home);
    if !path.exists() {
        return Ok(Settings::default());
    }
    let contents = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
    serde_yaml::from_str(&contents).map_err(|source| StoreError::Parse { path, source })
}

/// `load_at` convenience wrapper.
pub fn load() -> Result<Settings, StoreError> {
    load_at(&home()?)
}

/// Atomically save settings (mode `0600`).
pub fn save_at(home: &Path, settings: &Settings) -> Result<(), StoreError> {
    let yaml = serde_yaml::to_string(settings)?;
    write_atomic(&settings_path_at(home), &yaml)
}

/// `save_at` convenience wrapper.
pub fn save(settings: &Settings) -> Result<(), StoreError> {
    save_at(&home()?, settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn complete() -> Settings {
        Settings {
            api_url: "https://example.service-now.com/api/x/apps".to_string(),
            api_user: "sync".to_string(),
            api_pass: "secret".to_string(),
            table_id: 3,
            ..Settings::default()
        }
    }

    #[test]
    fn defaults_carry_skip_statuses_and_timeout() {
        let s = Settings::default();
        assert_eq!(s.timeout_secs, 30);
        assert_eq!(s.skip_statuses, vec!["ei käsitelty", "tarkastettavana"]);
    }

    #[test]
    fn validate_accepts_complete_settings() {
        assert_eq!(complete().validate(), Ok(TableId(3)));
    }

    #[test]
    fn validate_rejects_missing_credentials() {
        let mut s = complete();
        s.api_pass.clear();
        let err = s.validate().unwrap_err();
        assert!(err.to_string().starts_with("Missing settings"));
    }

    #[test]
    fn validate_rejects_non_positive_table() {
        let mut s = complete();
        s.table_id = 0;
        assert!(s.validate().is_err());
        s.table_id = -1;
        assert!(s.validate().is_err());
    }

    #[test]
    fn missing_file_yields_defaults() {
        let home = TempDir::new().unwrap();
        assert_eq!(load_at(home.path()).unwrap(), Settings::default());
    }

    #[test]
    fn partial_yaml_fills_defaults() {
        let home = TempDir::new().unwrap();
        let path = settings_path_at(home.path());
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "api_url: https://x\ntable_id: 5\n").unwrap();
        let s = load_at(home.path()).unwrap();
        assert_eq!(s.api_url, "https://x");
        assert_eq!(s.table_id, 5);
        assert_eq!(s.timeout_secs, DEFAULT_TIMEOUT_SECS);
    }

    #[test]
    fn save_and_load_roundtrip() {
        let home = TempDir::new().unwrap();
        save_at(home.path(), &complete()).unwrap();
        assert_eq!(load_at(home.path()).unwrap(), complete());
    }

    #[test]
    fn masked_pass_hides_secret() {
        assert_eq!(complete().masked_pass(), "********");
        assert_eq!(Settings::default().masked_pass(), "");
    }
}
