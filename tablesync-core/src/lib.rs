//! tablesync core library: domain types, timestamp parsing, natural ordering,
//! settings and table persistence.
//!
//! - [`types`]: records, rows, datasets, table ids
//! - [`timestamp`]: loose `updated` parsing and display formatting
//! - [`natord`]: natural case-insensitive comparator
//! - [`settings`]: YAML settings load / save / validate
//! - [`store`]: [`DatasetStore`] and the file-backed implementation
//! - [`error`]: [`StoreError`], [`ValidationError`]

pub mod error;
pub mod natord;
pub mod settings;
pub mod store;
pub mod timestamp;
pub mod types;

pub use error::{StoreError, ValidationError};
pub use settings::Settings;
pub use store::{DatasetStore, FileDatasetStore};
pub use types::{Dataset, Record, Row, TableId};
