//! Domain types for tablesync.
//!
//! Remote record fields stay loosely typed (`serde_json::Value`) because the
//! upstream catalog sends strings, lists, or nested objects for the same field.
//! Dataset metadata the engine does not interpret is carried the same way and
//! round-tripped untouched.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// A strongly-typed identifier for a persisted table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TableId(pub u64);

impl fmt::Display for TableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<u64> for TableId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl TableId {
    /// Accepts only strictly positive ids.
    pub fn from_signed(id: i64) -> Option<Self> {
        u64::try_from(id).ok().filter(|v| *v > 0).map(Self)
    }
}

// ---------------------------------------------------------------------------
// Header
// ---------------------------------------------------------------------------

/// Number of display columns in a rendered row.
pub const COLUMN_COUNT: usize = 9;

/// Column labels written when a table has no usable header.
pub const DEFAULT_HEADER: [&str; COLUMN_COUNT] = [
    "Number",
    "Name",
    "Educators",
    "Students",
    "Chargeable",
    "Subjects",
    "Departments",
    "Additional Info",
    "Updated",
];

/// [`DEFAULT_HEADER`] as owned strings.
pub fn default_header() -> Vec<String> {
    DEFAULT_HEADER.iter().map(|s| (*s).to_string()).collect()
}

// ---------------------------------------------------------------------------
// Scalar text
// ---------------------------------------------------------------------------

/// Flatten a JSON value into display text.
///
/// Strings are taken verbatim, numbers and booleans are stringified, `null`
/// becomes empty, lists are joined with `", "` and objects are emitted as
/// compact JSON.
pub fn scalar_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) => items.iter().map(scalar_text).collect::<Vec<_>>().join(", "),
        Value::Object(_) => value.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

/// One entity from the remote catalog.
///
/// Every field defaults to `null` so partial payloads still deserialize.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Record {
    #[serde(default)]
    pub number: Value,
    #[serde(default)]
    pub name: Value,
    /// Educator-side review status.
    #[serde(default)]
    pub educators: Value,
    /// Student-side review status.
    #[serde(default)]
    pub students: Value,
    #[serde(default)]
    pub chargeable: Value,
    #[serde(default)]
    pub subjects: Value,
    #[serde(default)]
    pub departments: Value,
    #[serde(default, rename = "educatorDescription")]
    pub educator_notes: Value,
    #[serde(default, rename = "studentDescription")]
    pub student_notes: Value,
    #[serde(default)]
    pub updated: Value,
}

impl Record {
    /// Decode one item of the fetched `result` list.
    ///
    /// Returns `None` for anything that is not a JSON object.
    pub fn from_value(value: Value) -> Option<Self> {
        if !value.is_object() {
            return None;
        }
        serde_json::from_value(value).ok()
    }

    /// Trimmed identifier; empty when the record carries none.
    pub fn id(&self) -> String {
        scalar_text(&self.number).trim().to_string()
    }

    /// Raw `updated` text as sent by the remote.
    pub fn updated_text(&self) -> String {
        scalar_text(&self.updated)
    }
}

// ---------------------------------------------------------------------------
// Row
// ---------------------------------------------------------------------------

/// One data row of a table. Cell 0 holds the record identifier.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Row(pub Vec<String>);

impl Row {
    /// Trimmed identifier cell, or `""` for an empty row.
    pub fn key(&self) -> &str {
        self.0.first().map(|c| c.trim()).unwrap_or("")
    }

    pub fn cells(&self) -> &[String] {
        &self.0
    }
}

impl From<Vec<String>> for Row {
    fn from(cells: Vec<String>) -> Self {
        Self(cells)
    }
}

impl From<Vec<&str>> for Row {
    fn from(cells: Vec<&str>) -> Self {
        Self(cells.into_iter().map(str::to_owned).collect())
    }
}

// ---------------------------------------------------------------------------
// Dataset
// ---------------------------------------------------------------------------

/// A persisted table: header, ordered rows, and opaque display metadata.
///
/// `options` and `visibility` are never interpreted beyond the hidden-column
/// flag; unknown top-level keys land in `extra` and are written back as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub id: TableId,
    /// Empty when the table has no usable header.
    #[serde(default)]
    pub header: Vec<String>,
    #[serde(default)]
    pub rows: Vec<Row>,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub options: Value,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub visibility: Value,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Dataset {
    /// An empty table with the default header and no metadata.
    pub fn new(id: TableId) -> Self {
        Dataset {
            id,
            header: default_header(),
            rows: Vec::new(),
            options: Value::Null,
            visibility: Value::Null,
            extra: Map::new(),
        }
    }

    /// Number of data rows, header excluded.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Optional human-readable table name kept in `extra`.
    pub fn name(&self) -> Option<&str> {
        self.extra.get("name").and_then(Value::as_str)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
