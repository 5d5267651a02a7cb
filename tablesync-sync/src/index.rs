//! Ordered rows keyed by identifier.
//!
//! Rows keep their first-seen position; replacing a key never moves it.
//! Lookup is O(1) through a key → position map.

use std::collections::HashMap;

use tablesync_core::Row;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderedRows {
    rows: Vec<Row>,
    index: HashMap<String, usize>,
}

impl OrderedRows {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index existing rows. Rows with an empty key are dropped; a repeated key
    /// keeps its first position and takes the later row's cells.
    pub fn from_rows(rows: impl IntoIterator<Item = Row>) -> Self {
        let mut ordered = Self::new();
        for row in rows {
            if row.key().is_empty() {
                tracing::debug!("dropping existing row without identifier");
                continue;
            }
            if ordered.contains(row.key()) {
                tracing::warn!("duplicate identifier {:?} in existing rows", row.key());
            }
            ordered.upsert(row);
        }
        ordered
    }

    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// Replace the row stored under the row's key in place, or append it.
    /// Returns `true` when an existing row was replaced.
    pub fn upsert(&mut self, row: Row) -> bool {
        let key = row.key().to_string();
        match self.index.get(&key) {
            Some(&pos) => {
                self.rows[pos] = row;
                true
            }
            None => {
                self.index.insert(key, self.rows.len());
                self.rows.push(row);
                false
            }
        }
    }

    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> Row {
        Row::from(cells.to_vec())
    }

    #[test]
    fn upsert_replaces_in_place() {
        let mut rows = OrderedRows::from_rows(vec![row(&["A", "1"]), row(&["B", "2"])]);
        assert!(rows.upsert(row(&["A", "new"])));
        assert!(!rows.upsert(row(&["C", "3"])));
        let keys: Vec<String> = rows.into_rows().iter().map(|r| r.key().to_string()).collect();
        assert_eq!(keys, ["A", "B", "C"]);
    }

    #[test]
    fn empty_keys_are_dropped() {
        let rows = OrderedRows::from_rows(vec![row(&["", "x"]), row(&["  ", "y"]), row(&["A"])]);
        assert!(rows.contains("A"));
        assert_eq!(rows.into_rows().len(), 1);
    }

    #[test]
    fn duplicate_keys_keep_first_position() {
        let rows = OrderedRows::from_rows(vec![
            row(&["A", "first"]),
            row(&["B"]),
            row(&["A", "second"]),
        ]);
        let rows = rows.into_rows();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].key(), "A");
        assert_eq!(rows[0].cells()[1], "second");
    }

    #[test]
    fn keys_are_trimmed() {
        let rows = OrderedRows::from_rows(vec![row(&[" A ", "x"])]);
        assert!(rows.contains("A"));
    }
}
