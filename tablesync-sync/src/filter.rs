//! Business-status filtering of fetched records.

use std::collections::HashSet;

use tablesync_core::{settings::DEFAULT_SKIP_STATUSES, types::scalar_text, Record, Settings};

/// Decides whether a record is left out of the table.
pub trait RecordFilter {
    fn excludes(&self, record: &Record) -> bool;
}

/// Status values that exclude a record when *both* sides carry one.
///
/// Membership is checked on trimmed, lowercased text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkipStatusSet {
    statuses: HashSet<String>,
}

impl SkipStatusSet {
    pub fn new<I, S>(statuses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let statuses = statuses
            .into_iter()
            .map(|s| normalize(s.as_ref()))
            .filter(|s| !s.is_empty())
            .collect();
        SkipStatusSet { statuses }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(&settings.skip_statuses)
    }

    pub fn contains(&self, status: &str) -> bool {
        self.statuses.contains(&normalize(status))
    }
}

impl Default for SkipStatusSet {
    fn default() -> Self {
        Self::new(DEFAULT_SKIP_STATUSES)
    }
}

impl RecordFilter for SkipStatusSet {
    fn excludes(&self, record: &Record) -> bool {
        self.contains(&scalar_text(&record.educators))
            && self.contains(&scalar_text(&record.students))
    }
}

fn normalize(status: &str) -> String {
    status.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    fn record(educators: &str, students: &str) -> Record {
        Record::from_value(json!({
            "number": "X",
            "educators": educators,
            "students": students,
        }))
        .expect("object")
    }

    #[rstest]
    #[case::both_skipped("Ei käsitelty", "Tarkastettavana", true)]
    #[case::same_status_both_sides("tarkastettavana", "tarkastettavana", true)]
    #[case::padded_and_upper("  EI KÄSITELTY ", " tarkastettavana", true)]
    #[case::educator_only("ei käsitelty", "Hyväksytty", false)]
    #[case::student_only("Hyväksytty", "tarkastettavana", false)]
    #[case::neither("Hyväksytty", "Hylätty", false)]
    #[case::empty_sides("", "", false)]
    fn default_set_excludes_only_when_both_match(
        #[case] educators: &str,
        #[case] students: &str,
        #[case] excluded: bool,
    ) {
        let filter = SkipStatusSet::default();
        assert_eq!(filter.excludes(&record(educators, students)), excluded);
    }

    #[test]
    fn custom_set_from_settings() {
        let settings = Settings {
            skip_statuses: vec!["Draft".to_string()],
            ..Settings::default()
        };
        let filter = SkipStatusSet::from_settings(&settings);
        assert!(filter.excludes(&record("draft", "DRAFT")));
        assert!(!filter.excludes(&record("ei käsitelty", "tarkastettavana")));
    }

    #[test]
    fn non_string_status_never_matches() {
        let filter = SkipStatusSet::default();
        let rec = Record::from_value(json!({"number": "1", "educators": null, "students": 3}))
            .expect("object");
        assert!(!filter.excludes(&rec));
    }
}
