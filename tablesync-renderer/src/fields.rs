//! Pure field extraction: turns a [`Record`] into plain-text cell values.
//!
//! Nothing here emits markup; [`crate::engine::Renderer::display`] does that
//! from the resulting [`RowFields`].

use serde::Serialize;
use serde_json::Value;

use tablesync_core::{natord, timestamp, types::scalar_text, Record};

/// A status value plus the CSS-safe slug used for its badge class.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Badge {
    /// Trimmed status text; empty means "no badge".
    pub text: String,
    pub slug: String,
}

impl Badge {
    pub fn from_status(value: &Value) -> Self {
        let text = scalar_text(value).trim().to_string();
        let slug = slugify(&text);
        Badge { text, slug }
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Departments as sent: a list (sorted naturally) or a single pre-formatted value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Departments {
    List(Vec<String>),
    Text(String),
}

/// Educator- and student-facing free-text notes, trimmed.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Notes {
    pub educator: String,
    pub student: String,
}

impl Notes {
    pub fn is_empty(&self) -> bool {
        self.educator.is_empty() && self.student.is_empty()
    }
}

/// Display fields of one row, in header order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowFields {
    pub number: String,
    pub name: String,
    pub educators: Badge,
    pub students: Badge,
    pub chargeable: String,
    pub subjects: String,
    pub departments: Departments,
    pub notes: Notes,
    /// Already normalized to `DD.MM.YYYY HH:MM` when parsable.
    pub updated: String,
}

impl RowFields {
    pub fn from_record(record: &Record) -> Self {
        RowFields {
            number: scalar_text(&record.number),
            name: scalar_text(&record.name),
            educators: Badge::from_status(&record.educators),
            students: Badge::from_status(&record.students),
            chargeable: scalar_text(&record.chargeable),
            subjects: scalar_text(&record.subjects),
            departments: departments(&record.departments),
            notes: Notes {
                educator: scalar_text(&record.educator_notes).trim().to_string(),
                student: scalar_text(&record.student_notes).trim().to_string(),
            },
            updated: updated_display(&record.updated),
        }
    }
}

fn departments(value: &Value) -> Departments {
    match value {
        Value::Array(items) => {
            let mut names: Vec<String> = items.iter().map(scalar_text).collect();
            natord::sort_ignore_case(&mut names);
            Departments::List(names)
        }
        other => Departments::Text(scalar_text(other)),
    }
}

fn updated_display(value: &Value) -> String {
    match value {
        Value::String(s) => timestamp::display(s),
        other => scalar_text(other),
    }
}

/// Lowercase ASCII slug: accents folded, runs of whitespace, dots and dashes
/// become a single `-`, other punctuation dropped, no leading or trailing `-`.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_dash = false;

    for c in text.chars().flat_map(char::to_lowercase) {
        if c.is_whitespace() || c == '-' || c == '.' {
            pending_dash = true;
            continue;
        }
        let keep = c.is_ascii_alphanumeric() || c == '_';
        let folded = if keep { None } else { fold_accent(c) };
        if !keep && folded.is_none() {
            continue;
        }
        if pending_dash && !slug.is_empty() {
            slug.push('-');
        }
        pending_dash = false;
        match folded {
            Some(ascii) => slug.push_str(ascii),
            None => slug.push(c),
        }
    }
    slug
}

fn fold_accent(c: char) -> Option<&'static str> {
    let folded = match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' => "a",
        'æ' => "ae",
        'ç' => "c",
        'è' | 'é' | 'ê' | 'ë' => "e",
        'ì' | 'í' | 'î' | 'ï' => "i",
        'ñ' => "n",
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' => "o",
        'ù' | 'ú' | 'û' | 'ü' => "u",
        'ý' | 'ÿ' => "y",
        'š' => "s",
        'ž' => "z",
        'ß' => "ss",
        _ => return None,
    };
    Some(folded)
}
