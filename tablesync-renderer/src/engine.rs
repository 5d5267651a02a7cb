//! Tera rendering engine: turns [`RowFields`] into the nine display cells.
//!
//! # Cell mapping
//!
//! | Cell | Column          | Source                                        |
//! |------|-----------------|-----------------------------------------------|
//! | 0    | Number          | identifier, plain text                        |
//! | 1    | Name            | plain text                                    |
//! | 2    | Educators       | `cells/badge.html.tera`                       |
//! | 3    | Students        | `cells/badge.html.tera`                       |
//! | 4    | Chargeable      | plain text                                    |
//! | 5    | Subjects        | plain text                                    |
//! | 6    | Departments     | `cells/departments.html.tera` for lists       |
//! | 7    | Additional Info | `cells/additional_info.html.tera`             |
//! | 8    | Updated         | `DD.MM.YYYY HH:MM` or the raw value           |

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::{json, Value};
use tera::Tera;

use tablesync_core::{Record, Row};

use crate::error::RenderError;
use crate::fields::{Badge, Departments, RowFields};

// ---------------------------------------------------------------------------
// Embedded templates: baked into the binary at compile time via include_str!
// ---------------------------------------------------------------------------

pub const BADGE_TEMPLATE: &str = "cells/badge.html.tera";
pub const DEPARTMENTS_TEMPLATE: &str = "cells/departments.html.tera";
pub const ADDITIONAL_INFO_TEMPLATE: &str = "cells/additional_info.html.tera";

const TPLS: &[(&str, &str)] = &[
    (BADGE_TEMPLATE, include_str!("templates/badge.html.tera")),
    (DEPARTMENTS_TEMPLATE, include_str!("templates/departments.html.tera")),
    (
        ADDITIONAL_INFO_TEMPLATE,
        include_str!("templates/additional_info.html.tera"),
    ),
];

// ---------------------------------------------------------------------------
// Template loading helpers
// ---------------------------------------------------------------------------

fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> RenderError {
    RenderError::Io { path: path.into(), source }
}

fn normalize_template_name(path: &Path) -> String {
    path.to_string_lossy()
        .replace('\\', "/")
        .to_lowercase()
}

fn collect_template_files(dir: &Path, out: &mut Vec<PathBuf>) -> Result<(), RenderError> {
    let entries = std::fs::read_dir(dir).map_err(|e| io_err(dir, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| io_err(dir, e))?;
        let path = entry.path();
        let meta = entry.metadata().map_err(|e| io_err(&path, e))?;
        if meta.is_dir() {
            collect_template_files(&path, out)?;
        } else if meta.is_file() {
            out.push(path);
        }
    }
    Ok(())
}

fn load_user_templates(dir: &Path) -> Result<Vec<(String, String)>, RenderError> {
    if !dir.exists() {
        return Ok(vec![]);
    }
    let mut files = Vec::new();
    collect_template_files(dir, &mut files)?;
    let mut templates = Vec::new();
    for path in files {
        if path.extension().and_then(|s| s.to_str()) != Some("tera") {
            continue;
        }
        let rel = path.strip_prefix(dir).unwrap_or(path.as_path());
        let name = normalize_template_name(rel);
        let contents = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
        templates.push((name, contents));
    }
    Ok(templates)
}

fn build_tera(user_template_dir: Option<&Path>) -> Result<Tera, RenderError> {
    let mut templates: HashMap<String, String> = HashMap::new();
    for (name, content) in TPLS {
        templates.insert(
            normalize_template_name(Path::new(name)),
            (*content).to_string(),
        );
    }
    if let Some(dir) = user_template_dir {
        for (name, content) in load_user_templates(dir)? {
            templates.insert(name, content);
        }
    }

    let mut tera = Tera::default();
    tera.autoescape_on(vec![".html.tera"]);
    tera.register_filter("esc_html", esc_html_filter);
    let items: Vec<(String, String)> = templates.into_iter().collect();
    tera.add_raw_templates(items)?;
    Ok(tera)
}

/// `esc_html`: escapes `& < > " '` only. Unlike Tera's autoescape it leaves
/// `/` alone, so status text such as `Ok / Not ok` stays readable in the markup.
fn esc_html_filter(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    let text = match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    Ok(Value::String(esc_html(&text)))
}

fn esc_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            _ => out.push(c),
        }
    }
    out
}

// ---------------------------------------------------------------------------
// TemplateEngine
// ---------------------------------------------------------------------------

/// Tera-based engine with optional user overrides.
///
/// `user_template_dir` may contain `.tera` files (e.g. `cells/badge.html.tera`)
/// that replace the embedded defaults. Template names are normalised to
/// lowercase relative paths.
pub struct TemplateEngine {
    tera: Tera,
}

impl TemplateEngine {
    pub fn new(user_template_dir: Option<&Path>) -> Result<Self, RenderError> {
        let tera = build_tera(user_template_dir)?;
        Ok(TemplateEngine { tera })
    }

    /// Render one cell template. Trailing newlines are dropped and line
    /// endings normalised to LF.
    pub fn render_cell<C: Serialize>(&self, name: &str, ctx: &C) -> Result<String, RenderError> {
        let tera_ctx = tera::Context::from_serialize(ctx)?;
        let out = self.tera.render(name, &tera_ctx)?;
        Ok(out.replace("\r\n", "\n").trim_end_matches('\n').to_string())
    }
}

// ---------------------------------------------------------------------------
// RowRenderer
// ---------------------------------------------------------------------------

/// Anything that can turn a fetched record into a display row.
pub trait RowRenderer {
    fn render_row(&self, record: &Record) -> Result<Row, RenderError>;
}

/// Default [`RowRenderer`]: [`RowFields`] extraction followed by templated
/// markup. Create once and reuse across a run.
pub struct Renderer {
    engine: TemplateEngine,
}

impl Renderer {
    /// Renderer with embedded templates only.
    pub fn new() -> Result<Self, RenderError> {
        Ok(Renderer { engine: TemplateEngine::new(None)? })
    }

    /// Renderer whose embedded templates may be overridden from `dir`.
    pub fn with_template_dir(dir: &Path) -> Result<Self, RenderError> {
        Ok(Renderer { engine: TemplateEngine::new(Some(dir))? })
    }

    /// Markup-free field extraction.
    pub fn fields(&self, record: &Record) -> RowFields {
        RowFields::from_record(record)
    }

    /// Format extracted fields into the nine display cells.
    pub fn display(&self, fields: &RowFields) -> Result<Row, RenderError> {
        let departments = match &fields.departments {
            Departments::List(names) => self
                .engine
                .render_cell(DEPARTMENTS_TEMPLATE, &json!({ "departments": names }))?,
            Departments::Text(text) => text.clone(),
        };

        Ok(Row(vec![
            fields.number.clone(),
            fields.name.clone(),
            self.badge(&fields.educators)?,
            self.badge(&fields.students)?,
            fields.chargeable.clone(),
            fields.subjects.clone(),
            departments,
            self.engine.render_cell(ADDITIONAL_INFO_TEMPLATE, &fields.notes)?,
            fields.updated.clone(),
        ]))
    }

    fn badge(&self, badge: &Badge) -> Result<String, RenderError> {
        if badge.is_empty() {
            return Ok(String::new());
        }
        self.engine.render_cell(BADGE_TEMPLATE, badge)
    }
}

impl RowRenderer for Renderer {
    fn render_row(&self, record: &Record) -> Result<Row, RenderError> {
        self.display(&self.fields(record))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
