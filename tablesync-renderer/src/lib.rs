//! # tablesync-renderer
//!
//! Turns fetched records into nine-cell display rows.
//!
//! Rendering is split in two: [`RowFields::from_record`] extracts plain-text
//! values, and [`Renderer::display`] applies the Tera cell templates (status
//! badges, department list, additional-info blocks).
//!
//! ## Usage
//!
//! ```rust,no_run
//! use tablesync_core::Record;
//! use tablesync_renderer::{Renderer, RowRenderer};
//!
//! fn first_cell(record: &Record) -> Option<String> {
//!     let renderer = Renderer::new().ok()?;
//!     let row = renderer.render_row(record).ok()?;
//!     Some(row.key().to_string())
//! }
//! ```

pub mod engine;
pub mod error;
pub mod fields;

pub use engine::{Renderer, RowRenderer, TemplateEngine};
pub use error::RenderError;
pub use fields::{Badge, Departments, Notes, RowFields};
