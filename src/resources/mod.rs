//! File primitives: template rendering, content comparison, and writes.
pub mod file;
pub mod fs;
pub mod template;

pub use file::{EntryAction, Prepared, render_to_temp};
pub use template::{BraceRenderer, TemplateRenderer};
