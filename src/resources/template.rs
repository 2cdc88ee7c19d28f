//! Template rendering for generated entries.
use std::fmt;

use crate::config::VariableTable;
use crate::error::RenderError;

/// Renders template text with the manifest variables.
pub trait TemplateRenderer: Send + Sync + fmt::Debug {
    /// Render `template` with `variables`.
    ///
    /// # Errors
    ///
    /// Returns a [`RenderError`] if the template is malformed or references
    /// an undefined variable.
    fn render(&self, template: &str, variables: &VariableTable) -> Result<String, RenderError>;
}

/// Substitutes `{{ name }}` placeholders.
///
/// Whitespace inside the braces is ignored. Placeholders may not span lines.
#[derive(Debug, Default, Clone, Copy)]
pub struct BraceRenderer;

const OPEN: &str = "{{";
const CLOSE: &str = "}}";

impl TemplateRenderer for BraceRenderer {
    fn render(&self, template: &str, variables: &VariableTable) -> Result<String, RenderError> {
        let mut out = String::with_capacity(template.len());
        for (index, line) in template.split_inclusive('\n').enumerate() {
            render_line(line, index + 1, variables, &mut out)?;
        }
        Ok(out)
    }
}

fn render_line(
    line: &str,
    number: usize,
    variables: &VariableTable,
    out: &mut String,
) -> Result<(), RenderError> {
    let mut rest = line;
    while let Some(start) = rest.find(OPEN) {
        let (before, after_open) = rest.split_at(start);
        out.push_str(before);
        let after_open = after_open.get(OPEN.len()..).unwrap_or_default();
        let end = after_open
            .find(CLOSE)
            .ok_or(RenderError::Unterminated { line: number })?;
        let (name, after_name) = after_open.split_at(end);
        let name = name.trim();
        let value = variables
            .get(name)
            .ok_or_else(|| RenderError::UndefinedVariable {
                name: name.to_string(),
                line: number,
            })?;
        out.push_str(value);
        rest = after_name.get(CLOSE.len()..).unwrap_or_default();
    }
    out.push_str(rest);
    Ok(())
}
