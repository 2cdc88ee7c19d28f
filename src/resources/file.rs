//! Writing one destination file from its source.
use anyhow::{Context as _, Result};
use std::io::Write as _;
use std::path::Path;

use super::template::TemplateRenderer;
use crate::config::VariableTable;
use crate::error::SyncError;

/// What producing the destination of an entry means.
#[derive(Debug, Clone, Copy)]
pub enum EntryAction<'a> {
    /// Copy the source bytes.
    Copy,
    /// Render the source as a template.
    Generate {
        renderer: &'a dyn TemplateRenderer,
        variables: &'a VariableTable,
    },
}

impl EntryAction<'_> {
    /// Verb used in log lines.
    #[must_use]
    pub const fn verb(&self) -> &'static str {
        match self {
            Self::Copy => "copying",
            Self::Generate { .. } => "generating",
        }
    }

    /// The bytes the destination should hold, rendered fresh on every call.
    ///
    /// # Errors
    ///
    /// Returns an error if `from` cannot be read or the template fails to
    /// render (as [`SyncError::Render`]).
    pub fn content(&self, from: &Path) -> Result<Vec<u8>> {
        match self {
            Self::Copy => std::fs::read(from).with_context(|| format!("read {}", from.display())),
            Self::Generate {
                renderer,
                variables,
            } => {
                let template = std::fs::read_to_string(from)
                    .with_context(|| format!("read template {}", from.display()))?;
                let rendered =
                    renderer
                        .render(&template, variables)
                        .map_err(|source| SyncError::Render {
                            path: from.to_path_buf(),
                            source,
                        })?;
                Ok(rendered.into_bytes())
            }
        }
    }

    /// Everything needed to write the destination, rendered now.
    ///
    /// # Errors
    ///
    /// Returns an error if the template cannot be read or rendered.
    pub fn prepare<'p>(&self, from: &'p Path) -> Result<Prepared<'p>> {
        match self {
            Self::Copy => Ok(Prepared::Copy(from)),
            Self::Generate { .. } => self.content(from).map(Prepared::Rendered),
        }
    }
}

/// Destination content that is ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Prepared<'p> {
    /// Copied from this file, permissions included.
    Copy(&'p Path),
    Rendered(Vec<u8>),
}

impl Prepared<'_> {
    /// Whether `to` already holds exactly these bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if either side cannot be read.
    pub fn matches(&self, to: &Path) -> Result<bool> {
        let existing = std::fs::read(to).with_context(|| format!("read {}", to.display()))?;
        Ok(match self {
            Self::Copy(from) => {
                std::fs::read(from).with_context(|| format!("read {}", from.display()))?
                    == existing
            }
            Self::Rendered(content) => *content == existing,
        })
    }

    /// Write `to`. The parent directory must already exist.
    ///
    /// # Errors
    ///
    /// Returns an error if copying or writing fails.
    pub fn write(&self, to: &Path) -> Result<()> {
        match self {
            Self::Copy(from) => {
                std::fs::copy(from, to)
                    .with_context(|| format!("copy {} to {}", from.display(), to.display()))?;
            }
            Self::Rendered(content) => {
                std::fs::write(to, content).with_context(|| format!("write {}", to.display()))?;
            }
        }
        Ok(())
    }
}

/// Render a generated entry into a temporary file, deleted when dropped.
///
/// # Errors
///
/// Returns an error if rendering fails or the temporary file cannot be
/// written. No temporary file outlives a failure.
pub fn render_to_temp(action: &EntryAction<'_>, from: &Path) -> Result<tempfile::NamedTempFile> {
    let content = action.content(from)?;
    let mut file = tempfile::Builder::new()
        .prefix("dotsync-")
        .suffix(&suffix_of(from))
        .tempfile()
        .context("create temporary file")?;
    file.write_all(&content).context("write temporary file")?;
    file.flush().context("flush temporary file")?;
    Ok(file)
}

/// Keep the extension so diff tools pick the right syntax.
fn suffix_of(path: &Path) -> String {
    path.extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default()
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::resources::template::BraceRenderer;

    fn vars() -> VariableTable {
        let mut t = VariableTable::new();
        t.set("name", "world").unwrap();
        t
    }

    #[test]
    fn copy_then_same() {
        let dir = tempfile::tempdir().unwrap();
        let from = dir.path().join("a.txt");
        let to = dir.path().join("b.txt");
        std::fs::write(&from, "hi").unwrap();

        EntryAction::Copy.prepare(&from).unwrap().write(&to).unwrap();
        assert_eq!(std::fs::read_to_string(&to).unwrap(), "hi");
        assert!(EntryAction::Copy.prepare(&from).unwrap().matches(&to).unwrap());

        std::fs::write(&to, "bye").unwrap();
        assert!(!EntryAction::Copy.prepare(&from).unwrap().matches(&to).unwrap());
    }

    #[test]
    fn generate_writes_rendered_text() {
        let dir = tempfile::tempdir().unwrap();
        let from = dir.path().join("t.conf");
        let to = dir.path().join("out.conf");
        std::fs::write(&from, "hello {{ name }}\n").unwrap();
        let variables = vars();
        let action = EntryAction::Generate {
            renderer: &BraceRenderer,
            variables: &variables,
        };

        action.prepare(&from).unwrap().write(&to).unwrap();
        assert_eq!(std::fs::read_to_string(&to).unwrap(), "hello world\n");
        assert!(action.prepare(&from).unwrap().matches(&to).unwrap());
        assert_eq!(action.verb(), "generating");
    }

    #[test]
    fn generated_sameness_sees_template_drift() {
        let dir = tempfile::tempdir().unwrap();
        let from = dir.path().join("t.conf");
        let to = dir.path().join("out.conf");
        std::fs::write(&from, "hello {{ name }}\n").unwrap();
        std::fs::write(&to, "hello world\n").unwrap();
        let mut variables = vars();
        variables.set("name", "there").unwrap();
        let action = EntryAction::Generate {
            renderer: &BraceRenderer,
            variables: &variables,
        };
        assert!(!action.prepare(&from).unwrap().matches(&to).unwrap());
    }

    #[test]
    fn render_failure_leaves_destination_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let from = dir.path().join("t.conf");
        let to = dir.path().join("out.conf");
        std::fs::write(&from, "{{ undefined }}").unwrap();
        std::fs::write(&to, "old").unwrap();
        let variables = vars();
        let action = EntryAction::Generate {
            renderer: &BraceRenderer,
            variables: &variables,
        };

        let err = action.prepare(&from).unwrap_err();
        assert!(err.downcast_ref::<SyncError>().is_some());
        assert_eq!(std::fs::read_to_string(&to).unwrap(), "old");
    }

    #[test]
    fn prepare_renders_up_front() {
        let dir = tempfile::tempdir().unwrap();
        let from = dir.path().join("t.conf");
        std::fs::write(&from, "{{ name }} and {{ missing }}").unwrap();
        let variables = vars();
        let action = EntryAction::Generate {
            renderer: &BraceRenderer,
            variables: &variables,
        };
        assert!(action.prepare(&from).is_err());
        assert_eq!(EntryAction::Copy.prepare(&from).unwrap(), Prepared::Copy(from.as_path()));
    }

    #[test]
    fn temp_render_is_removed_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let from = dir.path().join("kitty.conf");
        std::fs::write(&from, "{{ name }}").unwrap();
        let variables = vars();
        let action = EntryAction::Generate {
            renderer: &BraceRenderer,
            variables: &variables,
        };

        let tmp = render_to_temp(&action, &from).unwrap();
        let path = tmp.path().to_path_buf();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "world");
        assert_eq!(path.extension().unwrap(), "conf");
        drop(tmp);
        assert!(!path.exists());
    }
}
