//! Comparing installed destinations with their sources.
use anyhow::Result;
use std::fmt;
use std::path::{Path, PathBuf};

use super::Context;
use crate::config::{ClassState, Manifest, TreeSide};
use crate::resources::{EntryAction, render_to_temp};

/// How a destination relates to its source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Same,
    Different,
    MissingInDestination,
    MissingInSource,
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Same => write!(f, "Same"),
            Self::Different => write!(f, "Different"),
            Self::MissingInDestination => write!(f, "Missing in HOME"),
            Self::MissingInSource => write!(f, "Missing in SRC"),
        }
    }
}

/// One classified entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub classification: Classification,
}

impl fmt::Display for StatusLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.classification {
            Classification::MissingInDestination => {
                write!(f, "{} {}", self.classification, self.destination.display())
            }
            Classification::MissingInSource => {
                write!(f, "{} {}", self.classification, self.source.display())
            }
            Classification::Same | Classification::Different => write!(
                f,
                "{} {} {}",
                self.classification,
                self.destination.display(),
                self.source.display()
            ),
        }
    }
}

/// Classify every active entry, in manifest order. Directory trees list
/// files from both sides, so a file only in the destination shows up as
/// missing in the source.
///
/// Only non-[`Same`](Classification::Same) lines are logged unless
/// `verbose`. An entry whose comparison fails (e.g. a template that does not
/// render) is logged as an error and left out.
///
/// # Errors
///
/// Returns an error if a destination cannot be resolved.
pub fn status(
    ctx: &Context,
    manifest: &Manifest,
    classes: &ClassState,
    verbose: bool,
) -> Result<Vec<StatusLine>> {
    let mut lines = Vec::new();
    for entry in &ctx.entries(manifest, classes, TreeSide::Both)? {
        let paths = ctx.entry_paths(entry)?;
        let action = ctx.action(entry, manifest);
        let classification = match classify(&action, &paths.source, &paths.destination) {
            Ok(c) => c,
            Err(e) => {
                ctx.log.error(&format!("{e:#}"));
                continue;
            }
        };
        let line = StatusLine {
            source: paths.source,
            destination: paths.destination,
            classification,
        };
        if classification != Classification::Same || verbose {
            ctx.log.info(&line.to_string());
        }
        lines.push(line);
    }
    Ok(lines)
}

fn classify(
    action: &EntryAction<'_>,
    source: &Path,
    destination: &Path,
) -> Result<Classification> {
    if !destination.is_file() {
        return Ok(Classification::MissingInDestination);
    }
    if !source.is_file() {
        return Ok(Classification::MissingInSource);
    }
    let same = match action {
        EntryAction::Copy => std::fs::read(source)? == std::fs::read(destination)?,
        EntryAction::Generate { .. } => {
            let rendered = render_to_temp(action, source)?;
            std::fs::read(rendered.path())? == std::fs::read(destination)?
        }
    };
    Ok(if same {
        Classification::Same
    } else {
        Classification::Different
    })
}
