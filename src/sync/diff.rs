//! Opening one entry in an external diff tool.
use anyhow::Result;
use std::path::Path;

use super::{Context, EntryPaths};
use crate::config::{ClassState, EntryKind, Manifest, ManifestEntry, TreeSide};
use crate::error::SyncError;
use crate::resources::render_to_temp;

/// Result of a `diff` request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffOutcome {
    NoMatches,
    /// More than one entry matched; nothing was launched.
    Ambiguous(usize),
    /// `--print` was given for a single match.
    Printed,
    /// The tool ran and exited with `code`.
    Launched { tool: String, code: Option<i32> },
    /// No candidate tool was found.
    ToolUnavailable,
}

/// Program plus leading arguments; the two file paths are appended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffTool {
    pub program: String,
    pub args: Vec<String>,
}

impl DiffTool {
    fn new(program: &str, args: &[&str]) -> Self {
        Self {
            program: program.to_string(),
            args: args.iter().map(|a| (*a).to_string()).collect(),
        }
    }
}

/// Built-in candidates for this platform, in preference order.
fn candidates(ctx: &Context) -> Vec<DiffTool> {
    if ctx.platform.is_windows() {
        vec![DiffTool::new("WinMergeU.exe", &["/e", "/x", "/u", "/maximize"])]
    } else {
        vec![DiffTool::new("meld", &[]), DiffTool::new("diff", &["-u"])]
    }
}

/// Pick the configured tool if usable, else the first built-in on `PATH`.
///
/// # Errors
///
/// Returns [`SyncError::ExternalToolUnavailable`] naming every candidate
/// tried.
pub fn resolve_tool(ctx: &Context, configured: Option<&Path>) -> Result<DiffTool, SyncError> {
    let mut tried = Vec::new();
    if let Some(path) = configured {
        let program = path.to_string_lossy();
        if path.is_file() || ctx.executor.which(&program).is_some() {
            return Ok(DiffTool::new(&program, &[]));
        }
        tried.push(program.into_owned());
    }
    for tool in candidates(ctx) {
        if ctx.executor.which(&tool.program).is_some() {
            return Ok(tool);
        }
        tried.push(tool.program);
    }
    Err(SyncError::ExternalToolUnavailable {
        tried: tried.join(", "),
    })
}

/// Open the single entry whose paths contain every pattern.
///
/// With zero or several matches nothing is launched; several matches are
/// listed only when `print` is set. With exactly one match, `print` logs the
/// pair instead of launching the tool. Generated entries are compared
/// through a rendered temporary file.
///
/// # Errors
///
/// Returns an error if a destination cannot be resolved, a template fails
/// to render, or the tool cannot be spawned. A missing tool is a warning,
/// not an error.
pub fn diff(
    ctx: &Context,
    manifest: &Manifest,
    classes: &ClassState,
    patterns: &[String],
    print: bool,
    configured_tool: Option<&Path>,
) -> Result<DiffOutcome> {
    let mut matches: Vec<(EntryPaths, ManifestEntry)> = Vec::new();
    for entry in ctx.entries(manifest, classes, TreeSide::Both)? {
        let paths = ctx.entry_paths(&entry)?;
        if paths.matches(patterns) {
            matches.push((paths, entry));
        }
    }

    let (paths, entry) = match matches.as_slice() {
        [] => {
            ctx.log.info("No matches found");
            return Ok(DiffOutcome::NoMatches);
        }
        [single] => single.clone(),
        many => {
            ctx.log.info(&format!("Found {} matches", many.len()));
            if print {
                for (paths, _) in many {
                    ctx.log.info(&format!(
                        "{} {}",
                        paths.source.display(),
                        paths.destination.display()
                    ));
                }
            }
            return Ok(DiffOutcome::Ambiguous(many.len()));
        }
    };

    if print {
        ctx.log.info(&format!(
            "{} {}",
            paths.source.display(),
            paths.destination.display()
        ));
        return Ok(DiffOutcome::Printed);
    }

    let tool = match resolve_tool(ctx, configured_tool) {
        Ok(tool) => tool,
        Err(e) => {
            ctx.log.warn(&e.to_string());
            ctx.log
                .info("install meld or set diff_tool in the settings file");
            return Ok(DiffOutcome::ToolUnavailable);
        }
    };

    let rendered = match entry.kind {
        EntryKind::Plain => None,
        EntryKind::Generated => Some(render_to_temp(
            &ctx.action(&entry, manifest),
            &paths.source,
        )?),
    };
    let left = rendered
        .as_ref()
        .map_or(paths.source.as_path(), tempfile::NamedTempFile::path);

    let left = left.to_string_lossy();
    let right = paths.destination.to_string_lossy();
    let mut args: Vec<&str> = tool.args.iter().map(String::as_str).collect();
    args.push(&left);
    args.push(&right);

    ctx.log
        .debug(&format!("running {} {}", tool.program, args.join(" ")));
    let code = ctx.executor.run_interactive(&tool.program, &args)?;
    Ok(DiffOutcome::Launched {
        tool: tool.program,
        code,
    })
}
