//! Install, capture, and uninstall.
//!
//! Every file-system mutation is gated on [`SyncOptions::dry_run`] at the
//! point where it happens, so a dry run walks the same code and logs the
//! same lines as a real run.
use anyhow::Result;
use std::path::{Path, PathBuf};

use super::{Context, Direction, Summary, SyncOptions, reload};
use crate::config::{ClassState, EntryKind, Manifest, TreeSide};
use crate::error::SyncError;
use crate::resources::{EntryAction, fs};

/// What happened to a single entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryOutcome {
    Written,
    Unchanged,
    Missing,
}

/// Move every active entry matching `search` in `direction`.
///
/// Generated entries are rendered on install and skipped on capture.
/// Directory trees are listed from the side being read.
///
/// # Errors
///
/// Returns [`SyncError::SourceMissing`] when a source is absent and
/// `ignore_errors` is off; the batch stops at that entry. Destination
/// resolution errors also stop the batch. Per-entry read, render, and
/// write failures are logged, counted in [`Summary::failed`], and skipped.
pub fn reconcile(
    ctx: &Context,
    manifest: &Manifest,
    classes: &ClassState,
    direction: Direction,
    search: &[String],
    options: &SyncOptions,
) -> Result<Summary> {
    let mut summary = Summary::default();
    let side = match direction {
        Direction::Install => TreeSide::Source,
        Direction::Capture => TreeSide::Destination,
    };
    let mut planned_dirs = Vec::new();

    for entry in &ctx.entries(manifest, classes, side)? {
        let paths = ctx.entry_paths(entry)?;
        let (from, to) = paths.oriented(direction);
        if !super::matches_search(search, from, to) {
            continue;
        }
        if direction == Direction::Capture && entry.kind == EntryKind::Generated {
            ctx.log
                .debug(&format!("not capturing generated file {}", to.display()));
            continue;
        }

        summary.total += 1;
        let action = ctx.action(entry, manifest);
        match reconcile_entry(ctx, &action, from, to, options, &mut planned_dirs) {
            Ok(EntryOutcome::Written) => summary.acted += 1,
            Ok(EntryOutcome::Unchanged) => summary.unchanged += 1,
            Ok(EntryOutcome::Missing) => summary.missing += 1,
            Err(e) if e.downcast_ref::<SyncError>().is_some_and(SyncError::is_fatal) => {
                ctx.log.info(&summary.tally());
                return Err(e);
            }
            Err(e) => {
                ctx.log.error(&format!("{e:#}"));
                summary.failed += 1;
            }
        }
    }

    ctx.log.info(&summary.tally());

    if direction == Direction::Install && !options.dry_run {
        reload::reload_terminal(ctx, manifest.reload());
    }
    Ok(summary)
}

/// `planned_dirs` holds the directories created so far in this run, so a
/// dry run reports each one once just like a real run.
fn reconcile_entry(
    ctx: &Context,
    action: &EntryAction<'_>,
    from: &Path,
    to: &Path,
    options: &SyncOptions,
    planned_dirs: &mut Vec<PathBuf>,
) -> Result<EntryOutcome> {
    if !from.is_file() {
        ctx.log.error(&format!("missing file {}", from.display()));
        if options.ignore_errors {
            return Ok(EntryOutcome::Missing);
        }
        return Err(SyncError::SourceMissing {
            path: from.to_path_buf(),
        }
        .into());
    }

    // Render before logging anything about the entry, in both modes.
    let prepared = action.prepare(from)?;

    if fs::is_present(to) {
        if options.remove {
            ctx.log.info(&format!("removing {}", to.display()));
            if !options.dry_run {
                fs::remove_existing(to)?;
            }
        } else if prepared.matches(to)? {
            ctx.log.debug(&format!(
                "files are the same {} {}",
                from.display(),
                to.display()
            ));
            if !options.force {
                ctx.log.info(&format!(
                    "file exists, skipping (use --force) {}",
                    to.display()
                ));
                return Ok(EntryOutcome::Unchanged);
            }
        } else {
            let conflict = SyncError::DestinationConflict {
                from: from.to_path_buf(),
                to: to.to_path_buf(),
            };
            ctx.log.info(&conflict.to_string());
        }
    }

    if let Some(dir) = fs::missing_parent(to)
        && !planned_dirs.iter().any(|p| p.starts_with(dir))
    {
        ctx.log
            .debug(&format!("creating directory {}", dir.display()));
        planned_dirs.push(dir.to_path_buf());
        if !options.dry_run {
            fs::ensure_parent_dir(to)?;
        }
    }

    ctx.log.info(&format!(
        "{} {} to {}",
        action.verb(),
        from.display(),
        to.display()
    ));
    if !options.dry_run {
        prepared.write(to)?;
    }
    Ok(EntryOutcome::Written)
}

/// Remove the destination of every active entry.
///
/// # Errors
///
/// Returns an error if a destination cannot be resolved. Removal failures
/// are logged and counted.
pub fn uninstall(
    ctx: &Context,
    manifest: &Manifest,
    classes: &ClassState,
    options: &SyncOptions,
) -> Result<Summary> {
    let mut summary = Summary::default();

    for entry in &ctx.entries(manifest, classes, TreeSide::Source)? {
        let paths = ctx.entry_paths(entry)?;
        let to = paths.destination.as_path();
        summary.total += 1;

        if !fs::is_present(to) {
            ctx.log.debug(&format!("not installed {}", to.display()));
            summary.unchanged += 1;
            continue;
        }

        ctx.log.info(&format!("removing {}", to.display()));
        if options.dry_run {
            summary.acted += 1;
            continue;
        }
        match fs::remove_existing(to) {
            Ok(()) => summary.acted += 1,
            Err(e) => {
                ctx.log.error(&format!("{e:#}"));
                summary.failed += 1;
            }
        }
    }

    ctx.log.info(&summary.tally());
    Ok(summary)
}
