//! Watch command: install, then re-install whenever a template changes.
use anyhow::{Context as _, Result};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use super::{CommandSetup, install};
use crate::cli::{GlobalOpts, SyncArgs};
use crate::config::{EntryKind, active_entries};
use crate::logging::Log;
use crate::sync::watch::DEFAULT_INTERVAL;
use crate::sync::{Direction, Watcher};

/// Run the watch command until Ctrl-C.
///
/// # Errors
///
/// Returns an error if configuration loading fails or the Ctrl-C handler
/// cannot be installed.
pub fn run(global: &GlobalOpts, opts: &SyncArgs, verbose: bool, log: Arc<dyn Log>) -> Result<()> {
    let mut setup = CommandSetup::init(global, log)?;

    let stop = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&stop);
    ctrlc::set_handler(move || flag.store(true, Ordering::SeqCst))
        .context("failed to install Ctrl-C handler")?;

    execute(&mut setup, opts, verbose, &stop, DEFAULT_INTERVAL);
    Ok(())
}

/// Install once, then poll the template sources of active generated entries
/// and the manifest itself. Every change reloads the manifest and installs
/// again. Install failures are logged and watching continues.
pub fn execute(
    setup: &mut CommandSetup,
    opts: &SyncArgs,
    verbose: bool,
    stop: &AtomicBool,
    interval: Duration,
) {
    if let Err(e) = install::execute(setup, opts, Direction::Install, verbose) {
        setup.ctx.log.error(&format!("{e:#}"));
    }

    let mut watcher = Watcher::new(watched_paths(setup), interval);
    setup.ctx.log.info(&format!(
        "watching {} file(s), press Ctrl-C to stop",
        watcher.paths().len()
    ));

    watcher.run(stop, |watcher| {
        if let Err(e) = rerun(setup, opts, verbose) {
            setup.ctx.log.error(&format!("{e:#}"));
        }
        watcher.set_paths(watched_paths(setup));
    });
    setup.ctx.log.info("stopped watching");
}

fn rerun(setup: &mut CommandSetup, opts: &SyncArgs, verbose: bool) -> Result<()> {
    setup.reload_manifest()?;
    install::execute(setup, opts, Direction::Install, verbose)?;
    Ok(())
}

/// Template sources of active generated entries, plus the manifest.
fn watched_paths(setup: &CommandSetup) -> Vec<PathBuf> {
    let mut paths: Vec<PathBuf> = active_entries(&setup.manifest, &setup.classes)
        .into_iter()
        .filter(|e| e.kind == EntryKind::Generated)
        .map(|e| e.source_path(&setup.root))
        .collect();
    paths.push(setup.manifest_path.clone());
    paths
}
