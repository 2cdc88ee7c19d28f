//! Uninstall command implementation.
use anyhow::Result;
use std::sync::Arc;

use super::CommandSetup;
use crate::cli::{GlobalOpts, UninstallOpts};
use crate::logging::Log;
use crate::sync::{Summary, SyncOptions, uninstall};

/// Run the uninstall command.
///
/// # Errors
///
/// Returns an error if configuration loading fails or a destination cannot
/// be resolved.
pub fn run(global: &GlobalOpts, opts: &UninstallOpts, log: Arc<dyn Log>) -> Result<()> {
    let setup = CommandSetup::init(global, log)?;
    execute(&setup, opts)?;
    Ok(())
}

/// Remove the destination of every active entry.
///
/// # Errors
///
/// See [`uninstall`].
pub fn execute(setup: &CommandSetup, opts: &UninstallOpts) -> Result<Summary> {
    if opts.dry_run {
        setup.ctx.log.dry_run("no changes will be made");
    }
    setup.ctx.log.stage("Removing files");
    let options = SyncOptions {
        dry_run: opts.dry_run,
        ..SyncOptions::default()
    };
    uninstall(&setup.ctx, &setup.manifest, &setup.classes, &options)
}
