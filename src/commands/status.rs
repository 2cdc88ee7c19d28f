use anyhow::Result;
use std::sync::Arc;

use super::CommandSetup;
use crate::cli::GlobalOpts;
use crate::logging::Log;
use crate::sync::{StatusLine, status};

/// Run the status command.
///
/// # Errors
///
/// Returns an error if configuration loading fails or a destination cannot
/// be resolved.
pub fn run(global: &GlobalOpts, verbose: bool, log: Arc<dyn Log>) -> Result<()> {
    let setup = CommandSetup::init(global, log)?;
    execute(&setup, verbose)?;
    Ok(())
}

/// Classify every active entry and log where the two sides disagree.
///
/// # Errors
///
/// See [`status`].
pub fn execute(setup: &CommandSetup, verbose: bool) -> Result<Vec<StatusLine>> {
    let log = &setup.ctx.log;
    log.info(&format!("SRC: {}", setup.root.display()));
    let home = setup.ctx.resolver.location_dir(crate::paths::Location::UserHome)?;
    log.info(&format!("HOME: {}", home.display()));
    log.stage("Comparing files");
    status(&setup.ctx, &setup.manifest, &setup.classes, verbose)
}
