use anyhow::Result;
use std::sync::Arc;

use super::CommandSetup;
use crate::cli::{DiffOpts, GlobalOpts};
use crate::logging::Log;
use crate::sync::{DiffOutcome, diff};

/// Run the diff command.
///
/// # Errors
///
/// Returns an error if configuration loading fails, a template does not
/// render, or the diff tool cannot be spawned.
pub fn run(global: &GlobalOpts, opts: &DiffOpts, log: Arc<dyn Log>) -> Result<()> {
    let setup = CommandSetup::init(global, log)?;
    execute(&setup, opts)?;
    Ok(())
}

/// Open the single matching entry using the tool from the settings file, if
/// any.
///
/// # Errors
///
/// See [`diff`].
pub fn execute(setup: &CommandSetup, opts: &DiffOpts) -> Result<DiffOutcome> {
    diff(
        &setup.ctx,
        &setup.manifest,
        &setup.classes,
        &opts.patterns,
        opts.print,
        setup.settings.diff_tool.as_deref(),
    )
}
