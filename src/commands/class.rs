//! Class command: show, enable, or disable classes.
use anyhow::Result;
use std::sync::Arc;

use super::CommandSetup;
use crate::cli::{ClassOpts, GlobalOpts};
use crate::config::{ClassReport, class_report};
use crate::logging::Log;

/// Run the class command.
///
/// # Errors
///
/// Returns an error if configuration loading fails or the settings file
/// cannot be written.
pub fn run(global: &GlobalOpts, opts: &ClassOpts, log: Arc<dyn Log>) -> Result<()> {
    let mut setup = CommandSetup::init(global, log)?;
    execute(&mut setup, opts)
}

/// With no value, log the class report. Otherwise enable (or with
/// `--remove` disable) the class and persist the settings when that changed
/// anything.
///
/// # Errors
///
/// Returns an error if the settings file cannot be written.
pub fn execute(setup: &mut CommandSetup, opts: &ClassOpts) -> Result<()> {
    let Some(ref class) = opts.value else {
        report(setup.ctx.log.as_ref(), &class_report(&setup.manifest, &setup.classes));
        return Ok(());
    };

    let changed = if opts.remove {
        setup.classes.disable(class)
    } else {
        setup.classes.enable(class)
    };
    let log = &setup.ctx.log;
    if !changed {
        let state = if opts.remove { "not enabled" } else { "already enabled" };
        log.info(&format!("class {class} is {state}"));
        return Ok(());
    }

    setup.settings.set_class_state(&setup.classes);
    setup.settings.save(&setup.settings_path)?;
    log.info(&format!(
        "{} class {class}",
        if opts.remove { "disabled" } else { "enabled" }
    ));
    log.debug(&format!("saved {}", setup.settings_path.display()));
    Ok(())
}

fn report(log: &dyn Log, report: &ClassReport) {
    log.info(&format!("enabled: {}", list(&report.enabled)));
    log.info(&format!("available: {}", list(&report.available)));
}

fn list(classes: &[String]) -> String {
    if classes.is_empty() {
        "(none)".to_string()
    } else {
        classes.join(", ")
    }
}
