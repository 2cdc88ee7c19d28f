use anyhow::Result;
use std::io::Write;
use std::sync::Arc;

use super::CommandSetup;
use crate::cli::{GlobalOpts, PrintOpts};
use crate::config::{EntryKind, active_entries};
use crate::logging::Log;

/// Run the print command, writing to stdout.
///
/// # Errors
///
/// Returns an error if configuration loading fails, a template does not
/// render, or stdout cannot be written.
pub fn run(global: &GlobalOpts, opts: &PrintOpts, log: Arc<dyn Log>) -> Result<()> {
    let setup = CommandSetup::init(global, log)?;
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    execute(&setup, opts, &mut out)?;
    Ok(())
}

/// Render every active generated entry matching the search terms into `out`,
/// each under a `==> destination` header. Nothing is written to disk.
///
/// Returns the number of entries rendered.
///
/// # Errors
///
/// Returns an error if a destination cannot be resolved, a template does not
/// render, or `out` fails.
pub fn execute(setup: &CommandSetup, opts: &PrintOpts, out: &mut impl Write) -> Result<usize> {
    let mut rendered = 0;
    for entry in active_entries(&setup.manifest, &setup.classes) {
        if entry.kind != EntryKind::Generated {
            continue;
        }
        let paths = setup.ctx.entry_paths(entry)?;
        if !paths.matches(&opts.search) {
            continue;
        }
        let content = setup
            .ctx
            .action(entry, &setup.manifest)
            .content(&paths.source)?;

        writeln!(out, "==> {}", paths.destination.display())?;
        out.write_all(&content)?;
        if !content.ends_with(b"\n") {
            writeln!(out)?;
        }
        rendered += 1;
    }
    setup.ctx.log.debug(&format!("rendered {rendered} generated file(s)"));
    Ok(rendered)
}
