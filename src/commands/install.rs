use anyhow::Result;
use std::sync::Arc;

use super::CommandSetup;
use crate::cli::{GlobalOpts, SyncArgs};
use crate::logging::Log;
use crate::sync::{Direction, Summary, SyncOptions, reconcile};

/// Run `install` (`Direction::Install`) or `grab` (`Direction::Capture`).
///
/// # Errors
///
/// Returns an error if configuration loading fails or a source is missing
/// without `--ignore-errors`.
pub fn run(
    global: &GlobalOpts,
    opts: &SyncArgs,
    direction: Direction,
    verbose: bool,
    log: Arc<dyn Log>,
) -> Result<()> {
    let setup = CommandSetup::init(global, log)?;
    execute(&setup, opts, direction, verbose)?;
    Ok(())
}

/// Reconcile every active entry matching the search terms.
///
/// # Errors
///
/// See [`reconcile`].
pub fn execute(
    setup: &CommandSetup,
    opts: &SyncArgs,
    direction: Direction,
    verbose: bool,
) -> Result<Summary> {
    let log = &setup.ctx.log;
    if opts.dry_run {
        log.dry_run("no changes will be made");
    }
    log.stage(match direction {
        Direction::Install => "Installing files",
        Direction::Capture => "Grabbing files",
    });
    reconcile(
        &setup.ctx,
        &setup.manifest,
        &setup.classes,
        direction,
        &opts.search,
        &options(opts, verbose),
    )
}

/// Map CLI flags onto [`SyncOptions`].
#[must_use]
pub const fn options(opts: &SyncArgs, verbose: bool) -> SyncOptions {
    SyncOptions {
        remove: opts.remove,
        force: opts.force,
        verbose,
        dry_run: opts.dry_run,
        ignore_errors: opts.ignore_errors,
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::commands::test_helpers::Repo;
    use crate::error::SyncError;

    const MANIFEST: &str = r#"
[[file]]
source = "a.txt"
home = ".a"

[[file]]
source = "work.txt"
home = ".work"
classes = ["work"]
"#;

    #[test]
    fn install_copies_active_entries_only() {
        let repo = Repo::new(MANIFEST);
        repo.write("a.txt", "hello");
        repo.write("work.txt", "w");
        let (setup, log) = repo.setup();

        let summary = execute(&setup, &SyncArgs::default(), Direction::Install, false).unwrap();

        assert_eq!((summary.acted, summary.total), (1, 1));
        assert_eq!(std::fs::read_to_string(repo.home_file(".a")).unwrap(), "hello");
        assert!(!repo.home_file(".work").exists());
        assert_eq!(log.lines()[0], ("stage", "Installing files".to_string()));
    }

    #[test]
    fn dry_run_announces_itself_and_writes_nothing() {
        let repo = Repo::new(MANIFEST);
        repo.write("a.txt", "hello");
        let (setup, log) = repo.setup();
        let opts = SyncArgs {
            dry_run: true,
            ..SyncArgs::default()
        };

        let summary = execute(&setup, &opts, Direction::Install, false).unwrap();

        assert_eq!(summary.acted, 1);
        assert!(!repo.home_file(".a").exists());
        assert_eq!(log.lines()[0].0, "dry_run");
    }

    #[test]
    fn grab_copies_back_into_repository() {
        let repo = Repo::new(MANIFEST);
        repo.write("a.txt", "old");
        std::fs::write(repo.home_file(".a"), "edited").unwrap();
        let (setup, log) = repo.setup();

        execute(&setup, &SyncArgs::default(), Direction::Capture, false).unwrap();

        assert_eq!(std::fs::read_to_string(repo.root.join("a.txt")).unwrap(), "edited");
        assert!(log.contains("Grabbing files"));
    }

    #[test]
    fn missing_source_is_fatal() {
        let repo = Repo::new(MANIFEST);
        let (setup, _) = repo.setup();
        let err = execute(&setup, &SyncArgs::default(), Direction::Install, false).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SyncError>(),
            Some(SyncError::SourceMissing { .. })
        ));
    }

    #[test]
    fn options_follow_flags() {
        let opts = SyncArgs {
            force: true,
            ignore_errors: true,
            ..SyncArgs::default()
        };
        let o = options(&opts, true);
        assert!(o.force && o.ignore_errors && o.verbose);
        assert!(!o.remove && !o.dry_run);
    }
}
