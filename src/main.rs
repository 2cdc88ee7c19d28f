use clap::Parser;
use std::process::ExitCode;
use std::sync::Arc;

use dotsync::cli::{Cli, Command};
use dotsync::commands;
use dotsync::error::SyncError;
use dotsync::logging::{self, Log, Logger};
use dotsync::sync::Direction;

/// Exit status when a source file is missing and errors are not ignored.
const SOURCE_MISSING_EXIT: u8 = 214;

#[allow(clippy::print_stdout)]
fn main() -> ExitCode {
    let _ = enable_ansi_support::enable_ansi_support();
    let args = Cli::parse();

    if matches!(args.command, Command::Version) {
        let version = option_env!("DOTSYNC_VERSION").unwrap_or(env!("CARGO_PKG_VERSION"));
        println!("dotsync {version}");
        return ExitCode::SUCCESS;
    }

    logging::init_subscriber(args.verbose, args.command.name());
    let log = Arc::new(Logger::new(args.command.name()));

    match dispatch(&args, Arc::clone(&log) as Arc<dyn Log>) {
        Ok(()) => {
            println!("Done!");
            ExitCode::SUCCESS
        }
        Err(e) => {
            if let Some(path) = log.log_path() {
                log.debug(&format!("log: {}", path.display()));
            }
            match e.downcast_ref::<SyncError>() {
                // already reported by the reconciler
                Some(SyncError::SourceMissing { .. }) => ExitCode::from(SOURCE_MISSING_EXIT),
                _ => {
                    log.error(&format!("{e:#}"));
                    ExitCode::FAILURE
                }
            }
        }
    }
}

fn dispatch(args: &Cli, log: Arc<dyn Log>) -> anyhow::Result<()> {
    let global = &args.global;
    match &args.command {
        Command::Install(opts) => {
            commands::install::run(global, opts, Direction::Install, args.verbose, log)
        }
        Command::Grab(opts) => {
            commands::install::run(global, opts, Direction::Capture, args.verbose, log)
        }
        Command::Uninstall(opts) => commands::uninstall::run(global, opts, log),
        Command::Watch(opts) => commands::watch::run(global, opts, args.verbose, log),
        Command::Status => commands::status::run(global, args.verbose, log),
        Command::Diff(opts) => commands::diff::run(global, opts, log),
        Command::Class(opts) => commands::class::run(global, opts, log),
        Command::Print(opts) => commands::print::run(global, opts, log),
        Command::Version => Ok(()),
    }
}
