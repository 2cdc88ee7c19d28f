use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Top-level CLI entry point for the dotfile synchronizer.
#[derive(Parser, Debug)]
#[command(
    name = "dotsync",
    about = "Synchronize dotfiles between a source repository and the home directory",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(flatten)]
    pub global: GlobalOpts,
}

/// Options shared across all subcommands.
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalOpts {
    /// Override the source repository root
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Copy files from the repository to their destinations
    #[command(visible_aliases = ["copy", "in"])]
    Install(SyncArgs),
    /// Remove installed files from their destinations
    #[command(visible_alias = "remove")]
    Uninstall(UninstallOpts),
    /// Copy files from their destinations back into the repository
    #[command(visible_alias = "get")]
    Grab(SyncArgs),
    /// Install, then re-install whenever a template or the manifest changes
    Watch(SyncArgs),
    /// Compare installed files with the repository
    Status,
    /// Open one entry in a diff tool
    Diff(DiffOpts),
    /// Show, enable, or disable classes
    Class(ClassOpts),
    /// Render generated files to stdout
    #[command(visible_alias = "debug")]
    Print(PrintOpts),
    /// Print version information
    Version,
}

impl Command {
    /// Name used for the log file.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Install(_) => "install",
            Self::Uninstall(_) => "uninstall",
            Self::Grab(_) => "grab",
            Self::Watch(_) => "watch",
            Self::Status => "status",
            Self::Diff(_) => "diff",
            Self::Class(_) => "class",
            Self::Print(_) => "print",
            Self::Version => "version",
        }
    }
}

/// Options for `install`, `grab`, and `watch`.
#[derive(Args, Debug, Clone, Default)]
pub struct SyncArgs {
    /// Only entries whose paths contain every term
    pub search: Vec<String>,

    /// Remove the destination before copying
    #[arg(short, long)]
    pub remove: bool,

    /// Copy even when the files are identical
    #[arg(short, long)]
    pub force: bool,

    /// Preview changes without applying
    #[arg(short = '0', long, visible_alias = "dry")]
    pub dry_run: bool,

    /// Keep going when a source file is missing
    #[arg(long, visible_alias = "continue-on-error")]
    pub ignore_errors: bool,
}

/// Options for the `uninstall` subcommand.
#[derive(Args, Debug, Clone, Default)]
pub struct UninstallOpts {
    /// Preview changes without applying
    #[arg(short = '0', long, visible_alias = "dry")]
    pub dry_run: bool,
}

/// Options for the `diff` subcommand.
#[derive(Args, Debug, Clone, Default)]
pub struct DiffOpts {
    /// Terms that must all appear in the source or destination path
    #[arg(required = true)]
    pub patterns: Vec<String>,

    /// Print the matching paths instead of opening a tool
    #[arg(long)]
    pub print: bool,
}

/// Options for the `class` subcommand.
#[derive(Args, Debug, Clone, Default)]
pub struct ClassOpts {
    /// Class to enable (or disable with --remove)
    pub value: Option<String>,

    /// Disable the class instead
    #[arg(long, requires = "value")]
    pub remove: bool,
}

/// Options for the `print` subcommand.
#[derive(Args, Debug, Clone, Default)]
pub struct PrintOpts {
    /// Only entries whose paths contain every term
    pub search: Vec<String>,
}
