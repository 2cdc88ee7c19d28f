//! Domain-specific error types for the sync engine.
//!
//! Internal modules return typed errors built with [`thiserror`] while the
//! command handlers at the CLI boundary convert them to [`anyhow::Error`]
//! via the standard `?` operator.
//!
//! # Error hierarchy
//!
//! ```text
//! ConfigError      : broken configuration, always escalates
//! ├── Variable(VariableError)
//! SyncError        : per-entry problems seen by the reconciler
//! ├── Render(RenderError)
//! ```

use std::path::PathBuf;

use thiserror::Error;

/// Errors that indicate a broken configuration rather than a transient
/// per-file condition.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A platform location needs an environment variable that is not set.
    #[error("cannot resolve {location}: environment variable {variable} is not set")]
    MissingEnvironment {
        /// Logical location being resolved (e.g. `"roaming app data"`).
        location: String,
        /// Name of the missing variable.
        variable: String,
    },

    /// Querying the host operating system (e.g. the Windows user from WSL) failed.
    #[error("host query failed: {0}")]
    HostQuery(String),

    /// Two manifest entries of the same kind share a source path.
    #[error("duplicate {kind} source in manifest: {source_path}")]
    DuplicateSource {
        /// Entry kind (`"plain"` or `"generated"`).
        kind: String,
        /// The repeated source path.
        source_path: String,
    },

    /// The manifest or settings file could not be parsed.
    #[error("invalid configuration in {path}: {message}")]
    Parse {
        /// File that failed to parse.
        path: String,
        /// Parser message.
        message: String,
    },

    /// An I/O error occurred while reading or writing a configuration file.
    #[error("IO error on config file {path}: {source}")]
    Io {
        /// Path to the file.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A variable declaration is invalid.
    #[error(transparent)]
    Variable(#[from] VariableError),
}

/// Errors raised while building the variable table.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VariableError {
    /// The alias target is itself an alias; only one level is allowed.
    #[error("alias '{alias}' points at '{target}', which is itself an alias")]
    AliasChain {
        /// Alias being declared.
        alias: String,
        /// Target that is already an alias.
        target: String,
    },

    /// A name was declared as an alias of itself.
    #[error("variable '{0}' cannot alias itself")]
    SelfAlias(String),

    /// A value starting with `#` is not a `#rrggbb` color.
    #[error("variable '{name}' has malformed color value '{value}'")]
    InvalidColor {
        /// Variable name.
        name: String,
        /// Offending value.
        value: String,
    },
}

/// Template engine failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// The template references a variable that is not defined.
    #[error("undefined variable '{name}' on line {line}")]
    UndefinedVariable {
        /// Variable name.
        name: String,
        /// 1-based line number.
        line: usize,
    },

    /// A `{{` was opened without a matching `}}`.
    #[error("unterminated placeholder on line {line}")]
    Unterminated {
        /// 1-based line number.
        line: usize,
    },
}

/// Errors that arise while reconciling or inspecting manifest entries.
#[derive(Error, Debug)]
pub enum SyncError {
    /// The side being copied from does not exist. Fatal unless errors are ignored.
    #[error("missing file {}", path.display())]
    SourceMissing {
        /// Absolute path that was expected to exist.
        path: PathBuf,
    },

    /// Both sides exist with different content. Always resolved by policy.
    #[error("files are not the same {} {}", from.display(), to.display())]
    DestinationConflict {
        /// Side being copied from.
        from: PathBuf,
        /// Side being overwritten.
        to: PathBuf,
    },

    /// Rendering a generated entry failed; the destination is left untouched.
    #[error("failed to render {}", path.display())]
    Render {
        /// Template path.
        path: PathBuf,
        /// Engine error.
        source: RenderError,
    },

    /// No usable diff/merge tool was found.
    #[error("no diff tool available (tried {tried})")]
    ExternalToolUnavailable {
        /// Comma-separated list of candidates.
        tried: String,
    },
}

impl SyncError {
    /// Whether this error halts the whole batch.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::SourceMissing { .. })
    }
}
