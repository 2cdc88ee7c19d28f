//! Dotfile synchronization engine.
//!
//! Keeps a source repository of dotfiles and the user's home directory in
//! step: plain files are copied, templated files are generated from a
//! variable table, and directory trees expand into one entry per file. All of
//! it is declared in `dotsync.toml` at the repository root and filtered by
//! the classes enabled in the per-user settings file.
//!
//! The public API is organised into four layers:
//!
//! - **[`config`]**: parse the manifest, variables, classes and settings
//! - **[`resources`]**: file primitives (compare, copy, render, remove)
//! - **[`sync`]**: install, capture, uninstall, status, diff and watch
//! - **[`commands`]**: top-level subcommand orchestration
#![deny(clippy::or_fun_call)]
#![deny(clippy::bool_to_int_with_if)]

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod exec;
pub mod logging;
pub mod paths;
pub mod platform;
pub mod resources;
pub mod sync;
