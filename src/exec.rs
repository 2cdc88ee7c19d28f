//! Subprocess execution behind an injectable [`Executor`] seam.
//!
//! The engine shells out for three things only: querying the Windows user
//! from WSL, checking/signalling the terminal process after an install, and
//! launching the external diff tool.
use anyhow::{Context as _, Result, bail};
use std::path::PathBuf;
use std::process::{Command, Output};

/// Result of a command execution.
#[derive(Debug, Clone)]
pub struct ExecResult {
    pub stdout: String,
    pub stderr: String,
    pub success: bool,
    pub code: Option<i32>,
}

impl From<Output> for ExecResult {
    fn from(output: Output) -> Self {
        Self {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            success: output.status.success(),
            code: output.status.code(),
        }
    }
}

/// Abstraction over subprocess execution.
pub trait Executor: Send + Sync + std::fmt::Debug {
    /// Run a command and capture its output. Fails if the command exits non-zero.
    ///
    /// # Errors
    ///
    /// Returns an error if the command cannot be spawned or exits non-zero.
    fn run(&self, program: &str, args: &[&str]) -> Result<ExecResult>;

    /// Run a command and capture its output, allowing a non-zero exit.
    ///
    /// # Errors
    ///
    /// Returns an error only if the command cannot be spawned.
    fn run_unchecked(&self, program: &str, args: &[&str]) -> Result<ExecResult>;

    /// Run a command attached to the current terminal and wait for it.
    ///
    /// Returns the exit code, if any.
    ///
    /// # Errors
    ///
    /// Returns an error only if the command cannot be spawned.
    fn run_interactive(&self, program: &str, args: &[&str]) -> Result<Option<i32>>;

    /// Locate a program on `PATH`.
    fn which(&self, program: &str) -> Option<PathBuf>;
}

/// Production [`Executor`] backed by [`std::process::Command`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemExecutor;

impl Executor for SystemExecutor {
    fn run(&self, program: &str, args: &[&str]) -> Result<ExecResult> {
        let result = self.run_unchecked(program, args)?;
        if !result.success {
            bail!(
                "{program} failed (exit {}): {}",
                result.code.unwrap_or(-1),
                result.stderr.trim()
            );
        }
        Ok(result)
    }

    fn run_unchecked(&self, program: &str, args: &[&str]) -> Result<ExecResult> {
        let output = Command::new(program)
            .args(args)
            .output()
            .with_context(|| format!("failed to execute: {program}"))?;
        Ok(ExecResult::from(output))
    }

    fn run_interactive(&self, program: &str, args: &[&str]) -> Result<Option<i32>> {
        let status = Command::new(program)
            .args(args)
            .status()
            .with_context(|| format!("failed to execute: {program}"))?;
        Ok(status.code())
    }

    fn which(&self, program: &str) -> Option<PathBuf> {
        which::which(program).ok()
    }
}
