// Shared helpers for integration tests.
//
// Provides a temporary source repository and home directory, an in-memory
// log recorder, and an executor that records calls instead of spawning
// anything, so each integration test runs in isolation.
//
// Used by all integration test binaries that declare `mod common;`.
#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use dotsync::commands::CommandSetup;
use dotsync::config::MANIFEST_FILE;
use dotsync::exec::{ExecResult, Executor};
use dotsync::logging::Log;
use dotsync::paths::MapEnvironment;
use dotsync::platform::{Os, Platform};

/// Log recorder keeping `(level, message)` pairs in order.
#[derive(Debug, Default)]
pub struct RecordingLog {
    lines: Mutex<Vec<(&'static str, String)>>,
}

impl RecordingLog {
    fn push(&self, level: &'static str, msg: &str) {
        self.lines
            .lock()
            .expect("log mutex")
            .push((level, msg.to_string()));
    }

    pub fn lines(&self) -> Vec<(&'static str, String)> {
        self.lines.lock().expect("log mutex").clone()
    }

    pub fn messages(&self) -> Vec<String> {
        self.lines().into_iter().map(|(_, m)| m).collect()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.messages().iter().any(|m| m.contains(needle))
    }

    pub fn clear(&self) {
        self.lines.lock().expect("log mutex").clear();
    }
}

impl Log for RecordingLog {
    fn stage(&self, msg: &str) {
        self.push("stage", msg);
    }
    fn info(&self, msg: &str) {
        self.push("info", msg);
    }
    fn debug(&self, msg: &str) {
        self.push("debug", msg);
    }
    fn warn(&self, msg: &str) {
        self.push("warn", msg);
    }
    fn error(&self, msg: &str) {
        self.push("error", msg);
    }
    fn dry_run(&self, msg: &str) {
        self.push("dry_run", msg);
    }
}

/// Executor that records every call and reports failure, so no terminal is
/// signalled and no diff tool is found unless listed in `available`.
#[derive(Debug, Default)]
pub struct RecordingExecutor {
    calls: Mutex<Vec<String>>,
    available: Vec<String>,
}

impl RecordingExecutor {
    pub fn with_available(programs: &[&str]) -> Self {
        Self {
            available: programs.iter().map(|p| (*p).to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("calls mutex").clone()
    }

    fn record(&self, program: &str, args: &[&str]) {
        let mut line = program.to_string();
        for arg in args {
            line.push(' ');
            line.push_str(arg);
        }
        self.calls.lock().expect("calls mutex").push(line);
    }
}

impl Executor for RecordingExecutor {
    fn run(&self, program: &str, args: &[&str]) -> anyhow::Result<ExecResult> {
        self.record(program, args);
        anyhow::bail!("{program} is not available in tests")
    }

    fn run_unchecked(&self, program: &str, args: &[&str]) -> anyhow::Result<ExecResult> {
        self.record(program, args);
        Ok(ExecResult {
            stdout: String::new(),
            stderr: String::new(),
            success: false,
            code: Some(1),
        })
    }

    fn run_interactive(&self, program: &str, args: &[&str]) -> anyhow::Result<Option<i32>> {
        self.record(program, args);
        Ok(Some(0))
    }

    fn which(&self, program: &str) -> Option<PathBuf> {
        self.available
            .iter()
            .any(|p| p == program)
            .then(|| PathBuf::from("/usr/bin").join(program))
    }
}

/// An isolated repository, home directory, and settings file backed by a
/// [`tempfile::TempDir`].
pub struct TestRepo {
    _tmp: tempfile::TempDir,
    pub root: PathBuf,
    pub home: PathBuf,
    pub settings: PathBuf,
}

impl TestRepo {
    /// Create a repository whose `dotsync.toml` holds `manifest`.
    pub fn new(manifest: &str) -> Self {
        let tmp = tempfile::tempdir().expect("create temp dir");
        let root = tmp.path().join("repo");
        let home = tmp.path().join("home");
        std::fs::create_dir_all(&root).expect("create repo dir");
        std::fs::create_dir_all(&home).expect("create home dir");
        std::fs::write(root.join(MANIFEST_FILE), manifest).expect("write manifest");
        let settings = tmp.path().join("config").join("settings.json");
        Self {
            _tmp: tmp,
            root,
            home,
            settings,
        }
    }

    fn write(path: &Path, content: &str) {
        std::fs::create_dir_all(path.parent().expect("parent")).expect("create parent");
        std::fs::write(path, content).expect("write file");
    }

    pub fn write_source(&self, rel: &str, content: &str) {
        Self::write(&self.root.join(rel), content);
    }

    pub fn write_home(&self, rel: &str, content: &str) {
        Self::write(&self.home.join(rel), content);
    }

    pub fn read_source(&self, rel: &str) -> Option<String> {
        std::fs::read_to_string(self.root.join(rel)).ok()
    }

    pub fn read_home(&self, rel: &str) -> Option<String> {
        std::fs::read_to_string(self.home.join(rel)).ok()
    }

    pub fn write_settings(&self, json: &str) {
        Self::write(&self.settings, json);
    }

    /// Load the repository on Linux with a fresh recorder and executor. The
    /// recorder is emptied once loading is done.
    pub fn setup(&self) -> (CommandSetup, Arc<RecordingLog>) {
        let (setup, log, _) = self.setup_with(RecordingExecutor::default());
        (setup, log)
    }

    pub fn setup_with(
        &self,
        executor: RecordingExecutor,
    ) -> (CommandSetup, Arc<RecordingLog>, Arc<RecordingExecutor>) {
        let log = Arc::new(RecordingLog::default());
        let executor = Arc::new(executor);
        let env = MapEnvironment::new()
            .with("HOME", &self.home)
            .with("DOTSYNC_SETTINGS", &self.settings);
        let setup = CommandSetup::load(
            self.root.clone(),
            Arc::clone(&log) as Arc<dyn Log>,
            Platform::new(Os::Linux),
            Arc::new(env),
            Arc::clone(&executor) as Arc<dyn Executor>,
        )
        .expect("load repository");
        log.clear();
        (setup, log, executor)
    }
}
