//! Polling file watcher.
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant, SystemTime};

/// Default poll interval.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(1);

/// Longest uninterrupted sleep, so a stop request is noticed quickly.
const SLEEP_SLICE: Duration = Duration::from_millis(100);

/// Watches a set of files by modification time.
///
/// A file that disappears keeps its last observation, so deleting a file is
/// not a change. A file seen for the first time is.
#[derive(Debug)]
pub struct Watcher {
    paths: Vec<PathBuf>,
    interval: Duration,
    observed: HashMap<PathBuf, SystemTime>,
}

impl Watcher {
    /// Start watching `paths`, recording their current state.
    #[must_use]
    pub fn new(paths: Vec<PathBuf>, interval: Duration) -> Self {
        let mut watcher = Self {
            paths: Vec::new(),
            interval,
            observed: HashMap::new(),
        };
        watcher.set_paths(paths);
        watcher
    }

    /// Replace the watched set. New paths are observed immediately.
    pub fn set_paths(&mut self, paths: Vec<PathBuf>) {
        self.observed.retain(|p, _| paths.contains(p));
        for path in &paths {
            if let Some(mtime) = modified(path) {
                self.observed.insert(path.clone(), mtime);
            }
        }
        self.paths = paths;
    }

    #[must_use]
    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    /// Check every path once. Returns `true` if any of them changed.
    pub fn poll(&mut self) -> bool {
        let mut changed = false;
        for path in &self.paths {
            let Some(mtime) = modified(path) else {
                continue;
            };
            if self.observed.get(path) != Some(&mtime) {
                tracing::debug!("changed: {}", path.display());
                self.observed.insert(path.clone(), mtime);
                changed = true;
            }
        }
        changed
    }

    /// Poll until `stop` is set, calling `on_change` once per poll that saw
    /// a change. The callback may replace the watched set.
    pub fn run<F>(&mut self, stop: &AtomicBool, mut on_change: F)
    where
        F: FnMut(&mut Self),
    {
        while !stop.load(Ordering::SeqCst) {
            let deadline = Instant::now() + self.interval;
            while !stop.load(Ordering::SeqCst) {
                let now = Instant::now();
                if now >= deadline {
                    break;
                }
                std::thread::sleep(SLEEP_SLICE.min(deadline - now));
            }
            if stop.load(Ordering::SeqCst) {
                break;
            }
            if self.poll() {
                on_change(self);
            }
        }
    }
}

fn modified(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}
