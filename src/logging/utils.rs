//! Log file location, ANSI stripping, and timestamps.
use std::path::PathBuf;

const ESC: char = '\x1b';

/// Remove terminal escape sequences so the log file stays plain text.
///
/// A CSI sequence (`ESC [` ... final byte in `@..=~`) is dropped whole. Any
/// other escape drops the `ESC` and the character after it.
pub(super) fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != ESC {
            out.push(c);
            continue;
        }
        if chars.next() == Some('[') {
            chars.by_ref().find(|c| ('@'..='~').contains(c));
        }
    }
    out
}

/// Directory holding per-command log files, created on demand.
///
/// `$DOTSYNC_LOG_DIR` wins; otherwise `dotsync/` under `$XDG_CACHE_HOME`,
/// else under `.cache` in the home directory.
pub(super) fn log_dir() -> Option<PathBuf> {
    let var = |name: &str| std::env::var_os(name).filter(|v| !v.is_empty());
    let dir = if let Some(dir) = var("DOTSYNC_LOG_DIR") {
        PathBuf::from(dir)
    } else {
        var("XDG_CACHE_HOME")
            .map(PathBuf::from)
            .or_else(|| {
                var("HOME")
                    .or_else(|| var("USERPROFILE"))
                    .map(|home| PathBuf::from(home).join(".cache"))
            })?
            .join("dotsync")
    };
    std::fs::create_dir_all(&dir).ok()?;
    Some(dir)
}

/// `<log dir>/<command>.log`.
pub(super) fn log_file_path(command: &str) -> Option<PathBuf> {
    log_dir().map(|dir| dir.join(format!("{command}.log")))
}

/// UTC date and time for the log file header.
pub(super) fn header_timestamp() -> String {
    chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

/// UTC time of day prefixed to each log file line.
pub(super) fn line_timestamp() -> String {
    chrono::Utc::now().format("%H:%M:%S").to_string()
}
