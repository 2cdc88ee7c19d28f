//! Per-user settings document.
//!
//! Stored as JSON so other tools can edit it. Keys this crate does not know
//! about are kept across a read-modify-write.
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::classes::ClassState;
use crate::error::ConfigError;
use crate::paths::Environment;
use crate::platform::Platform;

/// Contents of `settings.json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Enabled classes.
    #[serde(default)]
    pub classes: BTreeSet<String>,
    /// Explicit diff tool, used before the built-in candidates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diff_tool: Option<PathBuf>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Settings {
    /// Read `path`; a missing file yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] for read failures other than not-found and
    /// [`ConfigError::Parse`] for invalid JSON.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.display().to_string(),
                    source,
                });
            }
        };
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_json::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// Write to `path`, creating the parent directory.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let io_err = |source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let mut json = serde_json::to_string_pretty(self).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        json.push('\n');
        std::fs::write(path, json).map_err(io_err)
    }

    /// Location of the settings file.
    ///
    /// `$DOTSYNC_SETTINGS` wins; otherwise `dotsync/settings.json` under
    /// `%APPDATA%` on Windows, `$XDG_CONFIG_HOME` or `~/.config` elsewhere.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingEnvironment`] if none of the variables
    /// needed to build the path is set.
    pub fn default_path(env: &dyn Environment, platform: Platform) -> Result<PathBuf, ConfigError> {
        if let Some(path) = env.var("DOTSYNC_SETTINGS") {
            return Ok(PathBuf::from(path));
        }
        let config_dir = if platform.is_windows() {
            env.var("APPDATA").map(PathBuf::from)
        } else {
            env.var("XDG_CONFIG_HOME")
                .map(PathBuf::from)
                .or_else(|| env.var("HOME").map(|h| PathBuf::from(h).join(".config")))
        };
        let config_dir = config_dir.ok_or_else(|| ConfigError::MissingEnvironment {
            location: "settings".to_string(),
            variable: if platform.is_windows() { "APPDATA" } else { "HOME" }.to_string(),
        })?;
        Ok(config_dir.join("dotsync").join("settings.json"))
    }

    #[must_use]
    pub fn class_state(&self) -> ClassState {
        self.classes.iter().cloned().collect()
    }

    pub fn set_class_state(&mut self, state: &ClassState) {
        self.classes = state.iter().map(str::to_string).collect();
    }
}
