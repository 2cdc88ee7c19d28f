//! Logical destination paths and their resolution to absolute paths.
//!
//! Every platform branch of the engine lives here: the rest of the crate
//! only sees the absolute [`PathBuf`]s produced by [`PathResolver`].
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use serde::Deserialize;

use crate::error::ConfigError;
use crate::exec::Executor;
use crate::platform::Platform;

/// Root folder a [`LogicalPath`] is relative to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
pub enum Location {
    /// The user's home directory.
    #[default]
    #[serde(rename = "home")]
    UserHome,
    /// Per-user roaming application data.
    #[serde(rename = "roaming")]
    AppDataRoaming,
    /// Per-user machine-local application data.
    #[serde(rename = "local")]
    AppDataLocal,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UserHome => write!(f, "home"),
            Self::AppDataRoaming => write!(f, "roaming app data"),
            Self::AppDataLocal => write!(f, "local app data"),
        }
    }
}

/// A path relative to a [`Location`], resolved only when used.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LogicalPath {
    pub base: Location,
    /// `/`-separated path below `base`.
    pub relative: String,
}

impl LogicalPath {
    #[must_use]
    pub fn new(base: Location, relative: impl Into<String>) -> Self {
        Self {
            base,
            relative: relative.into(),
        }
    }

    /// Shorthand for a path under the home directory.
    #[must_use]
    pub fn home(relative: impl Into<String>) -> Self {
        Self::new(Location::UserHome, relative)
    }

    /// Append `/`-separated `child` to this path.
    #[must_use]
    pub fn join(&self, child: &str) -> Self {
        Self::new(self.base, join_relative(&self.relative, child))
    }
}

/// Join two `/`-separated relative paths.
pub(crate) fn join_relative(parent: &str, child: &str) -> String {
    let parent = parent.trim_end_matches('/');
    let child = child.trim_start_matches('/');
    if parent.is_empty() {
        child.to_string()
    } else {
        format!("{parent}/{child}")
    }
}

/// Per-entry destination replacements for specific platform families.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlatformOverrides {
    /// Destination used instead of the default on native Windows.
    pub windows: Option<LogicalPath>,
}

/// Read access to environment variables.
pub trait Environment: Send + Sync + fmt::Debug {
    /// Value of `name`, or `None` when unset or empty.
    fn var(&self, name: &str) -> Option<String>;
}

/// [`Environment`] backed by the process environment.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemEnvironment;

impl Environment for SystemEnvironment {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok().filter(|v| !v.is_empty())
    }
}

/// In-memory [`Environment`] for sandboxed runs and tests.
#[derive(Debug, Default, Clone)]
pub struct MapEnvironment {
    vars: HashMap<String, String>,
}

impl MapEnvironment {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a variable.
    #[must_use]
    pub fn with(mut self, name: &str, value: impl AsRef<Path>) -> Self {
        self.vars.insert(
            name.to_string(),
            value.as_ref().to_string_lossy().into_owned(),
        );
        self
    }
}

impl Environment for MapEnvironment {
    fn var(&self, name: &str) -> Option<String> {
        self.vars.get(name).filter(|v| !v.is_empty()).cloned()
    }
}

/// Resolves [`LogicalPath`]s to absolute paths for one platform.
///
/// The `wsl` class switches application data to the Windows host's
/// `AppData` mounted under `/mnt/c`. The Windows user name needed for that
/// is fetched once per resolver through the [`Executor`].
#[derive(Debug)]
pub struct PathResolver {
    platform: Platform,
    env: Arc<dyn Environment>,
    executor: Arc<dyn Executor>,
    wsl: bool,
    wsl_user: OnceLock<String>,
}

impl PathResolver {
    #[must_use]
    pub fn new(platform: Platform, env: Arc<dyn Environment>, executor: Arc<dyn Executor>) -> Self {
        Self {
            platform,
            env,
            executor,
            wsl: false,
            wsl_user: OnceLock::new(),
        }
    }

    /// Enable or disable WSL host path translation.
    #[must_use]
    pub fn with_wsl(mut self, wsl: bool) -> Self {
        self.wsl = wsl;
        self
    }

    #[must_use]
    pub const fn platform(&self) -> Platform {
        self.platform
    }

    /// Resolve `path` to an absolute path, applying `overrides` for the
    /// current platform family.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingEnvironment`] when a required variable is
    /// unset, or [`ConfigError::HostQuery`] when the WSL user lookup fails.
    pub fn resolve(
        &self,
        path: &LogicalPath,
        overrides: &PlatformOverrides,
    ) -> Result<PathBuf, ConfigError> {
        let effective = match &overrides.windows {
            Some(windows) if self.platform.is_windows() => windows,
            _ => path,
        };
        let base = self.location_dir(effective.base)?;
        Ok(effective
            .relative
            .split('/')
            .filter(|part| !part.is_empty())
            .fold(base, |acc, part| acc.join(part)))
    }

    /// Absolute directory of `location`.
    ///
    /// # Errors
    ///
    /// See [`resolve`](Self::resolve).
    pub fn location_dir(&self, location: Location) -> Result<PathBuf, ConfigError> {
        match location {
            Location::UserHome => self.home(),
            Location::AppDataRoaming => self.roaming(),
            Location::AppDataLocal => self.local(),
        }
    }

    fn require(&self, location: Location, variable: &str) -> Result<PathBuf, ConfigError> {
        self.env
            .var(variable)
            .map(PathBuf::from)
            .ok_or_else(|| ConfigError::MissingEnvironment {
                location: location.to_string(),
                variable: variable.to_string(),
            })
    }

    fn home(&self) -> Result<PathBuf, ConfigError> {
        if self.platform.is_windows() {
            self.require(Location::UserHome, "USERPROFILE")
        } else {
            self.require(Location::UserHome, "HOME")
        }
    }

    fn roaming(&self) -> Result<PathBuf, ConfigError> {
        if self.platform.is_windows() {
            return self.require(Location::AppDataRoaming, "APPDATA");
        }
        if self.wsl {
            let user = self.wsl_user()?;
            return Ok(PathBuf::from("/mnt/c/Users")
                .join(user)
                .join("AppData")
                .join("Roaming"));
        }
        if self.platform.is_macos() {
            return Ok(self.home()?.join("Library").join("Application Support"));
        }
        match self.env.var("XDG_CONFIG_HOME") {
            Some(dir) => Ok(PathBuf::from(dir)),
            None => Ok(self.home()?.join(".config")),
        }
    }

    fn local(&self) -> Result<PathBuf, ConfigError> {
        if self.platform.is_windows() {
            if let Some(dir) = self.env.var("LOCALAPPDATA") {
                return Ok(PathBuf::from(dir));
            }
            let roaming = self.roaming()?;
            return sibling_local(&roaming).ok_or_else(|| ConfigError::MissingEnvironment {
                location: Location::AppDataLocal.to_string(),
                variable: "LOCALAPPDATA".to_string(),
            });
        }
        if self.wsl {
            let roaming = self.roaming()?;
            return Ok(sibling_local(&roaming).unwrap_or(roaming));
        }
        if self.platform.is_macos() {
            return self.roaming();
        }
        match self.env.var("XDG_DATA_HOME") {
            Some(dir) => Ok(PathBuf::from(dir)),
            None => Ok(self.home()?.join(".local").join("share")),
        }
    }

    fn wsl_user(&self) -> Result<String, ConfigError> {
        if let Some(user) = self.wsl_user.get() {
            return Ok(user.clone());
        }
        let result = self
            .executor
            .run("cmd.exe", &["/c", "echo %USERNAME%"])
            .map_err(|e| ConfigError::HostQuery(format!("{e:#}")))?;
        let user = result.stdout.trim().to_string();
        if user.is_empty() || user.contains('%') {
            return Err(ConfigError::HostQuery(
                "cmd.exe did not report a Windows user name".to_string(),
            ));
        }
        Ok(self.wsl_user.get_or_init(|| user).clone())
    }
}

/// `…/AppData/Roaming` → `…/AppData/Local`.
fn sibling_local(roaming: &Path) -> Option<PathBuf> {
    (roaming.file_name()? == "Roaming").then(|| roaming.with_file_name("Local"))
}
