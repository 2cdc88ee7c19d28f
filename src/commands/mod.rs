pub mod class;
pub mod diff;
pub mod install;
pub mod print;
pub mod status;
pub mod uninstall;
pub mod watch;

use anyhow::{Context as _, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::cli::GlobalOpts;
use crate::config::{self, ClassState, MANIFEST_FILE, Manifest, Settings};
use crate::exec::{Executor, SystemExecutor};
use crate::logging::Log;
use crate::paths::{Environment, SystemEnvironment};
use crate::platform::Platform;
use crate::sync::Context;

/// Class that switches application data paths to the Windows host.
pub const WSL_CLASS: &str = "wsl";

/// Shared state produced by the common command setup sequence.
///
/// Resolves the repository root, loads the manifest and the per-user
/// settings, and builds the sync [`Context`] so that each command does not
/// have to repeat the boilerplate.
#[derive(Debug)]
pub struct CommandSetup {
    pub platform: Platform,
    pub root: PathBuf,
    pub manifest_path: PathBuf,
    pub manifest: Manifest,
    pub settings_path: PathBuf,
    pub settings: Settings,
    pub classes: ClassState,
    pub ctx: Context,
}

impl CommandSetup {
    /// Detect the platform, find the repository, and load all configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the root directory cannot be determined or any
    /// configuration file fails to load.
    pub fn init(global: &GlobalOpts, log: Arc<dyn Log>) -> Result<Self> {
        let env: Arc<dyn Environment> = Arc::new(SystemEnvironment);
        let root = resolve_root(global, env.as_ref())?;
        Self::load(
            root,
            log,
            Platform::detect(),
            env,
            Arc::new(SystemExecutor),
        )
    }

    /// Load configuration from `root` against an explicit host.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings location cannot be determined, or the
    /// settings or manifest file fails to parse.
    pub fn load(
        root: PathBuf,
        log: Arc<dyn Log>,
        platform: Platform,
        env: Arc<dyn Environment>,
        executor: Arc<dyn Executor>,
    ) -> Result<Self> {
        log.debug(&format!("root: {}", root.display()));

        let settings_path = Settings::default_path(env.as_ref(), platform)?;
        log.debug(&format!("settings: {}", settings_path.display()));
        let settings = Settings::load(&settings_path)?;
        let classes = settings.class_state();

        let manifest_path = root.join(MANIFEST_FILE);
        let manifest = config::manifest::load(&manifest_path)?;

        let ctx = Context::new(
            root.clone(),
            platform,
            log,
            executor,
            env,
            classes.contains(WSL_CLASS),
        );

        let setup = Self {
            platform,
            root,
            manifest_path,
            manifest,
            settings_path,
            settings,
            classes,
            ctx,
        };
        setup.report_manifest();
        Ok(setup)
    }

    /// Re-read the manifest from disk, keeping the current one on failure.
    ///
    /// # Errors
    ///
    /// Returns an error if the manifest fails to load.
    pub fn reload_manifest(&mut self) -> Result<()> {
        self.manifest = config::manifest::load(&self.manifest_path)?;
        self.report_manifest();
        Ok(())
    }

    fn report_manifest(&self) {
        let log = &self.ctx.log;
        log.debug(&format!(
            "{} entries, {} directory trees, {} variables",
            self.manifest.entries().len(),
            self.manifest.trees().len(),
            self.manifest.variables().len()
        ));

        let warnings = self.manifest.validate(&self.ctx.resolver);
        if !warnings.is_empty() {
            log.warn(&format!(
                "found {} manifest warning(s):",
                warnings.len()
            ));
            for warning in &warnings {
                log.warn(&format!("  [{}]: {}", warning.item, warning.message));
            }
        }
    }
}

/// Resolve the repository root from CLI arguments or auto-detection.
///
/// Order: `--root`, `DOTSYNC_ROOT`, a directory near the binary holding the
/// manifest, then the current directory if it holds the manifest.
///
/// # Errors
///
/// Returns an error if no candidate qualifies.
pub fn resolve_root(global: &GlobalOpts, env: &dyn Environment) -> Result<PathBuf> {
    if let Some(ref root) = global.root {
        return Ok(root.clone());
    }

    if let Some(root) = env.var("DOTSYNC_ROOT") {
        return Ok(PathBuf::from(root));
    }

    if let Ok(exe) = std::env::current_exe()
        && let Some(parent) = exe.parent()
    {
        // target/release/ or bin/ inside the repository
        let candidates = [parent.join("../.."), parent.join("..")];
        for candidate in &candidates {
            if has_manifest(candidate) {
                return dunce::canonicalize(candidate)
                    .with_context(|| format!("canonicalizing {}", candidate.display()));
            }
        }
    }

    let cwd = std::env::current_dir()?;
    if has_manifest(&cwd) {
        return Ok(cwd);
    }

    anyhow::bail!("cannot find {MANIFEST_FILE}. Use --root or set DOTSYNC_ROOT");
}

fn has_manifest(dir: &Path) -> bool {
    dir.join(MANIFEST_FILE).is_file()
}


#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::test_helpers::Repo;
    use super::*;
    use crate::paths::MapEnvironment;

    const MANIFEST: &str = r#"
[[file]]
source = "a.txt"
home = ".a"

[[file]]
source = "b.txt"
home = ".a"
"#;

    #[test]
    fn resolve_root_uses_explicit_root() {
        let global = GlobalOpts {
            root: Some(PathBuf::from("/explicit/path")),
        };
        let env = MapEnvironment::new().with("DOTSYNC_ROOT", "/from/env");
        assert_eq!(
            resolve_root(&global, &env).unwrap(),
            PathBuf::from("/explicit/path")
        );
    }

    #[test]
    fn resolve_root_falls_back_to_env() {
        let env = MapEnvironment::new().with("DOTSYNC_ROOT", "/from/env");
        assert_eq!(
            resolve_root(&GlobalOpts::default(), &env).unwrap(),
            PathBuf::from("/from/env")
        );
    }

    #[test]
    fn load_reports_duplicate_destinations() {
        let repo = Repo::new(MANIFEST);
        let log = Arc::new(crate::logging::test_helpers::RecordingLog::new());
        let setup = repo.setup_with(Arc::clone(&log) as Arc<dyn Log>);
        assert_eq!(setup.manifest.entries().len(), 2);
        assert!(log.contains("found 1 manifest warning(s):"));
        assert!(log.lines().iter().any(|(level, m)| *level == "debug" && m.starts_with("root: ")));
    }

    #[test]
    fn load_reads_classes_from_settings() {
        let repo = Repo::new(MANIFEST);
        std::fs::write(repo.settings_path(), r#"{"classes": ["work"]}"#).unwrap();
        let (setup, _) = repo.setup();
        assert!(setup.classes.contains("work"));
        assert_eq!(setup.settings_path, repo.settings_path());
    }

    #[test]
    fn missing_manifest_is_an_error() {
        let repo = Repo::new("");
        std::fs::remove_file(repo.root.join(MANIFEST_FILE)).unwrap();
        let env = MapEnvironment::new()
            .with("HOME", &repo.home)
            .with("DOTSYNC_SETTINGS", repo.settings_path());
        let result = CommandSetup::load(
            repo.root.clone(),
            Arc::new(crate::logging::test_helpers::RecordingLog::new()),
            Platform::new(crate::platform::Os::Linux),
            Arc::new(env),
            Arc::new(crate::sync::test_helpers::MockExecutor::default()),
        );
        assert!(result.is_err());
    }

    #[test]
    fn reload_manifest_picks_up_changes() {
        let repo = Repo::new(MANIFEST);
        let (mut setup, _) = repo.setup();
        repo.write(MANIFEST_FILE, "[[file]]\nsource = \"c\"\nhome = \".c\"\n");
        setup.reload_manifest().unwrap();
        assert_eq!(setup.manifest.entries().len(), 1);
    }
}
