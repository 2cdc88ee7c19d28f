//! Moving files between the source tree and their destinations.
//!
//! - [`reconcile`](reconcile::reconcile) installs or captures entries.
//! - [`uninstall`](reconcile::uninstall) removes installed destinations.
//! - [`status`](status::status) and [`diff`](diff::diff) compare the two sides.
//! - [`Watcher`](watch::Watcher) re-triggers installs when templates change.
pub mod diff;
pub mod reconcile;
pub mod reload;
pub mod status;
pub mod watch;

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::{ClassState, EntryKind, Manifest, ManifestEntry, TreeSide, active_entries};
use crate::error::ConfigError;
use crate::exec::Executor;
use crate::logging::Log;
use crate::paths::{Environment, PathResolver};
use crate::platform::Platform;
use crate::resources::{BraceRenderer, EntryAction, TemplateRenderer};

pub use diff::{DiffOutcome, diff};
pub use reconcile::{reconcile, uninstall};
pub use status::{Classification, StatusLine, status};
pub use watch::Watcher;

/// Which way content flows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Source tree → destinations.
    Install,
    /// Destinations → source tree.
    Capture,
}

/// Flags shared by install and capture.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncOptions {
    /// Delete the existing destination before writing.
    pub remove: bool,
    /// Write even when the content is already identical.
    pub force: bool,
    pub verbose: bool,
    /// Log every action without touching the file system.
    pub dry_run: bool,
    /// Keep going after a missing source instead of halting.
    pub ignore_errors: bool,
}

/// Per-run counters.
///
/// `total` counts entries that survived class and search filtering. `acted`
/// counts entries written (or that would be written in a dry run).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub total: usize,
    pub acted: usize,
    pub unchanged: usize,
    pub missing: usize,
    pub failed: usize,
}

impl Summary {
    /// The closing `"N of M processed"` line.
    #[must_use]
    pub fn tally(&self) -> String {
        format!("{} of {} processed", self.acted, self.total)
    }
}

/// Absolute paths of both sides of an entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryPaths {
    pub source: PathBuf,
    pub destination: PathBuf,
}

impl EntryPaths {
    /// `(from, to)` for `direction`.
    #[must_use]
    pub fn oriented(&self, direction: Direction) -> (&Path, &Path) {
        match direction {
            Direction::Install => (&self.source, &self.destination),
            Direction::Capture => (&self.destination, &self.source),
        }
    }

    /// Whether every term appears in the source or the destination path.
    #[must_use]
    pub fn matches(&self, terms: &[String]) -> bool {
        matches_search(terms, &self.source, &self.destination)
    }
}

/// AND across `terms`, OR across the two paths. No terms matches everything.
#[must_use]
pub fn matches_search(terms: &[String], from: &Path, to: &Path) -> bool {
    let from = from.to_string_lossy();
    let to = to.to_string_lossy();
    terms
        .iter()
        .all(|t| from.contains(t.as_str()) || to.contains(t.as_str()))
}

/// Everything a sync operation needs besides the manifest and classes.
pub struct Context {
    /// Repository root that entry sources are relative to.
    pub source_root: PathBuf,
    pub platform: Platform,
    pub log: Arc<dyn Log>,
    pub executor: Arc<dyn Executor>,
    pub resolver: PathResolver,
    pub renderer: Arc<dyn TemplateRenderer>,
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("source_root", &self.source_root)
            .field("platform", &self.platform)
            .field("log", &"<dyn Log>")
            .field("executor", &self.executor)
            .field("resolver", &self.resolver)
            .field("renderer", &self.renderer)
            .finish()
    }
}

impl Context {
    /// Build a context using the [`BraceRenderer`].
    ///
    /// `wsl` enables Windows host path translation in the resolver.
    #[must_use]
    pub fn new(
        source_root: PathBuf,
        platform: Platform,
        log: Arc<dyn Log>,
        executor: Arc<dyn Executor>,
        env: Arc<dyn Environment>,
        wsl: bool,
    ) -> Self {
        let resolver = PathResolver::new(platform, env, Arc::clone(&executor)).with_wsl(wsl);
        Self {
            source_root,
            platform,
            log,
            executor,
            resolver,
            renderer: Arc::new(BraceRenderer),
        }
    }

    /// Swap in a different template engine.
    #[must_use]
    pub fn with_renderer(mut self, renderer: Arc<dyn TemplateRenderer>) -> Self {
        self.renderer = renderer;
        self
    }

    /// Resolve both sides of `entry`.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the destination cannot be resolved.
    pub fn entry_paths(&self, entry: &ManifestEntry) -> Result<EntryPaths, ConfigError> {
        Ok(EntryPaths {
            source: entry.source_path(&self.source_root),
            destination: self.resolver.resolve(&entry.destination, &entry.overrides)?,
        })
    }

    /// Active entries followed by the files of every active directory tree
    /// listed from `side`.
    ///
    /// A tree file already named by a plain entry is not repeated.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if a tree destination cannot be resolved or
    /// an existing tree cannot be walked.
    pub fn entries(
        &self,
        manifest: &Manifest,
        classes: &ClassState,
        side: TreeSide,
    ) -> Result<Vec<ManifestEntry>, ConfigError> {
        let mut entries: Vec<ManifestEntry> = active_entries(manifest, classes)
            .into_iter()
            .cloned()
            .collect();
        for tree in manifest.trees().iter().filter(|t| classes.allows(&t.classes)) {
            let destination = self.resolver.resolve(&tree.destination, &tree.overrides)?;
            let expanded = tree.expand(&tree.source_path(&self.source_root), &destination, side)?;
            for entry in expanded {
                let named = entries
                    .iter()
                    .any(|e| e.kind == EntryKind::Plain && e.source == entry.source);
                if !named {
                    entries.push(entry);
                }
            }
        }
        Ok(entries)
    }

    /// How `entry`'s destination is produced.
    #[must_use]
    pub fn action<'a>(&'a self, entry: &ManifestEntry, manifest: &'a Manifest) -> EntryAction<'a> {
        match entry.kind {
            EntryKind::Plain => EntryAction::Copy,
            EntryKind::Generated => EntryAction::Generate {
                renderer: self.renderer.as_ref(),
                variables: manifest.variables(),
            },
        }
    }
}


#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::test_helpers::Fixture;
    use super::*;
    use crate::paths::LogicalPath;

    #[test]
    fn search_is_and_across_terms_or_across_paths() {
        let from = Path::new("/repo/kitty/kitty.conf");
        let to = Path::new("/home/u/.config/kitty/kitty.conf");
        assert!(matches_search(&[], from, to));
        assert!(matches_search(&["repo".into(), ".config".into()], from, to));
        assert!(!matches_search(&["repo".into(), "vim".into()], from, to));
    }

    #[test]
    fn oriented_swaps_for_capture() {
        let p = EntryPaths {
            source: PathBuf::from("/repo/a"),
            destination: PathBuf::from("/home/.a"),
        };
        assert_eq!(
            p.oriented(Direction::Install),
            (Path::new("/repo/a"), Path::new("/home/.a"))
        );
        assert_eq!(
            p.oriented(Direction::Capture),
            (Path::new("/home/.a"), Path::new("/repo/a"))
        );
    }

    #[test]
    fn tally_line() {
        let s = Summary {
            total: 5,
            acted: 2,
            ..Summary::default()
        };
        assert_eq!(s.tally(), "2 of 5 processed");
    }

    #[test]
    fn entry_paths_are_absolute() {
        let fx = Fixture::new();
        let (ctx, _) = fx.context();
        let entry = ManifestEntry::plain("dir/a.txt", LogicalPath::home(".a"));
        let paths = ctx.entry_paths(&entry).unwrap();
        assert_eq!(paths.source, fx.source.join("dir").join("a.txt"));
        assert_eq!(paths.destination, fx.home.join(".a"));
    }

    fn nvim_manifest() -> Manifest {
        crate::config::manifest::parse(
            "[[file]]\nsource = \"nvim/init.lua\"\nhome = \".config/nvim/init.lua\"\n\n\
             [[dir]]\nsource = \"nvim\"\nhome = \".config/nvim\"\n",
            "dotsync.toml",
        )
        .unwrap()
    }

    fn sources(entries: &[ManifestEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.source.as_str()).collect()
    }

    #[test]
    fn entries_expand_trees_from_requested_side() {
        let fx = Fixture::new();
        fx.write_source("nvim/init.lua", "x");
        fx.write_source("nvim/lua/plugins.lua", "x");
        fx.write_home(".config/nvim/lua/local.lua", "x");
        let (ctx, _) = fx.context();
        let m = nvim_manifest();
        let classes = ClassState::new();

        let install = ctx.entries(&m, &classes, TreeSide::Source).unwrap();
        assert_eq!(sources(&install), vec!["nvim/init.lua", "nvim/lua/plugins.lua"]);

        let capture = ctx.entries(&m, &classes, TreeSide::Destination).unwrap();
        assert_eq!(sources(&capture), vec!["nvim/init.lua", "nvim/lua/local.lua"]);
        assert_eq!(
            ctx.entry_paths(&capture[1]).unwrap().destination,
            fx.home.join(".config/nvim/lua/local.lua")
        );

        let both = ctx.entries(&m, &classes, TreeSide::Both).unwrap();
        assert_eq!(
            sources(&both),
            vec!["nvim/init.lua", "nvim/lua/local.lua", "nvim/lua/plugins.lua"]
        );
    }

    #[test]
    fn entries_with_tree_missing_everywhere() {
        let fx = Fixture::new();
        let (ctx, _) = fx.context();
        let entries = ctx
            .entries(&nvim_manifest(), &ClassState::new(), TreeSide::Both)
            .unwrap();
        assert_eq!(sources(&entries), vec!["nvim/init.lua"]);
    }

    #[test]
    fn entries_skip_inactive_trees() {
        let fx = Fixture::new();
        fx.write_source("vim/vimrc", "x");
        let (ctx, _) = fx.context();
        let m = crate::config::manifest::parse(
            "[[dir]]\nsource = \"vim\"\nhome = \".vim\"\nclasses = [\"vim\"]\n",
            "dotsync.toml",
        )
        .unwrap();
        assert!(ctx.entries(&m, &ClassState::new(), TreeSide::Both).unwrap().is_empty());
        let vim: ClassState = ["vim"].into_iter().collect();
        assert_eq!(ctx.entries(&m, &vim, TreeSide::Both).unwrap().len(), 1);
    }

    #[test]
    fn action_follows_entry_kind() {
        let fx = Fixture::new();
        let (ctx, _) = fx.context();
        let manifest = Manifest::default();
        let plain = ManifestEntry::plain("a", LogicalPath::home(".a"));
        let generated = ManifestEntry::generated("t", LogicalPath::home(".t"));
        assert!(matches!(ctx.action(&plain, &manifest), EntryAction::Copy));
        assert!(matches!(
            ctx.action(&generated, &manifest),
            EntryAction::Generate { .. }
        ));
    }
}
