//! The declarative list of managed files.
//!
//! A manifest is an ordered list of [`ManifestEntry`] values plus the
//! [`VariableTable`] used to render generated entries. It is loaded from
//! `dotsync.toml` once per invocation and only read afterwards.
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::variables::VariableTable;
use crate::error::ConfigError;
use crate::paths::{Location, LogicalPath, PathResolver, PlatformOverrides, join_relative};

/// How the destination content of an entry is produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    /// Byte-for-byte copy of the source file.
    Plain,
    /// Source is a template rendered through the manifest variables.
    Generated,
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Plain => write!(f, "plain"),
            Self::Generated => write!(f, "generated"),
        }
    }
}

/// One managed file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    /// Classes gating this entry; empty means always active.
    pub classes: BTreeSet<String>,
    /// `/`-separated path relative to the source root.
    pub source: String,
    pub destination: LogicalPath,
    pub overrides: PlatformOverrides,
    pub kind: EntryKind,
}

impl ManifestEntry {
    #[must_use]
    pub fn new(kind: EntryKind, source: impl Into<String>, destination: LogicalPath) -> Self {
        Self {
            classes: BTreeSet::new(),
            source: source.into(),
            destination,
            overrides: PlatformOverrides::default(),
            kind,
        }
    }

    /// A plain copied file.
    #[must_use]
    pub fn plain(source: impl Into<String>, destination: LogicalPath) -> Self {
        Self::new(EntryKind::Plain, source, destination)
    }

    /// A template-generated file.
    #[must_use]
    pub fn generated(source: impl Into<String>, destination: LogicalPath) -> Self {
        Self::new(EntryKind::Generated, source, destination)
    }

    #[must_use]
    pub fn with_classes<I, S>(mut self, classes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.classes = classes.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_windows(mut self, destination: LogicalPath) -> Self {
        self.overrides.windows = Some(destination);
        self
    }

    /// Absolute source path under `root`.
    #[must_use]
    pub fn source_path(&self, root: &Path) -> PathBuf {
        rooted(root, &self.source)
    }
}

fn rooted(root: &Path, relative: &str) -> PathBuf {
    relative
        .split('/')
        .filter(|part| !part.is_empty())
        .fold(root.to_path_buf(), |acc, part| acc.join(part))
}

/// Which side of a [`DirTree`] is listed when it is expanded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeSide {
    Source,
    Destination,
    Both,
}

/// A directory whose files are managed as plain entries.
///
/// The file list is taken from disk each time the tree is expanded, so files
/// added on either side after the manifest was loaded are still seen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirTree {
    pub classes: BTreeSet<String>,
    /// `/`-separated directory relative to the source root.
    pub source: String,
    pub destination: LogicalPath,
    pub overrides: PlatformOverrides,
}

impl DirTree {
    /// Absolute source directory under `root`.
    #[must_use]
    pub fn source_path(&self, root: &Path) -> PathBuf {
        rooted(root, &self.source)
    }

    /// One plain entry per file found on `side`, sorted by relative path.
    ///
    /// `source_dir` and `destination_dir` are the resolved tree roots; a side
    /// that does not exist contributes no files.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if an existing tree cannot be walked.
    pub fn expand(
        &self,
        source_dir: &Path,
        destination_dir: &Path,
        side: TreeSide,
    ) -> Result<Vec<ManifestEntry>, ConfigError> {
        let mut files = BTreeSet::new();
        if side != TreeSide::Destination {
            files.extend(list_files(source_dir)?);
        }
        if side != TreeSide::Source {
            files.extend(list_files(destination_dir)?);
        }
        Ok(files.iter().map(|file| self.entry(file)).collect())
    }

    fn entry(&self, file: &str) -> ManifestEntry {
        let mut entry =
            ManifestEntry::plain(join_relative(&self.source, file), self.destination.join(file))
                .with_classes(self.classes.iter().cloned());
        if let Some(w) = &self.overrides.windows {
            entry = entry.with_windows(w.join(file));
        }
        entry
    }
}

/// Process signalled after an install so it picks up regenerated config.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReloadHook {
    #[serde(default = "default_reload_process")]
    pub process: String,
    #[serde(default = "default_reload_signal")]
    pub signal: String,
}

fn default_reload_process() -> String {
    "kitty".to_string()
}

fn default_reload_signal() -> String {
    "USR1".to_string()
}

impl Default for ReloadHook {
    fn default() -> Self {
        Self {
            process: default_reload_process(),
            signal: default_reload_signal(),
        }
    }
}

/// A validation warning detected after loading the manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationWarning {
    /// The entry source that triggered the warning.
    pub item: String,
    /// Human-readable warning message.
    pub message: String,
}

/// Ordered entries plus the variables they render with.
#[derive(Debug, Clone, Default)]
pub struct Manifest {
    entries: Vec<ManifestEntry>,
    trees: Vec<DirTree>,
    variables: VariableTable,
    reload: ReloadHook,
}

impl Manifest {
    #[must_use]
    pub fn new(variables: VariableTable) -> Self {
        Self {
            entries: Vec::new(),
            trees: Vec::new(),
            variables,
            reload: ReloadHook::default(),
        }
    }

    #[must_use]
    pub fn with_reload(mut self, reload: ReloadHook) -> Self {
        self.reload = reload;
        self
    }

    /// Append `entry`, keeping sources unique per kind.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::DuplicateSource`] if an entry of the same kind
    /// already uses the same source.
    pub fn push(&mut self, entry: ManifestEntry) -> Result<(), ConfigError> {
        if self
            .entries
            .iter()
            .any(|e| e.kind == entry.kind && e.source == entry.source)
        {
            return Err(ConfigError::DuplicateSource {
                kind: entry.kind.to_string(),
                source_path: entry.source,
            });
        }
        self.entries.push(entry);
        Ok(())
    }

    /// Add a directory tree expanded on use.
    pub fn push_tree(&mut self, tree: DirTree) {
        self.trees.push(tree);
    }

    /// Entries in declaration order.
    #[must_use]
    pub fn entries(&self) -> &[ManifestEntry] {
        &self.entries
    }

    /// Directory trees in declaration order.
    #[must_use]
    pub fn trees(&self) -> &[DirTree] {
        &self.trees
    }

    #[must_use]
    pub const fn variables(&self) -> &VariableTable {
        &self.variables
    }

    #[must_use]
    pub const fn reload(&self) -> &ReloadHook {
        &self.reload
    }

    /// Every class referenced by at least one entry.
    #[must_use]
    pub fn referenced_classes(&self) -> BTreeSet<&str> {
        self.entries
            .iter()
            .flat_map(|e| e.classes.iter())
            .chain(self.trees.iter().flat_map(|t| t.classes.iter()))
            .map(String::as_str)
            .collect()
    }

    /// Report entries whose destinations collide once resolved.
    ///
    /// Entries that fail to resolve are skipped here; resolution errors
    /// surface when the entry is actually used.
    #[must_use]
    pub fn validate(&self, resolver: &PathResolver) -> Vec<ValidationWarning> {
        let mut seen: HashMap<PathBuf, &str> = HashMap::new();
        let mut warnings = Vec::new();
        for entry in &self.entries {
            let Ok(dest) = resolver.resolve(&entry.destination, &entry.overrides) else {
                continue;
            };
            if let Some(first) = seen.get(&dest) {
                warnings.push(ValidationWarning {
                    item: entry.source.clone(),
                    message: format!(
                        "destination {} is also written by {first}",
                        dest.display()
                    ),
                });
            } else {
                seen.insert(dest, &entry.source);
            }
        }
        warnings
    }
}

// ---------------------------------------------------------------------------
// dotsync.toml
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawManifest {
    #[serde(default)]
    variables: BTreeMap<String, String>,
    #[serde(default)]
    aliases: BTreeMap<String, String>,
    #[serde(default)]
    reload: Option<ReloadHook>,
    #[serde(default)]
    file: Vec<RawEntry>,
    #[serde(default)]
    generated: Vec<RawEntry>,
    #[serde(default)]
    dir: Vec<RawDir>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawPath {
    #[serde(default)]
    base: Location,
    path: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawEntry {
    source: String,
    home: String,
    #[serde(default)]
    base: Location,
    #[serde(default)]
    classes: Vec<String>,
    windows: Option<RawPath>,
}

impl RawEntry {
    fn into_entry(self, kind: EntryKind) -> ManifestEntry {
        let mut entry = ManifestEntry::new(kind, self.source, LogicalPath::new(self.base, self.home))
            .with_classes(self.classes);
        if let Some(w) = self.windows {
            entry = entry.with_windows(LogicalPath::new(w.base, w.path));
        }
        entry
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawDir {
    source: String,
    home: String,
    #[serde(default)]
    base: Location,
    #[serde(default)]
    classes: Vec<String>,
    windows: Option<RawPath>,
    files: Option<Vec<String>>,
}

impl RawDir {
    fn into_tree(self) -> DirTree {
        DirTree {
            classes: self.classes.into_iter().collect(),
            source: self.source,
            destination: LogicalPath::new(self.base, self.home),
            overrides: PlatformOverrides {
                windows: self.windows.map(|w| LogicalPath::new(w.base, w.path)),
            },
        }
    }
}

/// Relative `/`-separated paths of all files below `dir`, sorted. A missing
/// `dir` has no files.
fn list_files(dir: &Path) -> Result<Vec<String>, ConfigError> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut files = Vec::new();
    for entry in walkdir::WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(|e| ConfigError::Io {
            path: dir.display().to_string(),
            source: e.into(),
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        if let Ok(rel) = entry.path().strip_prefix(dir) {
            let parts: Vec<String> = rel
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect();
            files.push(parts.join("/"));
        }
    }
    Ok(files)
}

/// Parse manifest text. `origin` names the text in error messages.
///
/// A `[[dir]]` with an explicit `files` list becomes plain entries; without
/// one it is kept as a [`DirTree`].
///
/// # Errors
///
/// Returns a [`ConfigError`] for malformed TOML, invalid variables or
/// aliases, or duplicate sources.
pub fn parse(content: &str, origin: &str) -> Result<Manifest, ConfigError> {
    let raw: RawManifest = toml::from_str(content).map_err(|e| ConfigError::Parse {
        path: origin.to_string(),
        message: e.message().to_string(),
    })?;

    let mut variables = VariableTable::new();
    for (name, value) in &raw.variables {
        variables.set(name, value)?;
    }
    for (alias, canonical) in &raw.aliases {
        variables.alias(alias, canonical)?;
    }

    let mut manifest = Manifest::new(variables).with_reload(raw.reload.unwrap_or_default());
    for entry in raw.file {
        manifest.push(entry.into_entry(EntryKind::Plain))?;
    }
    for entry in raw.generated {
        manifest.push(entry.into_entry(EntryKind::Generated))?;
    }
    for mut dir in raw.dir {
        match dir.files.take() {
            Some(files) => {
                let tree = dir.into_tree();
                for file in &files {
                    manifest.push(tree.entry(file))?;
                }
            }
            None => manifest.push_tree(dir.into_tree()),
        }
    }
    Ok(manifest)
}

/// Load the manifest at `path`.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] if the file cannot be read, or any error
/// from [`parse`].
pub fn load(path: &Path) -> Result<Manifest, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse(&content, &path.display().to_string())
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::paths::MapEnvironment;
    use crate::platform::{Os, Platform};
    use crate::sync::test_helpers::MockExecutor;
    use std::sync::Arc;

    fn parse_str(content: &str) -> Result<Manifest, ConfigError> {
        parse(content, "dotsync.toml")
    }

    #[test]
    fn parses_files_generated_and_variables() {
        let m = parse_str(
            r##"
[variables]
accent = "#ff0000"

[aliases]
kitty_accent = "accent"

[[file]]
source = "bashrc"
home = ".bashrc"
classes = ["linux"]

[[generated]]
source = "templates/kitty.conf"
home = "kitty/kitty.conf"
base = "roaming"
"##,
        )
        .unwrap();

        assert_eq!(m.entries().len(), 2);
        let plain = &m.entries()[0];
        assert_eq!(plain.kind, EntryKind::Plain);
        assert_eq!(plain.destination, LogicalPath::home(".bashrc"));
        assert!(plain.classes.contains("linux"));

        let generated = &m.entries()[1];
        assert_eq!(generated.kind, EntryKind::Generated);
        assert_eq!(generated.destination.base, Location::AppDataRoaming);

        assert_eq!(m.variables().get("kitty_accent_rgb"), Some("255, 0, 0"));
        assert_eq!(m.reload(), &ReloadHook::default());
    }

    #[test]
    fn windows_override_is_parsed() {
        let m = parse_str(
            r#"
[[file]]
source = "vscode/settings.json"
home = ".config/Code/User/settings.json"
windows = { base = "roaming", path = "Code/User/settings.json" }
"#,
        )
        .unwrap();
        assert_eq!(
            m.entries()[0].overrides.windows,
            Some(LogicalPath::new(
                Location::AppDataRoaming,
                "Code/User/settings.json"
            ))
        );
    }

    #[test]
    fn reload_table_overrides_defaults() {
        let m = parse_str("[reload]\nprocess = \"alacritty\"\n").unwrap();
        assert_eq!(m.reload().process, "alacritty");
        assert_eq!(m.reload().signal, "USR1");
    }

    #[test]
    fn duplicate_source_of_same_kind_is_an_error() {
        let err = parse_str(
            "[[file]]\nsource = \"a\"\nhome = \".a\"\n\n[[file]]\nsource = \"a\"\nhome = \".b\"\n",
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateSource { .. }));
    }

    #[test]
    fn same_source_in_different_kinds_is_allowed() {
        let m = parse_str(
            "[[file]]\nsource = \"a\"\nhome = \".a\"\n\n[[generated]]\nsource = \"a\"\nhome = \".b\"\n",
        )
        .unwrap();
        assert_eq!(m.entries().len(), 2);
    }

    #[test]
    fn unknown_field_is_a_parse_error() {
        let err = parse_str("[[file]]\nsource = \"a\"\nhome = \".a\"\nmode = 1\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn unknown_base_is_a_parse_error() {
        let err =
            parse_str("[[file]]\nsource = \"a\"\nhome = \".a\"\nbase = \"desktop\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn invalid_alias_escalates() {
        let err = parse_str("[aliases]\nfg = \"fg\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Variable(_)));
    }

    #[test]
    fn dir_with_explicit_files_expands_in_order() {
        let m = parse_str(
            r#"
[[dir]]
source = "vimfiles"
home = ".vim"
classes = ["vim"]
files = ["vimrc", "colors/dark.vim"]
"#,
        )
        .unwrap();
        let sources: Vec<&str> = m.entries().iter().map(|e| e.source.as_str()).collect();
        assert_eq!(sources, vec!["vimfiles/vimrc", "vimfiles/colors/dark.vim"]);
        assert_eq!(
            m.entries()[1].destination,
            LogicalPath::home(".vim/colors/dark.vim")
        );
        assert!(m.entries().iter().all(|e| e.classes.contains("vim")));
    }

    fn vim_tree() -> DirTree {
        let m = parse_str(
            r#"
[[dir]]
source = "vimfiles"
home = ".vim"
classes = ["vim"]
"#,
        )
        .unwrap();
        assert!(m.entries().is_empty());
        assert_eq!(m.referenced_classes().into_iter().collect::<Vec<_>>(), vec!["vim"]);
        m.trees()[0].clone()
    }

    fn sources(entries: &[ManifestEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.source.as_str()).collect()
    }

    #[test]
    fn tree_walks_source_side_sorted() {
        let tmp = tempfile::tempdir().unwrap();
        let src = tmp.path().join("vimfiles");
        std::fs::create_dir_all(src.join("colors")).unwrap();
        std::fs::write(src.join("vimrc"), "set nu").unwrap();
        std::fs::write(src.join("colors/dark.vim"), "hi").unwrap();

        let entries = vim_tree()
            .expand(&src, &tmp.path().join(".vim"), TreeSide::Source)
            .unwrap();
        assert_eq!(sources(&entries), vec!["vimfiles/colors/dark.vim", "vimfiles/vimrc"]);
        assert_eq!(entries[1].destination, LogicalPath::home(".vim/vimrc"));
        assert!(entries.iter().all(|e| e.classes.contains("vim")));
    }

    #[test]
    fn tree_combines_both_sides() {
        let tmp = tempfile::tempdir().unwrap();
        let src = tmp.path().join("vimfiles");
        let dest = tmp.path().join(".vim");
        std::fs::create_dir_all(&src).unwrap();
        std::fs::create_dir_all(dest.join("after")).unwrap();
        std::fs::write(src.join("vimrc"), "set nu").unwrap();
        std::fs::write(dest.join("vimrc"), "set nu").unwrap();
        std::fs::write(dest.join("after/local.vim"), "x").unwrap();

        let tree = vim_tree();
        let both = tree.expand(&src, &dest, TreeSide::Both).unwrap();
        assert_eq!(sources(&both), vec!["vimfiles/after/local.vim", "vimfiles/vimrc"]);
        let home_only = tree.expand(&src, &dest, TreeSide::Destination).unwrap();
        assert_eq!(sources(&home_only), sources(&both));
        let repo_only = tree.expand(&src, &dest, TreeSide::Source).unwrap();
        assert_eq!(sources(&repo_only), vec!["vimfiles/vimrc"]);
    }

    #[test]
    fn tree_missing_on_both_sides_is_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let entries = vim_tree()
            .expand(&tmp.path().join("nope"), &tmp.path().join(".nope"), TreeSide::Both)
            .unwrap();
        assert!(entries.is_empty());
    }

    #[test]
    fn tree_windows_override_follows_each_file() {
        let m = parse_str(
            r#"
[[dir]]
source = "nvim"
home = ".config/nvim"
windows = { base = "local", path = "nvim" }
files = ["init.lua"]
"#,
        )
        .unwrap();
        assert_eq!(
            m.entries()[0].overrides.windows,
            Some(LogicalPath::new(Location::AppDataLocal, "nvim/init.lua"))
        );
    }

    #[test]
    fn load_missing_file_is_an_io_error() {
        let root = tempfile::tempdir().unwrap();
        let err = load(&root.path().join("dotsync.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn source_path_joins_components() {
        let e = ManifestEntry::plain("vimfiles/colors/dark.vim", LogicalPath::home(".x"));
        assert_eq!(
            e.source_path(Path::new("/repo")),
            PathBuf::from("/repo/vimfiles/colors/dark.vim")
        );
    }

    #[test]
    fn validate_reports_duplicate_destinations() {
        let mut m = Manifest::new(VariableTable::new());
        m.push(ManifestEntry::plain("a", LogicalPath::home(".a")))
            .unwrap();
        m.push(ManifestEntry::generated("t/a", LogicalPath::home(".a")))
            .unwrap();
        m.push(ManifestEntry::plain("b", LogicalPath::home(".b")))
            .unwrap();

        let resolver = PathResolver::new(
            Platform::new(Os::Linux),
            Arc::new(MapEnvironment::new().with("HOME", "/home/u")),
            Arc::new(MockExecutor::default()),
        );
        let warnings = m.validate(&resolver);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].item, "t/a");
        assert!(warnings[0].message.contains("also written by a"));
    }

    #[test]
    fn referenced_classes_are_collected() {
        let mut m = Manifest::default();
        m.push(ManifestEntry::plain("a", LogicalPath::home(".a")).with_classes(["x", "y"]))
            .unwrap();
        m.push(ManifestEntry::plain("b", LogicalPath::home(".b")).with_classes(["y"]))
            .unwrap();
        assert_eq!(
            m.referenced_classes().into_iter().collect::<Vec<_>>(),
            vec!["x", "y"]
        );
    }
}
