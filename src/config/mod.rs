//! Manifest, variables, classes, and per-user settings.
pub mod classes;
pub mod manifest;
pub mod settings;
pub mod variables;

pub use classes::{ClassReport, ClassState, active_entries, class_report};
pub use manifest::{
    DirTree, EntryKind, Manifest, ManifestEntry, ReloadHook, TreeSide, ValidationWarning,
};
pub use settings::Settings;
pub use variables::VariableTable;

/// Manifest file name at the source root.
pub const MANIFEST_FILE: &str = "dotsync.toml";
