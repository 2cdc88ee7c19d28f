//! Class-based entry activation.
use std::collections::BTreeSet;

use super::manifest::{Manifest, ManifestEntry};

/// The set of classes enabled on this machine.
///
/// Loaded once per invocation from the settings document and passed
/// explicitly to every filtering call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassState {
    classes: BTreeSet<String>,
}

impl ClassState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable `class`. Returns `true` if it was not already enabled.
    pub fn enable(&mut self, class: &str) -> bool {
        self.classes.insert(class.to_string())
    }

    /// Disable `class`. Returns `true` if it was enabled.
    pub fn disable(&mut self, class: &str) -> bool {
        self.classes.remove(class)
    }

    #[must_use]
    pub fn contains(&self, class: &str) -> bool {
        self.classes.contains(class)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Enabled classes in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.classes.iter().map(String::as_str)
    }

    /// Whether `entry` applies: it has no classes or shares one with `self`.
    #[must_use]
    pub fn is_active(&self, entry: &ManifestEntry) -> bool {
        self.allows(&entry.classes)
    }

    /// Whether something tagged with `classes` applies.
    #[must_use]
    pub fn allows(&self, classes: &BTreeSet<String>) -> bool {
        classes.is_empty() || !classes.is_disjoint(&self.classes)
    }
}

impl<S: Into<String>> FromIterator<S> for ClassState {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            classes: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// Entries of `manifest` active under `state`, in declaration order.
#[must_use]
pub fn active_entries<'a>(manifest: &'a Manifest, state: &ClassState) -> Vec<&'a ManifestEntry> {
    manifest
        .entries()
        .iter()
        .filter(|e| state.is_active(e))
        .collect()
}

/// Enabled classes next to the ones the manifest uses but are not enabled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassReport {
    pub enabled: Vec<String>,
    pub available: Vec<String>,
}

#[must_use]
pub fn class_report(manifest: &Manifest, state: &ClassState) -> ClassReport {
    ClassReport {
        enabled: state.iter().map(str::to_string).collect(),
        available: manifest
            .referenced_classes()
            .into_iter()
            .filter(|c| !state.contains(c))
            .map(str::to_string)
            .collect(),
    }
}
