//! Template variables with one-level aliases and color derivation.
//!
//! The table is mutated in place. Every write goes through the canonical
//! name and is pushed to all of its aliases immediately, so a lookup never
//! needs to follow an alias:
//!
//! - `set(name, value)` stores `value` under the canonical name of `name`
//!   and under every alias of that canonical name.
//! - `alias(alias, canonical)` copies the canonical's current value (if any)
//!   to `alias` right away.
//! - A value of the form `#rrggbb` also writes `<name>_rgb = "r, g, b"` for
//!   the canonical name and every alias. A later non-color value clears
//!   those derived entries.
use std::collections::BTreeMap;

use crate::error::VariableError;

/// Suffix of the derived decimal color variable.
const RGB_SUFFIX: &str = "_rgb";

/// Variables available to templates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VariableTable {
    values: BTreeMap<String, String>,
    /// alias → canonical
    aliases: BTreeMap<String, String>,
}

impl VariableTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Canonical name for `name` (itself when it is not an alias).
    #[must_use]
    pub fn canonical<'a>(&'a self, name: &'a str) -> &'a str {
        self.aliases.get(name).map_or(name, String::as_str)
    }

    /// Value currently visible under `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// Number of resolvable names, derived `_rgb` entries included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// All resolvable `(name, value)` pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Set `name` (or the canonical it aliases) to `value`.
    ///
    /// # Errors
    ///
    /// Returns [`VariableError::InvalidColor`] if `value` starts with `#` but
    /// is not a `#rrggbb` color. The table is left unchanged in that case.
    pub fn set(&mut self, name: &str, value: &str) -> Result<(), VariableError> {
        let canonical = self.canonical(name).to_string();
        let rgb = if value.starts_with('#') {
            Some(parse_color(value).ok_or_else(|| VariableError::InvalidColor {
                name: canonical.clone(),
                value: value.to_string(),
            })?)
        } else {
            None
        };

        let mut names = vec![canonical.clone()];
        names.extend(self.aliases_of(&canonical));
        for n in names {
            self.store(&n, value, rgb.as_deref());
        }
        Ok(())
    }

    /// Declare `alias` as another name for `canonical`.
    ///
    /// # Errors
    ///
    /// Returns [`VariableError::SelfAlias`] for `alias == canonical`, and
    /// [`VariableError::AliasChain`] when `canonical` is itself an alias or
    /// when other aliases already point at `alias`.
    pub fn alias(&mut self, alias: &str, canonical: &str) -> Result<(), VariableError> {
        if alias == canonical {
            return Err(VariableError::SelfAlias(alias.to_string()));
        }
        if self.aliases.contains_key(canonical) {
            return Err(VariableError::AliasChain {
                alias: alias.to_string(),
                target: canonical.to_string(),
            });
        }
        if let Some(existing) = self.aliases_of(alias).into_iter().next() {
            return Err(VariableError::AliasChain {
                alias: existing,
                target: alias.to_string(),
            });
        }

        self.aliases
            .insert(alias.to_string(), canonical.to_string());

        if let Some(value) = self.values.get(canonical).cloned() {
            let rgb = self.values.get(&rgb_name(canonical)).cloned();
            self.store(alias, &value, rgb.as_deref());
        }
        Ok(())
    }

    fn aliases_of(&self, canonical: &str) -> Vec<String> {
        self.aliases
            .iter()
            .filter(|(_, target)| target.as_str() == canonical)
            .map(|(alias, _)| alias.clone())
            .collect()
    }

    fn store(&mut self, name: &str, value: &str, rgb: Option<&str>) {
        self.values.insert(name.to_string(), value.to_string());
        match rgb {
            Some(rgb) => {
                self.values.insert(rgb_name(name), rgb.to_string());
            }
            None => {
                self.values.remove(&rgb_name(name));
            }
        }
    }
}

fn rgb_name(name: &str) -> String {
    format!("{name}{RGB_SUFFIX}")
}

/// `#rrggbb` → `"r, g, b"`.
fn parse_color(value: &str) -> Option<String> {
    let hex = value.strip_prefix('#')?;
    if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let channel = |range: std::ops::Range<usize>| {
        hex.get(range)
            .and_then(|h| u8::from_str_radix(h, 16).ok())
    };
    Some(format!(
        "{}, {}, {}",
        channel(0..2)?,
        channel(2..4)?,
        channel(4..6)?
    ))
}
