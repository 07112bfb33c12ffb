//! In-memory sectioned configuration store.

use super::loader::ConfigTier;
use super::merge::deep_merge;
use super::source::{ConfigError, ConfigSource};
use anyhow::{Result, bail};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// A single stored value and the tier that supplied it.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredValue {
    pub value: Value,
    pub tier: ConfigTier,
}

/// Section → key → value map with case-insensitive names.
///
/// Later writes take precedence, so callers apply tiers from lowest to
/// highest priority.
#[derive(Debug, Clone, Default)]
pub struct ConfigStore {
    sections: BTreeMap<String, BTreeMap<String, StoredValue>>,
}

impl ConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a single value on top of whatever a lower tier supplied.
    ///
    /// Mappings are merged key by key; a null value leaves the existing
    /// entry untouched.
    pub fn set(&mut self, section: &str, key: &str, value: Value, tier: ConfigTier) {
        if value.is_null() {
            return;
        }
        let entries = self.sections.entry(section.to_lowercase()).or_default();
        let key = key.to_lowercase();
        let value = match entries.remove(&key) {
            Some(existing) => deep_merge(existing.value, value),
            None => value,
        };
        entries.insert(key, StoredValue { value, tier });
    }

    /// Builder-style [`set`](Self::set) for the defaults tier.
    pub fn with(mut self, section: &str, key: &str, value: impl Into<Value>) -> Self {
        self.set(section, key, value.into(), ConfigTier::Defaults);
        self
    }

    /// Apply a whole `{section: {key: value}}` document from one tier.
    ///
    /// Returns an error naming the offending section when a top-level entry
    /// is not a mapping.
    pub fn apply_document(&mut self, document: Value, tier: ConfigTier) -> Result<()> {
        let sections = match document {
            Value::Null => return Ok(()),
            Value::Object(sections) => sections,
            other => bail!("expected a mapping of sections, found {}", other),
        };

        for (section, entries) in sections {
            match entries {
                Value::Null => {}
                Value::Object(entries) => {
                    // An empty mapping still declares the section.
                    self.sections.entry(section.to_lowercase()).or_default();
                    for (key, value) in entries {
                        self.set(&section, &key, value, tier);
                    }
                }
                _ => bail!("section '{}' must be a mapping", section),
            }
        }
        Ok(())
    }

    /// The stored entry for `section`/`key`, including its tier.
    pub fn entry(&self, section: &str, key: &str) -> Option<&StoredValue> {
        self.sections
            .get(&section.to_lowercase())
            .and_then(|entries| entries.get(&key.to_lowercase()))
    }
}

impl ConfigSource for ConfigStore {
    fn lookup(&self, section: &str, key: &str) -> Result<Option<Value>, ConfigError> {
        Ok(self.entry(section, key).map(|stored| stored.value.clone()))
    }

    fn lookup_section(&self, name: &str) -> Result<Option<Map<String, Value>>, ConfigError> {
        Ok(self.sections.get(&name.to_lowercase()).map(|entries| {
            entries
                .iter()
                .map(|(key, stored)| (key.clone(), stored.value.clone()))
                .collect()
        }))
    }
}
