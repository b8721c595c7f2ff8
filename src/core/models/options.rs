//! Free-form task options
//!
//! String keyed values passed unmodified to every task's execute call,
//! e.g. a search root or a namespace override.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Key/value options handed to a task
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Options(BTreeMap<String, String>);

impl Options {
    /// Empty options
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a value
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Set a value, replacing any previous one
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    /// Copy of these options with `overrides` applied on top
    #[must_use]
    pub fn merged(&self, overrides: &Self) -> Self {
        let mut merged = self.clone();
        merged.0.extend(overrides.0.iter().map(|(k, v)| (k.clone(), v.clone())));
        merged
    }

    /// Iterate over all pairs in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of options
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no options are set
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Options {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}
