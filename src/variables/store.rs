//! The shared variable map.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use super::interpolation::render;

/// Name to value mapping shared by every script and the step-text hook.
///
/// Cloning a store yields another handle onto the same map.
#[derive(Debug, Clone, Default)]
pub struct VariableStore {
    inner: Arc<RwLock<HashMap<String, String>>>,
}

impl VariableStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store seeded from the process environment. Names and
    /// values that are not valid Unicode are converted lossily.
    pub fn from_env() -> Self {
        Self::from_pairs(std::env::vars_os().map(|(k, v)| {
            (
                k.to_string_lossy().into_owned(),
                v.to_string_lossy().into_owned(),
            )
        }))
    }

    /// Create a store from key/value pairs.
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        Self {
            inner: Arc::new(RwLock::new(pairs.into_iter().collect())),
        }
    }

    /// Look up a variable, returning the empty string when absent.
    pub fn get(&self, key: &str) -> String {
        tracing::trace!("looking up variable with key {}", key);
        self.lookup(key).unwrap_or_default()
    }

    /// Look up a variable.
    pub fn lookup(&self, key: &str) -> Option<String> {
        self.inner
            .read()
            .unwrap_or_else(|p| p.into_inner())
            .get(key)
            .cloned()
    }

    /// Set a variable.
    pub fn set(&self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        tracing::trace!("setting variable with key {}", key);
        self.inner
            .write()
            .unwrap_or_else(|p| p.into_inner())
            .insert(key, value.into());
    }

    /// Whether a variable is present.
    pub fn contains(&self, key: &str) -> bool {
        self.lookup(key).is_some()
    }

    /// Number of variables.
    pub fn len(&self) -> usize {
        self.inner.read().unwrap_or_else(|p| p.into_inner()).len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Substitute `{{name}}` placeholders in step text.
    pub fn substitute(&self, text: &str) -> String {
        let map = self.inner.read().unwrap_or_else(|p| p.into_inner());
        render(text, |name| map.get(name).cloned())
    }
}
