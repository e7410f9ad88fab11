//! Plugin requests declared by scripts.

use std::collections::BTreeMap;

use super::location::{default_template, fill_template};

/// A single plugin declaration with its location already filled in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginRequest {
    pub name: String,
    pub version: String,
    pub location: String,
}

/// Every plugin requested across all scripts of a run, keyed by name.
///
/// When two declarations share a name the last one wins. A re-declaration
/// that changes the version or location is logged at warn level.
#[derive(Debug, Clone, Default)]
pub struct PluginTable {
    default_location: Option<String>,
    requests: BTreeMap<String, PluginRequest>,
}

impl PluginTable {
    /// Create an empty table using the built-in default location template.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty table with a custom default location template.
    pub fn with_default_location(default_location: Option<String>) -> Self {
        Self {
            default_location,
            requests: BTreeMap::new(),
        }
    }

    /// Record a declaration and return the request it produced.
    ///
    /// A `location` is honoured whenever given; otherwise the default
    /// template applies.
    pub fn declare(&mut self, name: &str, version: &str, location: Option<&str>) -> PluginRequest {
        let template = match location {
            Some(location) => location,
            None => default_template(self.default_location.as_deref()),
        };
        let request = PluginRequest {
            name: name.to_string(),
            version: version.to_string(),
            location: fill_template(template, name, version),
        };

        match self.requests.get(name) {
            Some(existing) if *existing != request => {
                tracing::warn!(
                    "plugin {} re-declared, replacing {}@{} with {}@{}",
                    name,
                    existing.version,
                    existing.location,
                    request.version,
                    request.location
                );
            }
            Some(_) => {}
            None => tracing::debug!("plugin {} requested from {}", name, request.location),
        }

        self.requests.insert(name.to_string(), request.clone());
        request
    }

    pub fn get(&self, name: &str) -> Option<&PluginRequest> {
        self.requests.get(name)
    }

    /// Requests in name order.
    pub fn requests(&self) -> impl Iterator<Item = &PluginRequest> {
        self.requests.values()
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }
}
