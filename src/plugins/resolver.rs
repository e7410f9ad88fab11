//! Resolving declared plugins into loaded plugin objects.

use std::collections::BTreeMap;
use std::thread;

use super::loader::PluginLoader;
use super::object::PluginHandle;
use super::request::{PluginRequest, PluginTable};
use super::vendor::Vendor;
use crate::cache::BuildCache;
use crate::error::{HabitableError, Result};

/// Plugins loaded for a run, keyed by declared name.
#[derive(Debug, Clone, Default)]
pub struct ResolvedPlugins {
    handles: BTreeMap<String, PluginHandle>,
}

impl ResolvedPlugins {
    /// Add a plugin under its own name, replacing any previous one.
    pub fn insert(&mut self, handle: PluginHandle) {
        self.handles.insert(handle.name().to_string(), handle);
    }

    pub fn get(&self, name: &str) -> Option<&PluginHandle> {
        self.handles.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PluginHandle)> {
        self.handles.iter().map(|(name, handle)| (name.as_str(), handle))
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}

/// Vendors and loads every plugin in a [`PluginTable`].
///
/// Each request's location is checked against the build cache under the
/// plugin's name; the artifact is only reacquired when the location changed
/// or the vendored file is missing. A new location is recorded only after
/// its artifact has been vendored. Requests resolve concurrently and the
/// first failure, in name order, aborts the whole resolution.
pub struct PluginResolver<'a> {
    cache: &'a BuildCache,
    vendor: Vendor,
    loader: Box<dyn PluginLoader + 'a>,
}

impl<'a> PluginResolver<'a> {
    pub fn new(cache: &'a BuildCache, vendor: Vendor, loader: Box<dyn PluginLoader + 'a>) -> Self {
        Self {
            cache,
            vendor,
            loader,
        }
    }

    /// Resolve every request in `table`.
    pub fn resolve(&self, table: &PluginTable) -> Result<ResolvedPlugins> {
        if table.is_empty() {
            tracing::debug!("no plugins requested");
            return Ok(ResolvedPlugins::default());
        }
        tracing::info!("resolving {} plugins", table.len());

        let outcomes: Vec<(String, Result<PluginHandle>)> = thread::scope(|s| {
            let workers: Vec<_> = table
                .requests()
                .map(|request| {
                    let worker = s.spawn(move || self.resolve_one(request));
                    (request.name.clone(), worker)
                })
                .collect();

            workers
                .into_iter()
                .map(|(name, worker)| {
                    let outcome = worker.join().unwrap_or_else(|_| {
                        Err(HabitableError::PluginResolution {
                            plugin: name.clone(),
                            message: "resolution panicked".to_string(),
                        })
                    });
                    (name, outcome)
                })
                .collect()
        });

        let mut handles = BTreeMap::new();
        for (name, outcome) in outcomes {
            handles.insert(name, outcome?);
        }
        Ok(ResolvedPlugins { handles })
    }

    fn resolve_one(&self, request: &PluginRequest) -> Result<PluginHandle> {
        let failed = |message: String| HabitableError::PluginResolution {
            plugin: request.name.clone(),
            message,
        };

        let changed = self
            .cache
            .peek_string(&request.name, &request.location)
            .map_err(|e| failed(e.to_string()))?;

        let artifact = self
            .vendor
            .vendor(&request.name, &request.location, changed)
            .map_err(|e| failed(format!("{:#}", e)))?;

        // Only an artifact that was actually acquired may satisfy later runs.
        if changed {
            self.cache
                .commit_string(&request.name, &request.location)
                .map_err(|e| failed(e.to_string()))?;
        }

        let handle = self
            .loader
            .load(&request.name, &artifact)
            .map_err(|e| failed(format!("{:#}", e)))?;

        tracing::debug!("plugin {}@{} ready", request.name, request.version);
        Ok(handle)
    }
}
