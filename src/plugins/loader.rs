//! Turning vendored artifacts into plugin objects.

use anyhow::{anyhow, Result};
use std::collections::HashMap;
use std::path::Path;

use libloading::Library;

use super::object::{
    Plugin, PluginFactory, PluginHandle, PLUGIN_ABI_SYMBOL, PLUGIN_ABI_VERSION, PLUGIN_ENTRYPOINT,
};

/// Loads a plugin from its vendored artifact.
pub trait PluginLoader: Send + Sync {
    fn load(&self, name: &str, artifact: &Path) -> Result<PluginHandle>;
}

/// Loads plugins from native dynamic libraries.
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeLoader;

impl PluginLoader for NativeLoader {
    fn load(&self, name: &str, artifact: &Path) -> Result<PluginHandle> {
        tracing::debug!("loading plugin {} from {}", name, artifact.display());

        // SAFETY: loading a library runs its initialisers. Artifacts come
        // from locations the scripts explicitly declared.
        let library = unsafe { Library::new(artifact) }
            .map_err(|e| anyhow!("cannot open {}: {}", artifact.display(), e))?;

        // SAFETY: the marker is a `u32` static exported by `declare_plugin!`.
        let abi = unsafe {
            let marker = library.get::<*const u32>(PLUGIN_ABI_SYMBOL).map_err(|e| {
                anyhow!("{} is not a habitable plugin: {}", artifact.display(), e)
            })?;
            **marker
        };
        if abi != PLUGIN_ABI_VERSION {
            return Err(anyhow!(
                "{} exports plugin ABI {}, expected {}",
                artifact.display(),
                abi,
                PLUGIN_ABI_VERSION
            ));
        }

        // SAFETY: the ABI marker matched, so the factory has the expected type.
        let plugin = unsafe {
            let factory = library
                .get::<PluginFactory>(PLUGIN_ENTRYPOINT)
                .map_err(|e| anyhow!("{} has no plugin factory: {}", artifact.display(), e))?;
            factory()
        };

        Ok(PluginHandle::from_library(name, plugin, library))
    }
}

type Factory = Box<dyn Fn() -> Box<dyn Plugin> + Send + Sync>;

/// Serves plugins compiled into the host binary, ignoring the artifact.
#[derive(Default)]
pub struct InProcessLoader {
    factories: HashMap<String, Factory>,
}

impl InProcessLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `factory` available under `name`.
    pub fn register<F>(mut self, name: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> Box<dyn Plugin> + Send + Sync + 'static,
    {
        self.factories.insert(name.into(), Box::new(factory));
        self
    }
}

impl PluginLoader for InProcessLoader {
    fn load(&self, name: &str, _artifact: &Path) -> Result<PluginHandle> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| anyhow!("no in-process plugin named {}", name))?;
        Ok(PluginHandle::in_process(name, factory()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use tempfile::TempDir;

    struct Constant(i64);

    impl Plugin for Constant {
        fn call(&self, _method: &str, _args: Vec<Value>) -> std::result::Result<Value, String> {
            Ok(Value::from(self.0))
        }
    }

    #[test]
    fn in_process_loader_builds_registered_plugins() {
        let loader = InProcessLoader::new().register("answer", || Box::new(Constant(42)));
        let handle = loader.load("answer", Path::new("unused")).unwrap();

        assert_eq!(handle.name(), "answer");
        assert_eq!(handle.call("get", vec![]).unwrap(), Value::from(42));
    }

    #[test]
    fn in_process_loader_rejects_unknown_names() {
        let loader = InProcessLoader::new();
        let err = loader.load("ghost", Path::new("unused")).unwrap_err();
        assert!(err.to_string().contains("ghost"));
    }

    #[test]
    fn native_loader_rejects_non_library_files() {
        let temp = TempDir::new().unwrap();
        let artifact = temp.path().join("fake.so");
        std::fs::write(&artifact, b"definitely not a shared object").unwrap();

        let err = NativeLoader.load("fake", &artifact).unwrap_err();
        assert!(err.to_string().contains("fake.so"));
    }
}
