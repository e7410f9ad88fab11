//! The plugin capability interface.

use std::fmt;
use std::sync::Arc;

use libloading::Library;
use serde_json::Value;

/// Symbol of the zero-argument factory every native plugin exports.
pub const PLUGIN_ENTRYPOINT: &[u8] = b"habitable_plugin_new\0";

/// Symbol of the ABI marker every native plugin exports.
pub const PLUGIN_ABI_SYMBOL: &[u8] = b"HABITABLE_PLUGIN_ABI\0";

/// Version of the factory signature. Bumped whenever [`Plugin`] or
/// [`PluginFactory`] change shape.
pub const PLUGIN_ABI_VERSION: u32 = 1;

/// Signature of the exported factory.
pub type PluginFactory = fn() -> Box<dyn Plugin>;

/// Behaviour a plugin offers to scripts.
///
/// Arguments and results travel as JSON values so plugins stay independent
/// of the scripting runtime.
pub trait Plugin: Send + Sync {
    /// Invoke `method` with `args`. An `Err` is raised as a script error.
    fn call(&self, method: &str, args: Vec<Value>) -> Result<Value, String>;
}

/// A loaded plugin, shared read-only by every script it is injected into.
///
/// Keeps the dynamic library it came from mapped for as long as any clone
/// of the handle exists.
#[derive(Clone)]
pub struct PluginHandle {
    name: String,
    // Field order matters: the plugin must drop before its library.
    plugin: Arc<dyn Plugin>,
    _library: Option<Arc<Library>>,
}

impl PluginHandle {
    /// Wrap a plugin that lives in the host binary.
    pub fn in_process(name: impl Into<String>, plugin: Box<dyn Plugin>) -> Self {
        Self {
            name: name.into(),
            plugin: Arc::from(plugin),
            _library: None,
        }
    }

    /// Wrap a plugin created from a dynamic library.
    pub(crate) fn from_library(
        name: impl Into<String>,
        plugin: Box<dyn Plugin>,
        library: Library,
    ) -> Self {
        Self {
            name: name.into(),
            plugin: Arc::from(plugin),
            _library: Some(Arc::new(library)),
        }
    }

    /// Name the plugin was declared under.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Invoke a plugin method.
    pub fn call(&self, method: &str, args: Vec<Value>) -> Result<Value, String> {
        tracing::trace!("calling {}.{}", self.name, method);
        self.plugin.call(method, args)
    }
}

impl fmt::Debug for PluginHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginHandle")
            .field("name", &self.name)
            .field("native", &self._library.is_some())
            .finish()
    }
}

/// Export a plugin factory from a `cdylib`.
///
/// ```ignore
/// habitable::declare_plugin!(MyPlugin::new());
/// ```
#[macro_export]
macro_rules! declare_plugin {
    ($constructor:expr) => {
        #[no_mangle]
        pub static HABITABLE_PLUGIN_ABI: u32 = $crate::plugins::PLUGIN_ABI_VERSION;

        #[no_mangle]
        pub fn habitable_plugin_new() -> Box<dyn $crate::plugins::Plugin> {
            Box::new($constructor)
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo;

    impl Plugin for Echo {
        fn call(&self, method: &str, args: Vec<Value>) -> Result<Value, String> {
            match method {
                "echo" => Ok(args.into_iter().next().unwrap_or(Value::Null)),
                other => Err(format!("unknown method {}", other)),
            }
        }
    }

    #[test]
    fn in_process_handle_dispatches_calls() {
        let handle = PluginHandle::in_process("echo", Box::new(Echo));

        assert_eq!(handle.name(), "echo");
        assert_eq!(
            handle.call("echo", vec![Value::from("hi")]).unwrap(),
            Value::from("hi")
        );
        assert!(handle.call("nope", vec![]).is_err());
    }

    #[test]
    fn clones_share_the_plugin() {
        let handle = PluginHandle::in_process("echo", Box::new(Echo));
        let clone = handle.clone();
        assert_eq!(clone.call("echo", vec![Value::from(1)]).unwrap(), Value::from(1));
        assert!(format!("{:?}", clone).contains("echo"));
    }

    #[test]
    fn entrypoint_symbols_are_nul_terminated() {
        assert_eq!(PLUGIN_ENTRYPOINT.last(), Some(&0));
        assert_eq!(PLUGIN_ABI_SYMBOL.last(), Some(&0));
    }
}
