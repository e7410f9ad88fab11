//! Plugin objects and deferred results as seen from scripts.

use rhai::{Array, Dynamic, Engine, EvalAltResult};
use serde_json::Value;

use crate::plugins::{Deferred, PluginHandle};

type ScriptResult<T> = Result<T, Box<EvalAltResult>>;

/// A plugin in a script's namespace.
///
/// During discovery a declared plugin is only a placeholder: scripts can
/// capture it in step handlers, but calling it is an error until the
/// resolved handle has been injected.
#[derive(Debug, Clone)]
pub struct PluginObject {
    name: String,
    handle: Option<PluginHandle>,
}

impl PluginObject {
    pub fn bound(handle: PluginHandle) -> Self {
        Self {
            name: handle.name().to_string(),
            handle: Some(handle),
        }
    }

    pub(crate) fn placeholder(name: &str) -> Self {
        Self {
            name: name.to_string(),
            handle: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_bound(&self) -> bool {
        self.handle.is_some()
    }

    fn handle(&self) -> ScriptResult<&PluginHandle> {
        self.handle.as_ref().ok_or_else(|| {
            format!(
                "plugin {} is not available before it has been resolved",
                self.name
            )
            .into()
        })
    }

    fn invoke(&self, method: &str, args: Array) -> ScriptResult<Dynamic> {
        let handle = self.handle()?;
        let result = handle.call(method, to_json_args(args)?)?;
        from_json(result)
    }

    fn spawn(&self, method: &str, args: Array) -> ScriptResult<Deferred> {
        let handle = self.handle()?.clone();
        let method = method.to_string();
        let args = to_json_args(args)?;
        Ok(Deferred::spawn(move || handle.call(&method, args)))
    }
}

/// Convert script values into plugin arguments.
pub fn to_json_args(args: Array) -> ScriptResult<Vec<Value>> {
    args.into_iter()
        .map(|arg| rhai::serde::from_dynamic::<Value>(&arg.flatten()))
        .collect()
}

/// Convert a plugin result into a script value.
pub fn from_json(value: Value) -> ScriptResult<Dynamic> {
    rhai::serde::to_dynamic(value)
}

/// Register [`PluginObject`] and [`Deferred`] with an engine.
pub fn register_plugin_api(engine: &mut Engine) {
    engine
        .register_type_with_name::<PluginObject>("Plugin")
        .register_get("name", |p: &mut PluginObject| p.name.clone())
        .register_fn("invoke", |p: &mut PluginObject, method: &str| {
            p.invoke(method, Array::new())
        })
        .register_fn("invoke", |p: &mut PluginObject, method: &str, args: Array| {
            p.invoke(method, args)
        })
        .register_fn("spawn", |p: &mut PluginObject, method: &str| {
            p.spawn(method, Array::new())
        })
        .register_fn("spawn", |p: &mut PluginObject, method: &str, args: Array| {
            p.spawn(method, args)
        });

    engine
        .register_type_with_name::<Deferred>("Deferred")
        .register_fn("wait", |d: &mut Deferred| -> ScriptResult<Dynamic> {
            from_json(d.wait()?)
        })
        .register_fn("is_settled", |d: &mut Deferred| d.is_settled());
}
