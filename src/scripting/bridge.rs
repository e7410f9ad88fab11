//! Loading every compiled script and driving them through their phases.

use std::fs;
use std::path::{Path, PathBuf};

use super::host::HostContext;
use super::unit::ScriptUnit;
use crate::bundler::SCRIPT_EXTENSION;
use crate::error::Result;
use crate::plugins::{PluginTable, ResolvedPlugins};
use crate::steps::StepRegistrar;
use crate::variables::VariableStore;

/// Owns the run's scripts and the state they share.
///
/// Scripts are processed one at a time in file-name order:
/// [`load_dir`](Self::load_dir) discovers them, [`plugin_table`](Self::plugin_table)
/// exposes what they declared, [`bind`](Self::bind) injects the resolved
/// plugins and [`register_steps`](Self::register_steps) runs the
/// registration phase.
pub struct ScriptBridge {
    context: HostContext,
    units: Vec<ScriptUnit>,
}

impl ScriptBridge {
    pub fn new(variables: VariableStore, plugins: PluginTable) -> Self {
        Self {
            context: HostContext::new(variables, plugins),
            units: Vec::new(),
        }
    }

    /// Compiled scripts in `dir`, sorted by file name.
    pub fn discover(dir: &Path) -> Result<Vec<PathBuf>> {
        let mut scripts = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }
            if path.extension().is_some_and(|ext| ext == SCRIPT_EXTENSION) {
                scripts.push(path);
            } else {
                tracing::warn!("ignoring {}, not a .{} script", path.display(), SCRIPT_EXTENSION);
            }
        }
        scripts.sort();
        Ok(scripts)
    }

    /// Discover and load every script in `dir`. Returns how many were loaded.
    pub fn load_dir(&mut self, dir: &Path) -> Result<usize> {
        let scripts = Self::discover(dir)?;
        tracing::info!("loading {} scripts from {}", scripts.len(), dir.display());
        for script in &scripts {
            self.load(script)?;
        }
        Ok(scripts.len())
    }

    /// Load a single script for discovery.
    pub fn load(&mut self, path: &Path) -> Result<()> {
        let mut unit = ScriptUnit::new(path);
        unit.load(&self.context)?;
        self.units.push(unit);
        Ok(())
    }

    /// Every plugin declared by the scripts loaded so far.
    pub fn plugin_table(&self) -> PluginTable {
        self.context.plugin_table()
    }

    /// Inject the resolved plugins into every script.
    pub fn bind(&mut self, plugins: &ResolvedPlugins) -> Result<()> {
        for unit in &mut self.units {
            unit.bind_plugins(plugins)?;
        }
        Ok(())
    }

    /// Run the registration phase of every script against `registrar`.
    /// Returns the total number of steps registered.
    pub fn register_steps(&mut self, registrar: &mut dyn StepRegistrar) -> Result<usize> {
        let mut total = 0;
        for unit in &mut self.units {
            total += unit.run(registrar)?;
        }
        Ok(total)
    }

    pub fn units(&self) -> &[ScriptUnit] {
        &self.units
    }

    pub fn variables(&self) -> &VariableStore {
        &self.context.variables
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HabitableError;
    use crate::scripting::UnitState;
    use crate::plugins::{Plugin, PluginHandle};
    use crate::steps::{StepBinding, StepOutcome};
    use serde_json::Value;
    use tempfile::TempDir;

    struct Echo;

    impl Plugin for Echo {
        fn call(&self, _method: &str, args: Vec<Value>) -> std::result::Result<Value, String> {
            Ok(args.into_iter().next().unwrap_or(Value::Null))
        }
    }

    fn write(dir: &Path, name: &str, body: &str) {
        fs::write(dir.join(name), body).unwrap();
    }

    #[test]
    fn discovers_scripts_in_name_order() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "b.rhai", "");
        write(temp.path(), "a.rhai", "");
        write(temp.path(), "notes.txt", "");
        fs::create_dir(temp.path().join("nested.rhai")).unwrap();

        let scripts = ScriptBridge::discover(temp.path()).unwrap();
        let names: Vec<_> = scripts
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.rhai", "b.rhai"]);
    }

    #[test]
    fn later_scripts_win_plugin_declarations() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "a.rhai", r#"habitable.use_plugin("kube", "1.0.0", "/a.so");"#);
        write(temp.path(), "b.rhai", r#"habitable.use_plugin("kube", "2.0.0", "/b.so");"#);

        let mut bridge = ScriptBridge::new(VariableStore::new(), PluginTable::new());
        assert_eq!(bridge.load_dir(temp.path()).unwrap(), 2);

        let table = bridge.plugin_table();
        assert_eq!(table.len(), 1);
        assert_eq!(table.get("kube").unwrap().version, "2.0.0");
    }

    #[test]
    fn registers_steps_from_every_script() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "a.rhai", r#"habitable.add_step("^a$", || ());"#);
        write(
            temp.path(),
            "b.rhai",
            r#"habitable.add_step("^b$", || ()); habitable.add_step("^c$", || ());"#,
        );

        let mut bridge = ScriptBridge::new(VariableStore::new(), PluginTable::new());
        bridge.load_dir(temp.path()).unwrap();
        bridge.bind(&ResolvedPlugins::default()).unwrap();

        let mut bindings: Vec<StepBinding> = Vec::new();
        assert_eq!(bridge.register_steps(&mut bindings).unwrap(), 3);
        let patterns: Vec<_> = bindings.iter().map(|b| b.pattern.as_str()).collect();
        assert_eq!(patterns, vec!["^a$", "^b$", "^c$"]);
        assert!(bridge
            .units()
            .iter()
            .all(|u| u.state() == UnitState::Registered));
    }

    #[test]
    fn plugins_are_shared_across_scripts_in_any_order() {
        let temp = TempDir::new().unwrap();
        let uses_echo = r#"
            habitable.add_step("^echo (.+)$", |w| {
                if echo.invoke("echo", [w]) != w { habitable.fail("no echo") }
            });
        "#;
        write(temp.path(), "a_uses.rhai", uses_echo);
        write(
            temp.path(),
            "b_declares.rhai",
            r#"habitable.use_plugin("echo", "1.0", "/opt/echo.so");"#,
        );
        write(temp.path(), "c_uses.rhai", uses_echo);

        let mut bridge = ScriptBridge::new(VariableStore::new(), PluginTable::new());
        assert_eq!(bridge.load_dir(temp.path()).unwrap(), 3);
        assert_eq!(bridge.plugin_table().len(), 1);

        let mut plugins = ResolvedPlugins::default();
        plugins.insert(PluginHandle::in_process("echo", Box::new(Echo)));
        bridge.bind(&plugins).unwrap();

        let mut bindings: Vec<StepBinding> = Vec::new();
        assert_eq!(bridge.register_steps(&mut bindings).unwrap(), 2);
        for binding in &bindings {
            assert_eq!(binding.invoke(&["hi".into()]), StepOutcome::Passed);
        }
    }

    #[test]
    fn broken_script_aborts_loading() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "a.rhai", "let x = 1;");
        write(temp.path(), "b.rhai", "fn (");

        let mut bridge = ScriptBridge::new(VariableStore::new(), PluginTable::new());
        let err = bridge.load_dir(temp.path()).unwrap_err();

        assert!(matches!(err, HabitableError::ScriptLoad { .. }));
        assert_eq!(bridge.units().len(), 1);
    }

    #[test]
    fn missing_directory_is_an_error() {
        let temp = TempDir::new().unwrap();
        let mut bridge = ScriptBridge::new(VariableStore::new(), PluginTable::new());
        assert!(bridge.load_dir(&temp.path().join("missing")).is_err());
    }
}
