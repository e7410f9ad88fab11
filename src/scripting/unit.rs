//! One compiled script and its runtime.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use anyhow::Context;
use rhai::{Engine, Scope, AST};

use super::handler::bind_step;
use super::host::{register_host_api, Habitable, HostContext, Phase};
use super::objects::{register_plugin_api, PluginObject};
use crate::error::{HabitableError, Result};
use crate::plugins::{PluginHandle, ResolvedPlugins};
use crate::steps::StepRegistrar;

/// Name the host API object is bound to in every script.
pub const HOST_OBJECT: &str = "habitable";

/// Lifecycle of a [`ScriptUnit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitState {
    /// Known by path only.
    Unloaded,

    /// Source compiled and run once with step declarations ignored.
    Discovered,

    /// Resolved plugins injected.
    Bound,

    /// Source run again and its steps handed to the scenario engine.
    Registered,
}

impl UnitState {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnitState::Unloaded => "unloaded",
            UnitState::Discovered => "discovered",
            UnitState::Bound => "bound",
            UnitState::Registered => "registered",
        }
    }
}

impl fmt::Display for UnitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

struct Runtime {
    source: String,
    engine: Rc<Engine>,
    ast: Rc<AST>,
    scope: Scope<'static>,
    host: Habitable,
}

/// A compiled script driven through discovery, binding and registration.
///
/// The whole top-level body runs twice in the same scope: once during
/// discovery, where only plugin declarations take effect, and once during
/// registration, where step declarations are bound. Script authors must keep
/// top-level side effects idempotent; `habitable.phase()` tells them which
/// run is in progress.
pub struct ScriptUnit {
    path: PathBuf,
    state: UnitState,
    runtime: Option<Runtime>,
}

impl ScriptUnit {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            state: UnitState::Unloaded,
            runtime: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn state(&self) -> UnitState {
        self.state
    }

    /// Source text, once loaded.
    pub fn source(&self) -> Option<&str> {
        self.runtime.as_ref().map(|r| r.source.as_str())
    }

    /// Host object bound to this script, once loaded.
    pub fn host(&self) -> Option<&Habitable> {
        self.runtime.as_ref().map(|r| &r.host)
    }

    /// Read, compile and run the script for discovery.
    pub fn load(&mut self, context: &HostContext) -> Result<()> {
        self.expect_state(&[UnitState::Unloaded], UnitState::Discovered)?;

        let source = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read script {}", self.path.display()))?;

        let host = Habitable::new(context.clone(), &self.path);
        let engine = build_engine(&self.path, &host);

        let ast = engine
            .compile(&source)
            .map_err(|e| HabitableError::ScriptLoad {
                path: self.path.clone(),
                message: e.to_string(),
            })?;

        let mut scope = Scope::new();
        scope.push(HOST_OBJECT, host.clone());

        tracing::debug!("discovering {}", self.path.display());
        engine
            .run_ast_with_scope(&mut scope, &ast)
            .map_err(|e| HabitableError::ScriptExecution {
                path: self.path.clone(),
                message: e.to_string(),
            })?;

        self.runtime = Some(Runtime {
            source,
            engine: Rc::new(engine),
            ast: Rc::new(ast),
            scope,
            host,
        });
        self.state = UnitState::Discovered;
        Ok(())
    }

    /// Make a resolved plugin callable from the script under `name`.
    pub fn register_plugin(&mut self, name: &str, handle: &PluginHandle) -> Result<()> {
        self.expect_state(&[UnitState::Discovered, UnitState::Bound], UnitState::Bound)?;

        if let Some(runtime) = self.runtime.as_mut() {
            tracing::trace!("injecting plugin {} into {}", name, self.path.display());
            runtime
                .scope
                .set_or_push(name, PluginObject::bound(handle.clone()));
        }
        self.state = UnitState::Bound;
        Ok(())
    }

    /// Inject every resolved plugin. Moves the unit to bound even when
    /// there are none.
    pub fn bind_plugins(&mut self, plugins: &ResolvedPlugins) -> Result<()> {
        self.expect_state(&[UnitState::Discovered, UnitState::Bound], UnitState::Bound)?;

        for (name, handle) in plugins.iter() {
            self.register_plugin(name, handle)?;
        }
        self.state = UnitState::Bound;
        Ok(())
    }

    /// Re-run the script with step declarations live and hand every
    /// declared step to `registrar`. Returns the number of steps registered.
    pub fn run(&mut self, registrar: &mut dyn StepRegistrar) -> Result<usize> {
        self.expect_state(&[UnitState::Bound], UnitState::Registered)?;

        let Some(runtime) = self.runtime.as_mut() else {
            return Err(self.transition_error(UnitState::Registered));
        };

        tracing::debug!("registering steps from {}", self.path.display());
        runtime.host.set_phase(Phase::Registration);
        runtime
            .engine
            .run_ast_with_scope(&mut runtime.scope, &runtime.ast)
            .map_err(|e| HabitableError::ScriptExecution {
                path: self.path.clone(),
                message: e.to_string(),
            })?;

        let pending = runtime.host.take_pending();
        let count = pending.len();
        for step in pending {
            let binding = bind_step(
                Rc::clone(&runtime.engine),
                Rc::clone(&runtime.ast),
                step.pattern,
                step.handler,
            );
            registrar.register_step(binding)?;
        }

        tracing::info!("registered {} steps from {}", count, self.path.display());
        self.state = UnitState::Registered;
        Ok(count)
    }

    fn expect_state(&self, allowed: &[UnitState], to: UnitState) -> Result<()> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(self.transition_error(to))
        }
    }

    fn transition_error(&self, to: UnitState) -> HabitableError {
        HabitableError::InvalidTransition {
            path: self.path.clone(),
            from: self.state.as_str(),
            to: to.as_str(),
        }
    }
}

impl fmt::Debug for ScriptUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptUnit")
            .field("path", &self.path)
            .field("state", &self.state)
            .finish()
    }
}

fn build_engine(path: &Path, host: &Habitable) -> Engine {
    let mut engine = Engine::new();
    register_host_api(&mut engine);
    register_plugin_api(&mut engine);

    let script = path.display().to_string();
    engine.on_print(move |text| tracing::info!(script = %script, "{}", text));

    let script = path.display().to_string();
    engine.on_debug(move |text, _source, pos| {
        tracing::debug!(script = %script, "{} {}", pos, text)
    });

    // Plugins are not injected until every script has been discovered, and
    // a script may use a plugin declared by one that loads after it. During
    // discovery an undefined name reads as a placeholder; the registration
    // run resolves it for real and fails if it was never bound.
    let host = host.clone();
    #[allow(deprecated)]
    engine.on_var(move |name, _index, context| {
        if host.phase() != Phase::Discovery || context.scope().contains(name) {
            return Ok(None);
        }
        if !host.knows_plugin(name) {
            tracing::trace!("{} is not defined yet, deferring it to registration", name);
        }
        Ok(Some(rhai::Dynamic::from(PluginObject::placeholder(name))))
    });

    engine
}
