//! The `habitable` object every script sees.

use std::cell::RefCell;
use std::fmt;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use rhai::{Dynamic, Engine, FnPtr};

use crate::plugins::{PluginRequest, PluginTable};
use crate::variables::VariableStore;

/// Which execution of a script body is in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// First execution. Only plugin declarations take effect.
    Discovery,

    /// Second execution. Step declarations are registered.
    Registration,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Discovery => "discovery",
            Phase::Registration => "registration",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Run-wide state shared by every script.
#[derive(Clone, Default)]
pub struct HostContext {
    pub variables: VariableStore,
    pub plugins: Rc<RefCell<PluginTable>>,
}

impl HostContext {
    pub fn new(variables: VariableStore, plugins: PluginTable) -> Self {
        Self {
            variables,
            plugins: Rc::new(RefCell::new(plugins)),
        }
    }

    /// Snapshot of every plugin declared so far.
    pub fn plugin_table(&self) -> PluginTable {
        self.plugins.borrow().clone()
    }
}

/// A step declaration waiting to be bound.
pub(crate) struct PendingStep {
    pub pattern: String,
    pub handler: FnPtr,
}

struct HostState {
    phase: Phase,
    pending: Vec<PendingStep>,
}

/// Value returned by `habitable.fail(message)`.
///
/// A step handler returning (or throwing) one of these fails its step with
/// the message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepFailure {
    pub message: String,
}

/// Host API object bound to one script.
#[derive(Clone)]
pub struct Habitable {
    script: PathBuf,
    context: HostContext,
    state: Rc<RefCell<HostState>>,
}

impl Habitable {
    pub fn new(context: HostContext, script: &Path) -> Self {
        Self {
            script: script.to_path_buf(),
            context,
            state: Rc::new(RefCell::new(HostState {
                phase: Phase::Discovery,
                pending: Vec::new(),
            })),
        }
    }

    pub fn phase(&self) -> Phase {
        self.state.borrow().phase
    }

    pub(crate) fn set_phase(&self, phase: Phase) {
        self.state.borrow_mut().phase = phase;
    }

    /// Whether any script of the run has declared a plugin called `name`.
    pub fn knows_plugin(&self, name: &str) -> bool {
        self.context.plugins.borrow().get(name).is_some()
    }

    pub(crate) fn take_pending(&self) -> Vec<PendingStep> {
        std::mem::take(&mut self.state.borrow_mut().pending)
    }

    pub fn pending_steps(&self) -> usize {
        self.state.borrow().pending.len()
    }

    fn get_var(&self, name: &str) -> String {
        self.context.variables.get(name)
    }

    fn set_var(&self, name: &str, value: Dynamic) {
        self.context.variables.set(name, value.to_string());
    }

    fn use_plugin(&self, name: &str, version: &str, location: Option<&str>) -> PluginRequest {
        self.context
            .plugins
            .borrow_mut()
            .declare(name, version, location)
    }

    fn add_step(&self, pattern: &str, handler: FnPtr) {
        let mut state = self.state.borrow_mut();
        match state.phase {
            Phase::Discovery => {
                tracing::trace!(
                    "ignoring step '{}' in {} during discovery",
                    pattern,
                    self.script.display()
                );
            }
            Phase::Registration => {
                tracing::debug!("adding step '{}' from {}", pattern, self.script.display());
                state.pending.push(PendingStep {
                    pattern: pattern.to_string(),
                    handler,
                });
            }
        }
    }

    fn log(&self, message: &str) {
        tracing::info!(script = %self.script.display(), "{}", message);
    }

    fn debug(&self, message: &str) {
        tracing::debug!(script = %self.script.display(), "{}", message);
    }
}

/// Register [`Habitable`] and [`StepFailure`] with an engine.
pub fn register_host_api(engine: &mut Engine) {
    engine
        .register_type_with_name::<Habitable>("Habitable")
        .register_fn("get_var", |h: &mut Habitable, name: &str| h.get_var(name))
        .register_fn("set_var", |h: &mut Habitable, name: &str, value: Dynamic| {
            h.set_var(name, value)
        })
        .register_fn("use_plugin", |h: &mut Habitable, name: &str, version: &str| {
            h.use_plugin(name, version, None);
        })
        .register_fn(
            "use_plugin",
            |h: &mut Habitable, name: &str, version: &str, location: &str| {
                h.use_plugin(name, version, Some(location));
            },
        )
        .register_fn("add_step", |h: &mut Habitable, pattern: &str, handler: FnPtr| {
            h.add_step(pattern, handler)
        })
        .register_fn("fail", |_h: &mut Habitable, message: &str| StepFailure {
            message: message.to_string(),
        })
        .register_fn("log", |h: &mut Habitable, message: &str| h.log(message))
        .register_fn("debug", |h: &mut Habitable, message: &str| h.debug(message))
        .register_fn("phase", |h: &mut Habitable| h.phase().as_str().to_string());

    engine
        .register_type_with_name::<StepFailure>("StepFailure")
        .register_get("message", |f: &mut StepFailure| f.message.clone())
        .register_fn("to_string", |f: &mut StepFailure| f.message.clone());
}
