//! The script runtime bridge.
//!
//! Every compiled `.rhai` script gets its own Rhai engine and scope and is
//! driven through a fixed lifecycle:
//!
//! 1. **Discovery** ([`ScriptUnit::load`]): the body runs once. Plugin
//!    declarations (`habitable.use_plugin`) are recorded; step declarations
//!    (`habitable.add_step`) are ignored.
//! 2. **Binding** ([`ScriptUnit::bind_plugins`]): every resolved plugin is
//!    injected into the script's scope under its declared name.
//! 3. **Registration** ([`ScriptUnit::run`]): the same body runs again in the
//!    same scope. This time step declarations are bound and handed to the
//!    scenario engine.
//!
//! Because the body runs twice, top-level side effects in scripts must be
//! idempotent. Scripts can check `habitable.phase()` when they are not.
//!
//! # Host API
//!
//! | Call | Effect |
//! |------|--------|
//! | `habitable.get_var(name)` | Variable value, `""` when unset |
//! | `habitable.set_var(name, value)` | Set a variable |
//! | `habitable.use_plugin(name, version[, location])` | Declare a plugin |
//! | `habitable.add_step(pattern, handler)` | Declare a step |
//! | `habitable.fail(message)` | Failure value for step handlers |
//! | `habitable.log(message)` / `habitable.debug(message)` | Log through the host |
//! | `habitable.phase()` | `"discovery"` or `"registration"` |
//!
//! Plugins expose `invoke(method[, args])` and `spawn(method[, args])`; the
//! latter returns a deferred result that step handlers may return directly.

pub mod bridge;
pub mod handler;
pub mod host;
pub mod objects;
pub mod unit;

pub use bridge::ScriptBridge;
pub use handler::interpret;
pub use host::{register_host_api, Habitable, HostContext, Phase, StepFailure};
pub use objects::{register_plugin_api, PluginObject};
pub use unit::{ScriptUnit, UnitState, HOST_OBJECT};
