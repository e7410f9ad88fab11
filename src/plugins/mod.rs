//! Plugin declaration, vendoring and dynamic loading.
//!
//! Scripts declare plugins during their discovery phase. Every declaration
//! lands in a [`PluginTable`]; once all scripts have been discovered the
//! [`PluginResolver`] turns each request into a local artifact in the vendor
//! directory (fetching or copying it only when the declared location
//! changed), loads it through a [`PluginLoader`] and calls its factory.
//!
//! # Writing a native plugin
//!
//! A native plugin is a `cdylib` built against this crate that implements
//! [`Plugin`] and exports its factory with [`declare_plugin!`](crate::declare_plugin):
//!
//! ```ignore
//! use habitable::plugins::Plugin;
//! use serde_json::Value;
//!
//! #[derive(Default)]
//! struct Greeter;
//!
//! impl Plugin for Greeter {
//!     fn call(&self, method: &str, args: Vec<Value>) -> Result<Value, String> {
//!         match method {
//!             "hello" => Ok(Value::from(format!("hello {}", args[0]))),
//!             other => Err(format!("unknown method {}", other)),
//!         }
//!     }
//! }
//!
//! habitable::declare_plugin!(Greeter::default());
//! ```
//!
//! The factory uses the Rust ABI, so plugins must be built with the same
//! compiler and crate version as the host.

pub mod deferred;
pub mod loader;
pub mod location;
pub mod object;
pub mod request;
pub mod resolver;
pub mod vendor;

pub use deferred::Deferred;
pub use loader::{InProcessLoader, NativeLoader, PluginLoader};
pub use location::{
    default_template, fill_template, host_arch, host_os, Location, DEFAULT_LOCATION_TEMPLATE,
};
pub use object::{
    Plugin, PluginFactory, PluginHandle, PLUGIN_ABI_SYMBOL, PLUGIN_ABI_VERSION, PLUGIN_ENTRYPOINT,
};
pub use request::{PluginRequest, PluginTable};
pub use resolver::{PluginResolver, ResolvedPlugins};
pub use vendor::Vendor;
