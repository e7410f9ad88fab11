//! Habitable - behaviour-driven test runner with scriptable step definitions.
//!
//! Feature files written in Gherkin are matched against step definitions
//! registered by Rhai scripts. Scripts may declare native plugins, which
//! are fetched, cached and loaded before any step runs.
//!
//! # Modules
//!
//! - [`bundler`] - Turning script sources into loadable scripts
//! - [`cache`] - Content digests that let runs skip unchanged work
//! - [`cli`] - Command-line interface and the run command
//! - [`config`] - Configuration loading and the working directory layout
//! - [`error`] - Error types, result alias and exit codes
//! - [`plugins`] - Plugin declaration, vendoring and loading
//! - [`scripting`] - The script host and its two-phase lifecycle
//! - [`shell`] - Shell command execution for bundler commands
//! - [`steps`] - Step bindings, outcomes and argument coercion
//! - [`suite`] - Feature parsing, scenario execution and reports
//! - [`variables`] - The shared variable store and `{{NAME}}` substitution
//!
//! # Example
//!
//! ```
//! use habitable::variables::VariableStore;
//!
//! let vars = VariableStore::from_pairs([("ENV".to_string(), "staging".to_string())]);
//! assert_eq!(vars.substitute("deploy to {{ENV}}"), "deploy to staging");
//! ```
//!
//! For full runs, see the integration tests.

pub mod bundler;
pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod plugins;
pub mod scripting;
pub mod shell;
pub mod steps;
pub mod suite;
pub mod variables;

pub use error::{HabitableError, Result};
