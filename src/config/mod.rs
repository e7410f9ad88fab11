//! Configuration for a Habitable run.
//!
//! This module handles all aspects of configuration:
//! - Schema definitions in [`schema`]
//! - File discovery and loading in [`loader`]
//! - The `.habitable` working directory layout in [`paths`]
//!
//! # Example
//!
//! ```
//! use habitable::config::{load_config, RunSettings};
//! use tempfile::TempDir;
//! use std::fs;
//!
//! let temp = TempDir::new().unwrap();
//! fs::write(temp.path().join("habitable.yml"), "name: smoke").unwrap();
//!
//! let config = load_config(temp.path(), None).unwrap();
//! let settings = RunSettings::from_config(config);
//! assert_eq!(settings.name, "smoke");
//! ```
//!
//! # Precedence
//!
//! Command-line flags override `habitable.yml`, which overrides built-in
//! defaults.

pub mod loader;
pub mod paths;
pub mod schema;

pub use loader::{find_config, load_config, load_config_file, parse_config, CONFIG_FILE_NAMES};
pub use paths::WorkDirs;
pub use schema::{
    BundlerConfig, HabitableConfig, PluginSettings, RunSettings, DEFAULT_FEATURE_DIR,
    DEFAULT_SCRIPT_DIR, DEFAULT_SUITE_NAME,
};
