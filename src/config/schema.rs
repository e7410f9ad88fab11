//! Configuration schema definitions.
//!
//! This module contains the struct definitions that map to the
//! `habitable.yml` file format, and the fully resolved [`RunSettings`].

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::suite::ReportFormat;

/// Default suite name.
pub const DEFAULT_SUITE_NAME: &str = "habitable";

/// Default script source directory.
pub const DEFAULT_SCRIPT_DIR: &str = "./_scripts";

/// Default location of feature files.
pub const DEFAULT_FEATURE_DIR: &str = "./features";

/// Root configuration structure for habitable.yml
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HabitableConfig {
    /// Name of the test suite
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Report format
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<ReportFormat>,

    /// Feature files or directories to run
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tests: Vec<PathBuf>,

    /// Script source directories
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extensions: Vec<PathBuf>,

    /// Script bundler settings
    pub bundler: BundlerConfig,

    /// Plugin settings
    pub plugins: PluginSettings,
}

/// How compiled scripts are produced from source directories.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BundlerConfig {
    /// Shell command producing scripts into `$HABITABLE_OUT_DIR`.
    /// When absent, sources are copied as-is.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
}

/// Plugin resolution settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PluginSettings {
    /// Location template used when a declaration omits one.
    /// `{name}` is replaced by the plugin name before positional filling.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_location: Option<String>,
}

impl HabitableConfig {
    /// Layer `overrides` on top of `self`. Set values in `overrides` win.
    pub fn merge(mut self, overrides: HabitableConfig) -> Self {
        if overrides.name.is_some() {
            self.name = overrides.name;
        }
        if overrides.format.is_some() {
            self.format = overrides.format;
        }
        if !overrides.tests.is_empty() {
            self.tests = overrides.tests;
        }
        if !overrides.extensions.is_empty() {
            self.extensions = overrides.extensions;
        }
        if overrides.bundler.command.is_some() {
            self.bundler.command = overrides.bundler.command;
        }
        if overrides.plugins.default_location.is_some() {
            self.plugins.default_location = overrides.plugins.default_location;
        }
        self
    }
}

/// Fully resolved settings for a run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSettings {
    pub name: String,
    pub format: ReportFormat,
    pub tests: Vec<PathBuf>,
    pub extensions: Vec<PathBuf>,
    pub bundler_command: Option<String>,
    pub default_plugin_location: Option<String>,
}

impl RunSettings {
    /// Apply defaults to anything the configuration left unset.
    pub fn from_config(config: HabitableConfig) -> Self {
        let extensions = if config.extensions.is_empty() {
            vec![PathBuf::from(DEFAULT_SCRIPT_DIR)]
        } else {
            config.extensions
        };

        let tests = if config.tests.is_empty() {
            vec![PathBuf::from(DEFAULT_FEATURE_DIR)]
        } else {
            config.tests
        };

        Self {
            name: config
                .name
                .unwrap_or_else(|| DEFAULT_SUITE_NAME.to_string()),
            format: config.format.unwrap_or_default(),
            tests,
            extensions,
            bundler_command: config.bundler.command,
            default_plugin_location: config.plugins.default_location,
        }
    }
}
