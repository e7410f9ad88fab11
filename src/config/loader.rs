//! Configuration file discovery and loading.

use crate::config::schema::HabitableConfig;
use crate::error::{HabitableError, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// File names looked up in the project root, in order.
pub const CONFIG_FILE_NAMES: &[&str] = &["habitable.yml", "habitable.yaml"];

/// Find the project config file, if one exists.
pub fn find_config(project_root: &Path) -> Option<PathBuf> {
    CONFIG_FILE_NAMES
        .iter()
        .map(|name| project_root.join(name))
        .find(|path| path.is_file())
}

/// Load a single config file.
///
/// # Errors
///
/// Returns `Config` if the file is missing or the YAML is invalid.
pub fn load_config_file(path: &Path) -> Result<HabitableConfig> {
    let content = fs::read_to_string(path).map_err(|e| HabitableError::Config {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    parse_config(&content, path)
}

/// Parse YAML content into a [`HabitableConfig`].
///
/// An empty document is an empty configuration.
pub fn parse_config(content: &str, source_path: &Path) -> Result<HabitableConfig> {
    if content.trim().is_empty() {
        return Ok(HabitableConfig::default());
    }

    serde_yaml::from_str(content).map_err(|e| HabitableError::Config {
        path: source_path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Load the configuration for a project.
///
/// An explicit path must exist. Without one, `habitable.yml` in the project
/// root is used when present and an empty configuration otherwise.
pub fn load_config(project_root: &Path, explicit: Option<&Path>) -> Result<HabitableConfig> {
    match explicit {
        Some(path) => {
            tracing::debug!("loading config from {}", path.display());
            load_config_file(path)
        }
        None => match find_config(project_root) {
            Some(path) => {
                tracing::debug!("loading config from {}", path.display());
                load_config_file(&path)
            }
            None => {
                tracing::debug!("no config file found, using defaults");
                Ok(HabitableConfig::default())
            }
        },
    }
}
