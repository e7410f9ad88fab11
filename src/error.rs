//! Error types for Habitable operations.
//!
//! This module defines [`HabitableError`], the primary error type used
//! throughout the application, and a [`Result`] type alias for convenience.
//!
//! # Error Handling Strategy
//!
//! - Setup and filesystem errors (cache document, vendor directory, script
//!   files, configuration) end the run with [`SETUP_ERROR`]
//! - Plugin resolution and script loading errors end the run with
//!   [`SCRIPT_SETUP_ERROR`]
//! - Step failures are never errors at this level: they are reported by the
//!   suite as failed scenarios and the run continues
//! - Use `anyhow::Error` (via `HabitableError::Other`) for unexpected errors

use std::path::PathBuf;
use thiserror::Error;

/// Exit code for setup and filesystem failures.
pub const SETUP_ERROR: i32 = 1;

/// Exit code for script and plugin setup failures.
pub const SCRIPT_SETUP_ERROR: i32 = 2;

/// Core error type for Habitable operations.
#[derive(Debug, Error)]
pub enum HabitableError {
    /// The digest document could not be read, parsed or written.
    #[error("Build cache document {path}: {message}")]
    CacheDocument { path: PathBuf, message: String },

    /// A directory could not be walked or hashed.
    #[error("Failed to hash {path}: {message}")]
    Digest { path: PathBuf, message: String },

    /// A declared plugin could not be fetched, vendored or loaded.
    #[error("Failed to resolve plugin '{plugin}': {message}")]
    PluginResolution { plugin: String, message: String },

    /// A compiled script could not be read or parsed.
    #[error("Failed to load script {path}: {message}")]
    ScriptLoad { path: PathBuf, message: String },

    /// A script body raised an error while executing.
    #[error("Script {path} failed: {message}")]
    ScriptExecution { path: PathBuf, message: String },

    /// A script was driven out of order through its lifecycle.
    #[error("Script {path} cannot move from {from} to {to}")]
    InvalidTransition {
        path: PathBuf,
        from: &'static str,
        to: &'static str,
    },

    /// The script bundler exited unsuccessfully.
    #[error("Bundler failed with exit code {code:?}: {command}")]
    BundlerFailed { command: String, code: Option<i32> },

    /// Invalid or unreadable configuration.
    #[error("Invalid configuration at {path}: {message}")]
    Config { path: PathBuf, message: String },

    /// A feature file could not be parsed.
    #[error("{path}:{line}: {message}")]
    FeatureParse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    /// A step pattern was rejected by the scenario engine.
    #[error("Cannot register step '{pattern}': {message}")]
    StepRegistration { pattern: String, message: String },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic wrapped error for anyhow interop.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl HabitableError {
    /// Process exit code used when this error terminates a run.
    pub fn exit_code(&self) -> i32 {
        match self {
            HabitableError::PluginResolution { .. }
            | HabitableError::ScriptLoad { .. }
            | HabitableError::ScriptExecution { .. }
            | HabitableError::InvalidTransition { .. }
            | HabitableError::StepRegistration { .. } => SCRIPT_SETUP_ERROR,
            _ => SETUP_ERROR,
        }
    }
}

/// Result type alias for Habitable operations.
pub type Result<T> = std::result::Result<T, HabitableError>;
