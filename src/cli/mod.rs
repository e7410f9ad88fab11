//! Command-line interface for Habitable.
//!
//! - [`args`] - Argument definitions using clap derive macros
//! - [`command`] - The [`Command`] trait and [`CommandResult`]
//! - [`run`] - The run command

pub mod args;
pub mod command;
pub mod run;

pub use args::Cli;
pub use command::{Command, CommandResult};
pub use run::RunCommand;
