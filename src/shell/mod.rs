//! Shell command execution.

pub mod command;

pub use command::{execute_streaming, CommandOptions, OutputCallback, OutputLine, ShellExit};
