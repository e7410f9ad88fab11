//! Habitable CLI entry point.

use std::io::Write;
use std::process::ExitCode;

use clap::Parser;
use habitable::cli::{Cli, Command, RunCommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the tracing subscriber for logging.
///
/// Log level is controlled by:
/// 1. `-l` flags (repeatable) when given
/// 2. `RUST_LOG` environment variable (if set)
/// 3. Default is ERROR
///
/// Logs go to stderr so stdout carries only the report.
fn init_tracing(filter: Option<&str>) {
    let filter = match filter {
        Some(directive) => EnvFilter::new(directive),
        None => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("habitable=error")),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(filter)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.log_filter());

    tracing::debug!("Habitable starting with args: {:?}", cli);

    let project_root = cli
        .project
        .as_ref()
        .cloned()
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_default());

    let command = RunCommand::new(&project_root, &cli);
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match command.execute(&mut out) {
        Ok(result) => ExitCode::from(result.exit_code as u8),
        Err(e) => {
            let _ = out.flush();
            tracing::error!("{}", e);
            eprintln!("Error: {}", e);
            ExitCode::from(e.exit_code() as u8)
        }
    }
}
