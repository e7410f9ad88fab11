//! CLI argument definitions.
//!
//! This module defines the CLI arguments using clap's derive macros.
//! The main entry point is the [`Cli`] struct.

use clap::{ArgAction, Parser};
use std::path::PathBuf;

use crate::config::HabitableConfig;
use crate::suite::ReportFormat;

/// Habitable - run BDD features against scriptable step definitions.
#[derive(Debug, Parser)]
#[command(name = "habitable")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Level of logging verbosity (repeat to increase: -l warn, -ll info, -lll debug, -llll trace)
    #[arg(short = 'l', long = "loglevel", action = ArgAction::Count)]
    pub loglevel: u8,

    /// Clean the .habitable directory before the run
    #[arg(short, long)]
    pub clean: bool,

    /// Report format [default: junit]
    #[arg(short, long, value_enum)]
    pub format: Option<ReportFormat>,

    /// Path to a feature file or directory to run (repeatable) [default: ./features]
    #[arg(short = 't', long = "test")]
    pub tests: Vec<PathBuf>,

    /// Name of the test suite [default: habitable]
    #[arg(short, long)]
    pub name: Option<String>,

    /// Path to a step script directory (repeatable) [default: ./_scripts]
    #[arg(short = 's', long = "extensions")]
    pub extensions: Vec<PathBuf>,

    /// Path to config file (overrides habitable.yml in the project root)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Path to project root (overrides current directory)
    #[arg(long)]
    pub project: Option<PathBuf>,
}

impl Cli {
    /// Settings given on the command line, to be layered over the config file.
    pub fn overrides(&self) -> HabitableConfig {
        HabitableConfig {
            name: self.name.clone(),
            format: self.format,
            tests: self.tests.clone(),
            extensions: self.extensions.clone(),
            ..Default::default()
        }
    }

    /// Log filter selected by `-l` flags, or `None` when none were given.
    pub fn log_filter(&self) -> Option<&'static str> {
        match self.loglevel {
            0 => None,
            1 => Some("habitable=warn"),
            2 => Some("habitable=info"),
            3 => Some("habitable=debug"),
            _ => Some("habitable=trace"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_repeated_flags() {
        let cli = Cli::try_parse_from([
            "habitable", "-lll", "-c", "-f", "pretty", "-t", "a.feature", "-t", "features/",
            "-n", "smoke", "-s", "steps", "-s", "more",
        ])
        .unwrap();

        assert_eq!(cli.loglevel, 3);
        assert!(cli.clean);
        assert_eq!(cli.format, Some(ReportFormat::Pretty));
        assert_eq!(cli.tests.len(), 2);
        assert_eq!(cli.name.as_deref(), Some("smoke"));
        assert_eq!(cli.extensions, vec![PathBuf::from("steps"), PathBuf::from("more")]);
        assert_eq!(cli.log_filter(), Some("habitable=debug"));
    }

    #[test]
    fn no_flags_leaves_settings_unset() {
        let cli = Cli::try_parse_from(["habitable"]).unwrap();
        assert_eq!(cli.log_filter(), None);
        assert_eq!(cli.overrides(), HabitableConfig::default());
    }

    #[test]
    fn loglevel_saturates_at_trace() {
        let cli = Cli::try_parse_from(["habitable", "-llllll"]).unwrap();
        assert_eq!(cli.log_filter(), Some("habitable=trace"));
    }

    #[test]
    fn rejects_unknown_format() {
        assert!(Cli::try_parse_from(["habitable", "-f", "xml"]).is_err());
    }
}
