//! Turning script source directories into loadable compiled scripts.
//!
//! The bundler itself is an external, idempotent collaborator behind the
//! [`Bundler`] trait. [`prepare_scripts`] decides whether it needs to run at
//! all by asking the build cache whether any source directory changed.

pub mod stage;

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{HabitableError, Result};
use crate::shell::{execute_streaming, CommandOptions, OutputCallback, OutputLine};

pub use stage::{
    copy_directory, has_script_sources, prepare_scripts, SCRIPT_DIRS_ID, SCRIPT_EXTENSION,
};

/// Environment variable carrying the output directory to bundler commands.
pub const OUT_DIR_ENV: &str = "HABITABLE_OUT_DIR";

/// Environment variable carrying the staged source directories.
pub const SOURCES_ENV: &str = "HABITABLE_SOURCES";

/// Produces compiled scripts from staged source directories.
pub trait Bundler {
    /// Compile `sources` into `out_dir`. Success means every script the
    /// sources define is now present in `out_dir`.
    fn bundle(&self, sources: &[PathBuf], out_dir: &Path) -> Result<()>;
}

/// Copies every script of every source directory into the output
/// directory, flattening nested paths.
#[derive(Debug, Default, Clone, Copy)]
pub struct CopyBundler;

impl Bundler for CopyBundler {
    fn bundle(&self, sources: &[PathBuf], out_dir: &Path) -> Result<()> {
        fs::create_dir_all(out_dir)?;

        for (idx, source) in sources.iter().enumerate() {
            let mut scripts = Vec::new();
            collect_scripts(source, source, &mut scripts)?;

            for (relative, path) in scripts {
                let target = out_dir.join(format!("{}_{}", idx, relative.replace('/', "_")));
                tracing::trace!("bundling {} to {}", path.display(), target.display());
                fs::copy(&path, &target)?;
            }
        }

        Ok(())
    }
}

fn collect_scripts(root: &Path, dir: &Path, out: &mut Vec<(String, PathBuf)>) -> Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            collect_scripts(root, &path, out)?;
        } else if file_type.is_file() && path.extension().is_some_and(|e| e == SCRIPT_EXTENSION) {
            let relative = path
                .strip_prefix(root)
                .unwrap_or(&path)
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect::<Vec<_>>()
                .join("/");
            out.push((relative, path));
        }
    }
    Ok(())
}

/// Runs a user supplied shell command to produce scripts.
///
/// The command runs in the staging directory with [`OUT_DIR_ENV`] and
/// [`SOURCES_ENV`] set. Its output is logged at debug level.
#[derive(Debug, Clone)]
pub struct CommandBundler {
    command: String,
}

impl CommandBundler {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }

    pub fn command(&self) -> &str {
        &self.command
    }
}

impl Bundler for CommandBundler {
    fn bundle(&self, sources: &[PathBuf], out_dir: &Path) -> Result<()> {
        fs::create_dir_all(out_dir)?;

        let mut options = CommandOptions {
            cwd: sources
                .first()
                .and_then(|s| s.parent())
                .map(Path::to_path_buf),
            ..Default::default()
        };
        options.env.insert(
            OUT_DIR_ENV.to_string(),
            absolute(out_dir).to_string_lossy().into_owned(),
        );
        if let Ok(joined) = std::env::join_paths(sources.iter().map(|s| absolute(s))) {
            options
                .env
                .insert(SOURCES_ENV.to_string(), joined.to_string_lossy().into_owned());
        }

        tracing::debug!("starting bundler: {}", self.command);
        let callback: OutputCallback = Box::new(|line| match line {
            OutputLine::Stdout(text) => tracing::debug!("{}", text),
            OutputLine::Stderr(text) => tracing::debug!("{}", text),
        });

        let exit = execute_streaming(&self.command, &options, callback)?;
        if !exit.success() {
            tracing::error!("bundler exited with {:?}", exit.code);
            return Err(HabitableError::BundlerFailed {
                command: self.command.clone(),
                code: exit.code,
            });
        }
        tracing::debug!("bundler finished in {:?}", exit.duration);

        Ok(())
    }
}

fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn copy_bundler_flattens_nested_scripts() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("0");
        fs::create_dir_all(source.join("lib")).unwrap();
        fs::write(source.join("steps.rhai"), "1").unwrap();
        fs::write(source.join("lib").join("util.rhai"), "2").unwrap();
        fs::write(source.join("README.md"), "docs").unwrap();
        let out = temp.path().join("out");

        CopyBundler.bundle(&[source], &out).unwrap();

        assert!(out.join("0_steps.rhai").exists());
        assert!(out.join("0_lib_util.rhai").exists());
        assert!(!out.join("0_README.md").exists());
    }

    #[test]
    fn copy_bundler_keeps_same_named_scripts_apart() {
        let temp = TempDir::new().unwrap();
        let first = temp.path().join("0");
        let second = temp.path().join("1");
        fs::create_dir_all(&first).unwrap();
        fs::create_dir_all(&second).unwrap();
        fs::write(first.join("steps.rhai"), "a").unwrap();
        fs::write(second.join("steps.rhai"), "b").unwrap();
        let out = temp.path().join("out");

        CopyBundler.bundle(&[first, second], &out).unwrap();

        assert_eq!(fs::read_to_string(out.join("0_steps.rhai")).unwrap(), "a");
        assert_eq!(fs::read_to_string(out.join("1_steps.rhai")).unwrap(), "b");
    }

    #[test]
    fn command_bundler_reports_exit_status() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("0");
        fs::create_dir_all(&source).unwrap();

        let result = CommandBundler::new("exit 4").bundle(&[source], &temp.path().join("out"));

        assert!(matches!(
            result,
            Err(HabitableError::BundlerFailed { code: Some(4), .. })
        ));
    }

    #[cfg(unix)]
    #[test]
    fn command_bundler_writes_to_out_dir() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("0");
        fs::create_dir_all(&source).unwrap();
        fs::write(source.join("steps.rhai"), "let a = 1;").unwrap();
        let out = temp.path().join("out");

        CommandBundler::new("cp 0/*.rhai \"$HABITABLE_OUT_DIR\"/")
            .bundle(&[source], &out)
            .unwrap();

        assert!(out.join("steps.rhai").exists());
    }
}
