//! The `.habitable` working directory.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Name of the working directory created in the project root.
pub const WORK_DIR_NAME: &str = ".habitable";

/// Layout of the working directory:
///
/// ```text
/// .habitable/
///   build/        digest document and bundler staging area
///   plugins/      vendored plugin artifacts
///   scripts/      compiled scripts loaded at runtime
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkDirs {
    root: PathBuf,
}

impl WorkDirs {
    /// Working directory inside `project_root`.
    pub fn new(project_root: &Path) -> Self {
        Self {
            root: project_root.join(WORK_DIR_NAME),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn build(&self) -> PathBuf {
        self.root.join("build")
    }

    /// Staging area the bundler reads sources from.
    pub fn staging(&self) -> PathBuf {
        self.build().join("scripts")
    }

    pub fn plugins(&self) -> PathBuf {
        self.root.join("plugins")
    }

    pub fn scripts(&self) -> PathBuf {
        self.root.join("scripts")
    }

    /// Create the directory tree, removing any previous one first when
    /// `clean` is set.
    pub fn prepare(&self, clean: bool) -> Result<()> {
        if clean && self.root.exists() {
            tracing::info!("running clean on {}", self.root.display());
            fs::remove_dir_all(&self.root)?;
        }

        tracing::info!("constructing {} directory", self.root.display());
        for dir in [self.build(), self.plugins(), self.scripts()] {
            fs::create_dir_all(&dir)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn prepare_creates_layout() {
        let temp = TempDir::new().unwrap();
        let dirs = WorkDirs::new(temp.path());

        dirs.prepare(false).unwrap();

        assert!(dirs.build().is_dir());
        assert!(dirs.plugins().is_dir());
        assert!(dirs.scripts().is_dir());
        assert!(dirs.root().ends_with(".habitable"));
    }

    #[test]
    fn prepare_keeps_existing_content_without_clean() {
        let temp = TempDir::new().unwrap();
        let dirs = WorkDirs::new(temp.path());
        dirs.prepare(false).unwrap();
        fs::write(dirs.plugins().join("kube.so"), "bin").unwrap();

        dirs.prepare(false).unwrap();
        assert!(dirs.plugins().join("kube.so").exists());
    }

    #[test]
    fn prepare_with_clean_removes_previous_content() {
        let temp = TempDir::new().unwrap();
        let dirs = WorkDirs::new(temp.path());
        dirs.prepare(false).unwrap();
        fs::write(dirs.plugins().join("kube.so"), "bin").unwrap();

        dirs.prepare(true).unwrap();
        assert!(!dirs.plugins().join("kube.so").exists());
        assert!(dirs.plugins().is_dir());
    }
}
