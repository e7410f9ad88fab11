//! Content digests for directory trees and strings.
//!
//! Directory digests only depend on file names and file contents. Only
//! regular files count; symlinks are never followed. Files are
//! visited in sorted order of their `/`-separated relative path and each
//! contributes a `"<sha256>  <path>\n"` line to a summary, whose own SHA-256
//! is the directory digest.

use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{HabitableError, Result};

/// Prefix identifying the directory digest scheme.
const DIR_DIGEST_PREFIX: &str = "h1:";

/// Digest a string.
pub fn digest_string(content: &str) -> String {
    hex::encode(Sha256::digest(content.as_bytes()))
}

/// Digest every regular file below `dir`.
pub fn digest_directory(dir: &Path) -> Result<String> {
    let mut files = Vec::new();
    collect_files(dir, dir, &mut files)?;
    files.sort_by(|a, b| a.0.cmp(&b.0));

    let mut summary = String::new();
    for (relative, full) in &files {
        let content = fs::read(full).map_err(|e| HabitableError::Digest {
            path: full.clone(),
            message: e.to_string(),
        })?;
        summary.push_str(&hex::encode(Sha256::digest(&content)));
        summary.push_str("  ");
        summary.push_str(relative);
        summary.push('\n');
    }

    Ok(format!(
        "{}{}",
        DIR_DIGEST_PREFIX,
        hex::encode(Sha256::digest(summary.as_bytes()))
    ))
}

fn collect_files(root: &Path, dir: &Path, out: &mut Vec<(String, PathBuf)>) -> Result<()> {
    let entries = fs::read_dir(dir).map_err(|e| HabitableError::Digest {
        path: dir.to_path_buf(),
        message: e.to_string(),
    })?;

    for entry in entries {
        let entry = entry?;
        let path = entry.path();
        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            collect_files(root, &path, out)?;
        } else if !file_type.is_file() {
            tracing::trace!("skipping {}, not a regular file", path.display());
        } else {
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
