//! Check-and-update operations over the digest document.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::digest::{digest_directory, digest_string};
use super::record::DigestRecord;
use crate::error::Result;

/// File name of the digest document inside the build directory.
pub const DIGEST_FILE: &str = "hashes.json";

/// Answers "has this changed since the last run?" and records the answer.
///
/// Every check loads the document, compares fresh digests against the stored
/// ones, records the fresh digests and rewrites the document once if anything
/// changed. Checks are serialized through an internal lock so concurrent
/// callers never interleave their read-modify-write sequences.
pub struct BuildCache {
    /// Path of the digest document.
    path: PathBuf,
    lock: Mutex<()>,
}

impl BuildCache {
    /// Create a cache backed by the given document path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Create a cache backed by `hashes.json` inside `build_dir`.
    pub fn in_dir(build_dir: &Path) -> Self {
        Self::new(build_dir.join(DIGEST_FILE))
    }

    /// Path of the digest document.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the current record without modifying it.
    pub fn record(&self) -> Result<DigestRecord> {
        let _guard = self.lock.lock().unwrap_or_else(|p| p.into_inner());
        DigestRecord::load(&self.path)
    }

    /// Check whether any of `dirs` is new or has different content.
    ///
    /// All digests are computed before the record is touched, so a directory
    /// that cannot be hashed leaves the document as it was.
    pub fn check_directories<P: AsRef<Path>>(&self, dirs: &[P]) -> Result<bool> {
        let mut fresh = Vec::with_capacity(dirs.len());
        for dir in dirs {
            let dir = dir.as_ref();
            let digest = digest_directory(dir)?;
            tracing::trace!("got hash {} for directory {}", digest, dir.display());
            fresh.push((dir.to_string_lossy().into_owned(), digest));
        }

        tracing::debug!("checking hashes for {} directories", fresh.len());
        self.check_and_update(|record| {
            let mut changed = false;
            for (key, digest) in fresh {
                changed |= record_digest(&mut record.directories, key, digest);
            }
            changed
        })
    }

    /// Check whether the string stored under `id` differs from `content`.
    pub fn check_string(&self, id: &str, content: &str) -> Result<bool> {
        let digest = digest_string(content);
        tracing::trace!("got hash {} for id {}", digest, id);

        self.check_and_update(|record| record_digest(&mut record.files, id.to_string(), digest))
    }

    /// Whether `content` differs from what is recorded under `id`, without
    /// recording anything. Pair with [`commit_string`](Self::commit_string)
    /// once the work the content describes has succeeded.
    pub fn peek_string(&self, id: &str, content: &str) -> Result<bool> {
        let digest = digest_string(content);
        let record = self.record()?;
        Ok(record.files.get(id) != Some(&digest))
    }

    /// Record `content` under `id`.
    pub fn commit_string(&self, id: &str, content: &str) -> Result<()> {
        let digest = digest_string(content);
        self.check_and_update(|record| record_digest(&mut record.files, id.to_string(), digest))
            .map(|_| ())
    }

    fn check_and_update(&self, apply: impl FnOnce(&mut DigestRecord) -> bool) -> Result<bool> {
        let _guard = self.lock.lock().unwrap_or_else(|p| p.into_inner());

        let mut record = DigestRecord::load(&self.path)?;
        let changed = apply(&mut record);

        if changed {
            tracing::debug!("changes in hashes found, updating {}", self.path.display());
            record.save(&self.path)?;
        } else {
            tracing::debug!("no changes found in hashes, continuing");
        }

        Ok(changed)
    }
}

/// Store `digest` under `key`, reporting whether it was new or different.
fn record_digest(
    map: &mut std::collections::BTreeMap<String, String>,
    key: String,
    digest: String,
) -> bool {
    let changed = match map.get(&key) {
        Some(existing) if *existing == digest => false,
        Some(_) => {
            tracing::trace!("{} has been changed", key);
            true
        }
        None => {
            tracing::trace!("{} is newly requested", key);
            true
        }
    };
    map.insert(key, digest);
    changed
}
