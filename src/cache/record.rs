//! The persisted digest document.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::error::{HabitableError, Result};

/// Digests recorded by previous runs.
///
/// `files` holds digests of arbitrary identified strings (plugin locations),
/// `directories` holds digests of script source trees keyed by the path the
/// caller asked about.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DigestRecord {
    #[serde(default)]
    pub files: BTreeMap<String, String>,

    #[serde(default)]
    pub directories: BTreeMap<String, String>,
}

impl DigestRecord {
    /// Load the record from disk. A missing document is an empty record.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        tracing::debug!("opening {}", path.display());
        let content = fs::read_to_string(path).map_err(|e| HabitableError::CacheDocument {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let record: Self =
            serde_json::from_str(&content).map_err(|e| HabitableError::CacheDocument {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

        tracing::trace!(
            files = record.files.len(),
            directories = record.directories.len(),
            "digest record loaded"
        );
        Ok(record)
    }

    /// Save the record using write-to-temp-then-rename so the document is
    /// never observed half written.
    pub fn save(&self, path: &Path) -> Result<()> {
        let document_error = |message: String| HabitableError::CacheDocument {
            path: path.to_path_buf(),
            message,
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| document_error(e.to_string()))?;
        }

        let content = serde_json::to_string_pretty(self).map_err(|e| document_error(e.to_string()))?;

        let temp_path = path.with_extension("json.tmp");
        fs::write(&temp_path, &content).map_err(|e| document_error(e.to_string()))?;
        fs::rename(&temp_path, path).map_err(|e| document_error(e.to_string()))?;

        tracing::debug!("{} updated", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_document_is_empty() {
        let temp = TempDir::new().unwrap();
        let record = DigestRecord::load(&temp.path().join("hashes.json")).unwrap();
        assert_eq!(record, DigestRecord::default());
    }

    #[test]
    fn save_then_load_yields_identical_record() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("build").join("hashes.json");

        let mut record = DigestRecord::default();
        record.files.insert("kube".into(), "abc".into());
        record.files.insert("aws".into(), "def".into());
        record
            .directories
            .insert("./_scripts".into(), "h1:0123".into());

        record.save(&path).unwrap();
        let loaded = DigestRecord::load(&path).unwrap();

        assert_eq!(loaded, record);
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn corrupt_document_is_an_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("hashes.json");
        fs::write(&path, "{ not json").unwrap();

        let result = DigestRecord::load(&path);
        assert!(matches!(
            result,
            Err(HabitableError::CacheDocument { .. })
        ));
    }

    #[test]
    fn partial_document_defaults_missing_maps() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("hashes.json");
        fs::write(&path, r#"{"files": {"x": "1"}}"#).unwrap();

        let record = DigestRecord::load(&path).unwrap();
        assert_eq!(record.files.get("x"), Some(&"1".to_string()));
        assert!(record.directories.is_empty());
    }
}
