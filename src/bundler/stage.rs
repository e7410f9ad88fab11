//! Staging of script sources and the cache gate in front of the bundler.

use std::fs;
use std::path::{Path, PathBuf};

use super::Bundler;
use crate::cache::BuildCache;
use crate::config::WorkDirs;
use crate::error::Result;

/// Extension of script sources and compiled scripts.
pub const SCRIPT_EXTENSION: &str = "rhai";

/// Build cache id under which the ordered list of source directories is
/// recorded. `@` keeps it apart from plugin names, which must be valid
/// script identifiers.
pub const SCRIPT_DIRS_ID: &str = "@script-directories";

/// Whether `dir` directly contains at least one script source.
pub fn has_script_sources(dir: &Path) -> std::io::Result<bool> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if entry.file_type()?.is_file() && path.extension().is_some_and(|e| e == SCRIPT_EXTENSION) {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Recursively copy the regular files of `from` into `to`.
pub fn copy_directory(from: &Path, to: &Path) -> Result<()> {
    fs::create_dir_all(to)?;
    for entry in fs::read_dir(from)? {
        let entry = entry?;
        let source = entry.path();
        let target = to.join(entry.file_name());
        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            copy_directory(&source, &target)?;
        } else if file_type.is_file() {
            fs::copy(&source, &target)?;
        } else {
            tracing::debug!("not copying {}, not a regular file", source.display());
        }
    }
    Ok(())
}

/// Bring `work.scripts()` up to date with `source_dirs`.
///
/// Directories that cannot be read or contain no scripts are logged and
/// skipped. When neither the list of directories nor their content changed
/// since the last run and compiled scripts are present, the bundler is not
/// invoked. With no usable directory left the compiled scripts are removed.
/// Returns whether the bundler ran.
pub fn prepare_scripts(
    cache: &BuildCache,
    bundler: &dyn Bundler,
    source_dirs: &[PathBuf],
    work: &WorkDirs,
) -> Result<bool> {
    tracing::debug!("attempting to load scripts from {:?}", source_dirs);

    let mut valid = Vec::new();
    for dir in source_dirs {
        match has_script_sources(dir) {
            Ok(true) => {
                tracing::debug!("directory {} has scripts, adding to loader", dir.display());
                valid.push(dir.clone());
            }
            Ok(false) => {
                tracing::error!(
                    "script directory {} has no supported script files",
                    dir.display()
                );
            }
            Err(e) => {
                tracing::error!("could not read script directory {}: {}", dir.display(), e);
            }
        }
    }

    let dir_list = valid
        .iter()
        .map(|d| d.to_string_lossy())
        .collect::<Vec<_>>()
        .join("\n");
    let set_changed = cache.check_string(SCRIPT_DIRS_ID, &dir_list)?;

    if valid.is_empty() {
        clear_directory(&work.scripts())?;
        return Ok(false);
    }

    let content_changed = cache.check_directories(&valid)?;
    if !content_changed && !set_changed && has_compiled_scripts(&work.scripts()) {
        tracing::info!("scripts unchanged since last run, skipping bundle");
        return Ok(false);
    }
    if set_changed {
        tracing::debug!("script directories differ from the last run");
    }

    tracing::info!("scripts in defined folders have changed, creating a build environment");
    let staging = work.staging();
    if staging.exists() {
        fs::remove_dir_all(&staging)?;
    }
    fs::create_dir_all(&staging)?;

    let mut staged = Vec::with_capacity(valid.len());
    for (idx, dir) in valid.iter().enumerate() {
        let target = staging.join(idx.to_string());
        tracing::debug!("copying {} to {} for build", dir.display(), target.display());
        copy_directory(dir, &target)?;
        staged.push(target);
    }

    let out_dir = work.scripts();
    clear_directory(&out_dir)?;

    bundler.bundle(&staged, &out_dir)?;
    Ok(true)
}

/// Leave `dir` existing and empty.
fn clear_directory(dir: &Path) -> Result<()> {
    if dir.exists() {
        fs::remove_dir_all(dir)?;
    }
    fs::create_dir_all(dir)?;
    Ok(())
}

fn has_compiled_scripts(dir: &Path) -> bool {
    has_script_sources(dir).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundler::CopyBundler;
    use std::cell::Cell;
    use tempfile::TempDir;

    struct CountingBundler {
        calls: Cell<usize>,
    }

    impl Bundler for CountingBundler {
        fn bundle(&self, sources: &[PathBuf], out_dir: &Path) -> Result<()> {
            self.calls.set(self.calls.get() + 1);
            CopyBundler.bundle(sources, out_dir)
        }
    }

    fn setup() -> (TempDir, PathBuf, WorkDirs, BuildCache) {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("_scripts");
        fs::create_dir_all(&source).unwrap();
        fs::write(source.join("steps.rhai"), "let a = 1;").unwrap();
        let work = WorkDirs::new(temp.path());
        work.prepare(false).unwrap();
        let cache = BuildCache::in_dir(&work.build());
        (temp, source, work, cache)
    }

    #[test]
    fn bundles_on_first_run_only() {
        let (_temp, source, work, cache) = setup();
        let bundler = CountingBundler {
            calls: Cell::new(0),
        };

        assert!(prepare_scripts(&cache, &bundler, &[source.clone()], &work).unwrap());
        assert!(!prepare_scripts(&cache, &bundler, &[source], &work).unwrap());
        assert_eq!(bundler.calls.get(), 1);
        assert!(work.scripts().join("0_steps.rhai").exists());
    }

    #[test]
    fn rebundles_after_source_change() {
        let (_temp, source, work, cache) = setup();
        let bundler = CountingBundler {
            calls: Cell::new(0),
        };

        prepare_scripts(&cache, &bundler, &[source.clone()], &work).unwrap();
        fs::write(source.join("steps.rhai"), "let a = 2;").unwrap();
        prepare_scripts(&cache, &bundler, &[source], &work).unwrap();

        assert_eq!(bundler.calls.get(), 2);
        let compiled = fs::read_to_string(work.scripts().join("0_steps.rhai")).unwrap();
        assert_eq!(compiled, "let a = 2;");
    }

    #[test]
    fn rebundles_when_compiled_scripts_are_missing() {
        let (_temp, source, work, cache) = setup();
        let bundler = CountingBundler {
            calls: Cell::new(0),
        };

        prepare_scripts(&cache, &bundler, &[source.clone()], &work).unwrap();
        fs::remove_file(work.scripts().join("0_steps.rhai")).unwrap();
        prepare_scripts(&cache, &bundler, &[source], &work).unwrap();

        assert_eq!(bundler.calls.get(), 2);
    }

    #[test]
    fn skips_missing_and_empty_directories() {
        let (temp, source, work, cache) = setup();
        let empty = temp.path().join("empty");
        fs::create_dir_all(&empty).unwrap();
        let missing = temp.path().join("missing");
        let bundler = CountingBundler {
            calls: Cell::new(0),
        };

        assert!(prepare_scripts(&cache, &bundler, &[missing, empty, source], &work).unwrap());
        assert_eq!(cache.record().unwrap().directories.len(), 1);
    }

    #[test]
    fn nothing_to_do_without_valid_directories() {
        let (temp, _source, work, cache) = setup();
        let bundler = CountingBundler {
            calls: Cell::new(0),
        };

        let ran = prepare_scripts(&cache, &bundler, &[temp.path().join("nope")], &work).unwrap();
        assert!(!ran);
        assert_eq!(bundler.calls.get(), 0);
    }

    fn compiled_names(work: &WorkDirs) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(work.scripts())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn dropping_a_directory_removes_its_compiled_scripts() {
        let (temp, first, work, cache) = setup();
        let second = temp.path().join("more");
        fs::create_dir_all(&second).unwrap();
        fs::write(second.join("more.rhai"), "let b = 1;").unwrap();
        let bundler = CountingBundler {
            calls: Cell::new(0),
        };

        prepare_scripts(&cache, &bundler, &[first.clone(), second], &work).unwrap();
        assert_eq!(compiled_names(&work), vec!["0_steps.rhai", "1_more.rhai"]);

        assert!(prepare_scripts(&cache, &bundler, &[first.clone()], &work).unwrap());
        assert_eq!(compiled_names(&work), vec!["0_steps.rhai"]);
        assert!(!prepare_scripts(&cache, &bundler, &[first], &work).unwrap());
        assert_eq!(bundler.calls.get(), 2);
    }

    #[test]
    fn no_valid_directories_clears_compiled_scripts() {
        let (temp, source, work, cache) = setup();
        let bundler = CountingBundler {
            calls: Cell::new(0),
        };

        prepare_scripts(&cache, &bundler, &[source.clone()], &work).unwrap();
        assert!(!prepare_scripts(&cache, &bundler, &[temp.path().join("gone")], &work).unwrap());
        assert!(compiled_names(&work).is_empty());

        assert!(prepare_scripts(&cache, &bundler, &[source], &work).unwrap());
        assert_eq!(compiled_names(&work), vec!["0_steps.rhai"]);
    }

    #[test]
    fn copy_directory_is_recursive() {
        let temp = TempDir::new().unwrap();
        let from = temp.path().join("from");
        fs::create_dir_all(from.join("a").join("b")).unwrap();
        fs::write(from.join("a").join("b").join("c.rhai"), "c").unwrap();

        copy_directory(&from, &temp.path().join("to")).unwrap();
        assert!(temp.path().join("to/a/b/c.rhai").exists());
    }
}
