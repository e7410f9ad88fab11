//! Vendoring plugin artifacts into the work directory.

use anyhow::{anyhow, Context, Result};
use std::env::consts::DLL_EXTENSION;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::location::Location;

/// Copies or downloads plugin artifacts into a local directory.
///
/// # Example
///
/// ```no_run
/// use habitable::plugins::Vendor;
/// use std::time::Duration;
///
/// let vendor = Vendor::new(".habitable/plugins", Duration::from_secs(60)).unwrap();
/// let artifact = vendor.vendor("kube", "./build/libkube.so", false).unwrap();
/// ```
pub struct Vendor {
    /// Directory artifacts are placed in.
    dir: PathBuf,
    /// HTTP client for remote locations.
    client: reqwest::blocking::Client,
}

impl Vendor {
    /// Create a vendor writing into `dir`, with a request timeout for
    /// remote artifacts.
    pub fn new(dir: impl Into<PathBuf>, timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            dir: dir.into(),
            client,
        })
    }

    /// Directory artifacts are placed in.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path the artifact for `name` is vendored to.
    pub fn artifact_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", name, DLL_EXTENSION))
    }

    /// Make sure the artifact for `name` is present.
    ///
    /// The artifact is (re)acquired from `location` when `changed` is set or
    /// nothing has been vendored yet; otherwise the existing file is reused.
    pub fn vendor(&self, name: &str, location: &str, changed: bool) -> Result<PathBuf> {
        let target = self.artifact_path(name);
        if !changed && target.is_file() {
            tracing::debug!("plugin {} already vendored at {}", name, target.display());
            return Ok(target);
        }

        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create {}", self.dir.display()))?;

        match Location::parse(location) {
            Location::Remote(url) => {
                tracing::info!("downloading plugin {} from {}", name, url);
                let bytes = self.download(url.as_str())?;
                write_atomically(&target, &bytes)?;
            }
            Location::Local(path) => {
                tracing::info!("copying plugin {} from {}", name, path.display());
                let bytes = fs::read(&path)
                    .with_context(|| format!("Failed to read {}", path.display()))?;
                write_atomically(&target, &bytes)?;
            }
        }

        Ok(target)
    }

    fn download(&self, url: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(url)
            .send()
            .with_context(|| format!("Failed to fetch {}", url))?;

        if !response.status().is_success() {
            return Err(anyhow!("HTTP {} fetching {}", response.status(), url));
        }

        let bytes = response
            .bytes()
            .with_context(|| format!("Failed to read response from {}", url))?;
        Ok(bytes.to_vec())
    }
}

fn write_atomically(target: &Path, bytes: &[u8]) -> Result<()> {
    let partial = target.with_extension("part");
    fs::write(&partial, bytes).with_context(|| format!("Failed to write {}", partial.display()))?;
    fs::rename(&partial, target)
        .with_context(|| format!("Failed to move artifact into {}", target.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use tempfile::TempDir;

    fn vendor_in(temp: &TempDir) -> Vendor {
        Vendor::new(temp.path().join("plugins"), Duration::from_secs(10)).unwrap()
    }

    #[test]
    fn artifact_path_uses_platform_extension() {
        let temp = TempDir::new().unwrap();
        let vendor = vendor_in(&temp);
        assert_eq!(
            vendor.artifact_path("kube"),
            temp.path()
                .join("plugins")
                .join(format!("kube.{}", DLL_EXTENSION))
        );
    }

    #[test]
    fn copies_local_artifact() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("libkube.so");
        fs::write(&source, b"native bits").unwrap();

        let vendor = vendor_in(&temp);
        let target = vendor
            .vendor("kube", source.to_str().unwrap(), true)
            .unwrap();

        assert_eq!(fs::read(&target).unwrap(), b"native bits");
        assert!(!target.with_extension("part").exists());
    }

    #[test]
    fn unchanged_present_artifact_is_reused() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("libkube.so");
        fs::write(&source, b"v1").unwrap();
        let vendor = vendor_in(&temp);
        vendor.vendor("kube", source.to_str().unwrap(), true).unwrap();

        fs::write(&source, b"v2").unwrap();
        let target = vendor
            .vendor("kube", source.to_str().unwrap(), false)
            .unwrap();

        assert_eq!(fs::read(target).unwrap(), b"v1");
    }

    #[test]
    fn unchanged_but_missing_artifact_is_acquired() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("libkube.so");
        fs::write(&source, b"v1").unwrap();

        let vendor = vendor_in(&temp);
        let target = vendor
            .vendor("kube", source.to_str().unwrap(), false)
            .unwrap();
        assert!(target.is_file());
    }

    #[test]
    fn missing_local_artifact_is_an_error() {
        let temp = TempDir::new().unwrap();
        let vendor = vendor_in(&temp);
        let err = vendor
            .vendor("kube", temp.path().join("nope.so").to_str().unwrap(), true)
            .unwrap_err();
        assert!(err.to_string().contains("nope.so"));
    }

    #[test]
    fn downloads_remote_artifact() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/v1.0.0/kube.so");
            then.status(200).body("remote bits");
        });

        let temp = TempDir::new().unwrap();
        let vendor = vendor_in(&temp);
        let target = vendor
            .vendor("kube", &server.url("/v1.0.0/kube.so"), true)
            .unwrap();

        mock.assert();
        assert_eq!(fs::read(target).unwrap(), b"remote bits");
    }

    #[test]
    fn remote_404_is_an_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/missing.so");
            then.status(404).body("Not Found");
        });

        let temp = TempDir::new().unwrap();
        let vendor = vendor_in(&temp);
        let err = vendor
            .vendor("kube", &server.url("/missing.so"), true)
            .unwrap_err();

        assert!(err.to_string().contains("404"), "Error should mention 404: {}", err);
        assert!(!vendor.artifact_path("kube").exists());
    }
}
