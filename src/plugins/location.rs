//! Plugin location templates.
//!
//! A location is either a network URL or a local path. It may contain
//! positional `{}` placeholders that are filled, in order, with the declared
//! version, the host operating system and the host architecture. The named
//! placeholders `{name}` and `{ext}` are replaced with the plugin name and
//! the platform's dynamic library extension.

use std::env::consts::{ARCH, DLL_EXTENSION, OS};
use std::path::PathBuf;

use reqwest::Url;

/// Template used when a plugin is declared without a location.
pub const DEFAULT_LOCATION_TEMPLATE: &str =
    "https://github.com/marmotherder/habitable-plugins/releases/download/v{}/{name}_{}_{}.{ext}";

/// Host operating system identifier, as used in artifact names.
pub fn host_os() -> &'static str {
    OS
}

/// Host architecture identifier, as used in artifact names.
pub fn host_arch() -> &'static str {
    ARCH
}

/// Template for a plugin declared without an explicit location.
///
/// `configured` overrides the built-in template, typically from
/// `plugins.default_location` in `habitable.yml`.
pub fn default_template(configured: Option<&str>) -> &str {
    configured.unwrap_or(DEFAULT_LOCATION_TEMPLATE)
}

/// Fill a location template for a plugin.
///
/// Positional placeholders beyond the third are left untouched.
pub fn fill_template(template: &str, name: &str, version: &str) -> String {
    let named = template
        .replace("{name}", name)
        .replace("{ext}", DLL_EXTENSION);

    let values = [version, host_os(), host_arch()];
    let mut filled = String::with_capacity(named.len());
    let mut rest = named.as_str();
    let mut next = 0;

    while let Some(index) = rest.find("{}") {
        if next == values.len() {
            break;
        }
        filled.push_str(&rest[..index]);
        filled.push_str(values[next]);
        rest = &rest[index + 2..];
        next += 1;
    }
    filled.push_str(rest);
    filled
}

/// Where a plugin artifact comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    /// Downloaded over HTTP(S).
    Remote(Url),

    /// Copied from the local filesystem.
    Local(PathBuf),
}

impl Location {
    /// Classify a filled location string.
    ///
    /// Only `http` and `https` URLs are network locations; `file://` URLs are
    /// converted to paths and anything else is taken as a path verbatim.
    pub fn parse(location: &str) -> Self {
        match Url::parse(location) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => Location::Remote(url),
            Ok(url) if url.scheme() == "file" => match url.to_file_path() {
                Ok(path) => Location::Local(path),
                Err(()) => Location::Local(PathBuf::from(location)),
            },
            _ => Location::Local(PathBuf::from(location)),
        }
    }

    /// Whether the artifact must be fetched over the network.
    pub fn is_remote(&self) -> bool {
        matches!(self, Location::Remote(_))
    }
}
