//! Content-addressed build cache.
//!
//! This module decides whether script sources and plugin declarations have
//! changed since the previous run. Digests are persisted in a single JSON
//! document (`.habitable/build/hashes.json`) so repeated runs can skip
//! rebundling scripts and re-fetching plugin artifacts.

pub mod digest;
pub mod record;
pub mod store;

pub use digest::{digest_directory, digest_string};
pub use record::DigestRecord;
pub use store::{BuildCache, DIGEST_FILE};
