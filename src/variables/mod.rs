//! Process-wide variables shared between the host, scripts and step text.
//!
//! The [`VariableStore`] is seeded from the host environment at startup,
//! read and written by scripts through the host API, and used to substitute
//! `{{name}}` placeholders in scenario step text before matching.

pub mod interpolation;
pub mod store;

pub use interpolation::{parse_template, render, Segment};
pub use store::VariableStore;
