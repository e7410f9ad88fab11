//! A minimal behaviour-driven scenario runner.
//!
//! Parses Gherkin `.feature` files, matches each step's text against
//! regular-expression step definitions and reports the outcome as
//! human-readable text, JUnit XML or JSON.

pub mod feature;
pub mod report;
pub mod result;
pub mod runner;

pub use feature::{load_feature, load_features, parse_feature, Feature, Scenario, Step};
pub use report::{format_duration, render, ReportFormat};
pub use result::{FeatureResult, ScenarioResult, StepResult, SuiteReport};
pub use runner::{StepDefinitions, Suite};
