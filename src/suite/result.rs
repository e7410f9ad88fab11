//! Outcomes of a suite run.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;

use crate::steps::StepStatus;

/// Everything that happened in one run.
#[derive(Debug, Clone, Serialize)]
pub struct SuiteReport {
    pub name: String,

    /// When the run started.
    pub timestamp: DateTime<Utc>,

    /// Total duration in milliseconds.
    pub duration_ms: u64,

    pub features: Vec<FeatureResult>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FeatureResult {
    pub name: String,
    pub path: PathBuf,
    pub duration_ms: u64,
    pub scenarios: Vec<ScenarioResult>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScenarioResult {
    pub name: String,
    pub line: usize,
    pub tags: Vec<String>,
    pub duration_ms: u64,
    pub steps: Vec<StepResult>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StepResult {
    pub keyword: String,

    /// Step text after variable substitution.
    pub text: String,

    pub line: usize,
    pub status: StepStatus,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    pub duration_ms: u64,
}

impl ScenarioResult {
    pub fn passed(&self) -> bool {
        self.steps.iter().all(|s| s.status == StepStatus::Passed)
    }

    /// First step that did not pass, if any.
    pub fn first_problem(&self) -> Option<&StepResult> {
        self.steps
            .iter()
            .find(|s| matches!(s.status, StepStatus::Failed | StepStatus::Undefined))
    }
}

impl FeatureResult {
    pub fn failed_scenarios(&self) -> usize {
        self.scenarios.iter().filter(|s| !s.passed()).count()
    }
}

impl SuiteReport {
    pub fn passed(&self) -> bool {
        self.features
            .iter()
            .all(|f| f.scenarios.iter().all(ScenarioResult::passed))
    }

    pub fn scenario_count(&self) -> usize {
        self.features.iter().map(|f| f.scenarios.len()).sum()
    }

    pub fn failed_scenarios(&self) -> usize {
        self.features.iter().map(FeatureResult::failed_scenarios).sum()
    }

    /// Number of steps with the given status.
    pub fn step_count(&self, status: StepStatus) -> usize {
        self.features
            .iter()
            .flat_map(|f| &f.scenarios)
            .flat_map(|s| &s.steps)
            .filter(|s| s.status == status)
            .count()
    }
}
