//! Rendering suite reports.

use serde::{Deserialize, Serialize};
use std::fmt::Write;
use std::time::Duration;

use super::result::{ScenarioResult, SuiteReport};
use crate::error::Result;
use crate::steps::StepStatus;

/// Output format of the run report.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// Human readable summary.
    Pretty,

    /// JUnit XML.
    #[default]
    Junit,

    /// Machine readable JSON.
    Json,
}

impl std::fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ReportFormat::Pretty => "pretty",
            ReportFormat::Junit => "junit",
            ReportFormat::Json => "json",
        };
        write!(f, "{}", s)
    }
}

/// Render `report` in the requested format.
pub fn render(report: &SuiteReport, format: ReportFormat) -> Result<String> {
    match format {
        ReportFormat::Pretty => Ok(pretty(report)),
        ReportFormat::Junit => Ok(junit(report)),
        ReportFormat::Json => {
            serde_json::to_string_pretty(report).map_err(|e| anyhow::Error::new(e).into())
        }
    }
}

/// Format a duration the way step timings are shown.
pub fn format_duration(d: Duration) -> String {
    let secs = d.as_secs_f64();
    if secs < 1.0 {
        format!("{}ms", d.as_millis())
    } else if secs < 60.0 {
        format!("{:.1}s", secs)
    } else {
        let mins = secs / 60.0;
        format!("{:.1}m", mins)
    }
}

fn pretty(report: &SuiteReport) -> String {
    let mut out = String::new();

    for feature in &report.features {
        let _ = writeln!(out, "Feature: {}", feature.name);
        for scenario in &feature.scenarios {
            let _ = writeln!(out, "\n  Scenario: {}", scenario.name);
            for step in &scenario.steps {
                let _ = writeln!(
                    out,
                    "    {} {} {}",
                    step.status.display_char(),
                    step.keyword,
                    step.text
                );
                if let Some(error) = &step.error {
                    let _ = writeln!(out, "      {}", error);
                }
            }
        }
        out.push('\n');
    }

    let scenarios = report.scenario_count();
    let failed = report.failed_scenarios();
    let _ = writeln!(
        out,
        "{} scenarios ({} passed, {} failed)",
        scenarios,
        scenarios - failed,
        failed
    );
    let _ = writeln!(
        out,
        "{} steps ({} passed, {} failed, {} undefined, {} skipped)",
        report.step_count(StepStatus::Passed)
            + report.step_count(StepStatus::Failed)
            + report.step_count(StepStatus::Undefined)
            + report.step_count(StepStatus::Skipped),
        report.step_count(StepStatus::Passed),
        report.step_count(StepStatus::Failed),
        report.step_count(StepStatus::Undefined),
        report.step_count(StepStatus::Skipped),
    );
    let _ = writeln!(
        out,
        "{}",
        format_duration(Duration::from_millis(report.duration_ms))
    );
    out
}

fn junit(report: &SuiteReport) -> String {
    let (failures, errors) = report
        .features
        .iter()
        .map(|f| problem_counts(&f.scenarios))
        .fold((0, 0), |acc, counts| (acc.0 + counts.0, acc.1 + counts.1));

    let mut out = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    let _ = writeln!(
        out,
        "<testsuites name=\"{}\" tests=\"{}\" failures=\"{}\" errors=\"{}\" time=\"{}\">",
        escape(&report.name),
        report.scenario_count(),
        failures,
        errors,
        seconds(report.duration_ms)
    );

    for feature in &report.features {
        let (failures, errors) = problem_counts(&feature.scenarios);
        let _ = writeln!(
            out,
            "  <testsuite name=\"{}\" tests=\"{}\" failures=\"{}\" errors=\"{}\" time=\"{}\" timestamp=\"{}\">",
            escape(&feature.name),
            feature.scenarios.len(),
            failures,
            errors,
            seconds(feature.duration_ms),
            report.timestamp.to_rfc3339()
        );

        for scenario in &feature.scenarios {
            let status = if scenario.passed() { "passed" } else { "failed" };
            let _ = write!(
                out,
                "    <testcase name=\"{}\" status=\"{}\" time=\"{}\"",
                escape(&scenario.name),
                status,
                seconds(scenario.duration_ms)
            );
            match scenario.first_problem() {
                None => out.push_str("></testcase>\n"),
                Some(step) => {
                    let element = match step.status {
                        StepStatus::Undefined => "error",
                        _ => "failure",
                    };
                    let _ = writeln!(
                        out,
                        ">\n      <{} message=\"Step {}: {}\" type=\"{}\"></{}>\n    </testcase>",
                        element,
                        escape(&step.text),
                        escape(step.error.as_deref().unwrap_or_default()),
                        step.status,
                        element
                    );
                }
            }
        }
        out.push_str("  </testsuite>\n");
    }

    out.push_str("</testsuites>\n");
    out
}

/// Scenarios failed by a step, and scenarios stopped by an undefined step.
fn problem_counts(scenarios: &[ScenarioResult]) -> (usize, usize) {
    scenarios
        .iter()
        .filter_map(|s| s.first_problem().map(|step| step.status))
        .fold((0, 0), |(failures, errors), status| match status {
            StepStatus::Undefined => (failures, errors + 1),
            _ => (failures + 1, errors),
        })
}

fn seconds(ms: u64) -> String {
    format!("{:.3}", ms as f64 / 1000.0)
}

fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            c => escaped.push(c),
        }
    }
    escaped
}
