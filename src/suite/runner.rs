//! Matching steps against registered patterns and running scenarios.

use regex::Regex;
use std::time::Instant;

use chrono::Utc;

use super::feature::{Feature, Scenario, Step};
use super::result::{FeatureResult, ScenarioResult, StepResult, SuiteReport};
use crate::error::{HabitableError, Result};
use crate::steps::{StepBinding, StepHandler, StepOutcome, StepRegistrar, StepStatus};

struct Definition {
    regex: Regex,
    handler: StepHandler,
}

/// Registered step patterns, matched in registration order.
#[derive(Default)]
pub struct StepDefinitions {
    definitions: Vec<Definition>,
}

impl StepDefinitions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Run the first definition matching `text`, or `None` when nothing
    /// matches. Capture groups become the handler's arguments.
    pub fn invoke(&self, text: &str) -> Option<StepOutcome> {
        self.definitions.iter().find_map(|definition| {
            let captures = definition.regex.captures(text)?;
            let args: Vec<String> = captures
                .iter()
                .skip(1)
                .map(|m| m.map(|m| m.as_str().to_string()).unwrap_or_default())
                .collect();
            Some((definition.handler)(&args))
        })
    }
}

impl StepRegistrar for StepDefinitions {
    fn register_step(&mut self, binding: StepBinding) -> Result<()> {
        let (pattern, handler) = binding.into_parts();
        let regex = Regex::new(&pattern).map_err(|e| HabitableError::StepRegistration {
            pattern: pattern.clone(),
            message: e.to_string(),
        })?;
        tracing::trace!("registered step pattern {}", pattern);
        self.definitions.push(Definition { regex, handler });
        Ok(())
    }
}

type BeforeStep<'a> = Box<dyn Fn(&str) -> String + 'a>;

/// A minimal scenario runner.
///
/// # Example
///
/// ```
/// use habitable::steps::{StepBinding, StepOutcome, StepRegistrar};
/// use habitable::suite::{parse_feature, Suite};
/// use std::path::Path;
///
/// let feature = parse_feature(
///     Path::new("greet.feature"),
///     "Feature: Greeting\n  Scenario: Hello\n    Given I greet {{WHO}}\n",
/// )
/// .unwrap();
///
/// let suite = Suite::new("example").before_step(|text| text.replace("{{WHO}}", "world"));
/// let report = suite
///     .run(&[feature], |registrar| {
///         registrar.register_step(StepBinding::new("^I greet (\\w+)$", |args| {
///             if args[0] == "world" {
///                 StepOutcome::Passed
///             } else {
///                 StepOutcome::failed("wrong audience")
///             }
///         }))
///     })
///     .unwrap();
///
/// assert!(report.passed());
/// ```
pub struct Suite<'a> {
    name: String,
    before_step: Option<BeforeStep<'a>>,
}

impl<'a> Suite<'a> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            before_step: None,
        }
    }

    /// Rewrite each step's text before it is matched.
    pub fn before_step<F>(mut self, hook: F) -> Self
    where
        F: Fn(&str) -> String + 'a,
    {
        self.before_step = Some(Box::new(hook));
        self
    }

    /// Run every scenario of `features`.
    ///
    /// `initialize` is the registration entry point. It is called exactly
    /// once, before the first scenario, and its failure ends the run.
    /// Failing scenarios never stop later ones from running.
    pub fn run<F>(&self, features: &[Feature], initialize: F) -> Result<SuiteReport>
    where
        F: FnOnce(&mut dyn StepRegistrar) -> Result<()>,
    {
        let timestamp = Utc::now();
        let started = Instant::now();

        let mut definitions = StepDefinitions::new();
        initialize(&mut definitions)?;
        tracing::info!(
            "running {} features with {} step definitions",
            features.len(),
            definitions.len()
        );

        let features = features
            .iter()
            .map(|feature| self.run_feature(&definitions, feature))
            .collect();

        Ok(SuiteReport {
            name: self.name.clone(),
            timestamp,
            duration_ms: started.elapsed().as_millis() as u64,
            features,
        })
    }

    fn run_feature(&self, definitions: &StepDefinitions, feature: &Feature) -> FeatureResult {
        tracing::info!("feature: {}", feature.name);
        let started = Instant::now();
        let scenarios = feature
            .scenarios
            .iter()
            .map(|scenario| self.run_scenario(definitions, &feature.background, scenario))
            .collect();

        FeatureResult {
            name: feature.name.clone(),
            path: feature.path.clone(),
            duration_ms: started.elapsed().as_millis() as u64,
            scenarios,
        }
    }

    fn run_scenario(
        &self,
        definitions: &StepDefinitions,
        background: &[Step],
        scenario: &Scenario,
    ) -> ScenarioResult {
        tracing::info!("scenario: {}", scenario.name);
        let started = Instant::now();
        let mut steps = Vec::with_capacity(background.len() + scenario.steps.len());
        let mut blocked = false;

        for step in background.iter().chain(&scenario.steps) {
            let text = match &self.before_step {
                Some(hook) => hook(&step.text),
                None => step.text.clone(),
            };

            if blocked {
                steps.push(step_result(step, text, StepStatus::Skipped, None, 0));
                continue;
            }

            let step_started = Instant::now();
            let (status, error) = match definitions.invoke(&text) {
                Some(StepOutcome::Passed) => (StepStatus::Passed, None),
                Some(StepOutcome::Failed(message)) => (StepStatus::Failed, Some(message)),
                None => (
                    StepStatus::Undefined,
                    Some(format!("no step definition matches '{}'", text)),
                ),
            };
            let elapsed = step_started.elapsed().as_millis() as u64;

            match &error {
                Some(message) => {
                    tracing::warn!("{} {} {}: {}", status.display_char(), step.keyword, text, message)
                }
                None => tracing::debug!("{} {} {}", status.display_char(), step.keyword, text),
            }

            blocked = status != StepStatus::Passed;
            steps.push(step_result(step, text, status, error, elapsed));
        }

        ScenarioResult {
            name: scenario.name.clone(),
            line: scenario.line,
            tags: scenario.tags.clone(),
            duration_ms: started.elapsed().as_millis() as u64,
            steps,
        }
    }
}

fn step_result(
    step: &Step,
    text: String,
    status: StepStatus,
    error: Option<String>,
    duration_ms: u64,
) -> StepResult {
    StepResult {
        keyword: step.keyword.clone(),
        text,
        line: step.line,
        status,
        error,
        duration_ms,
    }
}
