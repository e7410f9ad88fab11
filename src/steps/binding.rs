//! Step bindings and the registration surface.

use serde::Serialize;
use std::fmt;

use crate::error::Result;

/// What a step handler reports back to the scenario engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Passed,
    Failed(String),
}

impl StepOutcome {
    pub fn failed(message: impl Into<String>) -> Self {
        StepOutcome::Failed(message.into())
    }

    pub fn is_passed(&self) -> bool {
        matches!(self, StepOutcome::Passed)
    }
}

/// Handler invoked with the step's captured arguments.
pub type StepHandler = Box<dyn Fn(&[String]) -> StepOutcome>;

/// A pattern and the handler it triggers.
///
/// Created per step declaration during the registration phase and handed
/// straight to a [`StepRegistrar`].
pub struct StepBinding {
    pub pattern: String,
    handler: StepHandler,
}

impl StepBinding {
    pub fn new<F>(pattern: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&[String]) -> StepOutcome + 'static,
    {
        Self {
            pattern: pattern.into(),
            handler: Box::new(handler),
        }
    }

    /// Run the handler.
    pub fn invoke(&self, args: &[String]) -> StepOutcome {
        (self.handler)(args)
    }

    /// Split into pattern and handler.
    pub fn into_parts(self) -> (String, StepHandler) {
        (self.pattern, self.handler)
    }
}

impl fmt::Debug for StepBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepBinding")
            .field("pattern", &self.pattern)
            .finish_non_exhaustive()
    }
}

/// The scenario engine's step registration API.
pub trait StepRegistrar {
    fn register_step(&mut self, binding: StepBinding) -> Result<()>;
}

/// Collects bindings without matching them.
impl StepRegistrar for Vec<StepBinding> {
    fn register_step(&mut self, binding: StepBinding) -> Result<()> {
        self.push(binding);
        Ok(())
    }
}

/// Status of a step within a scenario run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    /// Handler reported success.
    Passed,

    /// Handler reported failure or raised an error.
    Failed,

    /// No registered pattern matched the step text.
    Undefined,

    /// Not run because an earlier step in the scenario did not pass.
    Skipped,
}

impl StepStatus {
    /// Get a display character for this status.
    pub fn display_char(&self) -> char {
        match self {
            StepStatus::Passed => '✓',
            StepStatus::Failed => '✗',
            StepStatus::Undefined => '?',
            StepStatus::Skipped => '⊘',
        }
    }
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StepStatus::Passed => "passed",
            StepStatus::Failed => "failed",
            StepStatus::Undefined => "undefined",
            StepStatus::Skipped => "skipped",
        };
        write!(f, "{}", s)
    }
}
