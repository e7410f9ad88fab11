//! Argument coercion for step handlers.

use std::fmt;

/// A step argument after coercion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepArgument {
    Integer(i64),
    Boolean(bool),
    Text(String),
}

impl fmt::Display for StepArgument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepArgument::Integer(i) => write!(f, "{}", i),
            StepArgument::Boolean(b) => write!(f, "{}", b),
            StepArgument::Text(s) => write!(f, "{}", s),
        }
    }
}

/// Coerce step text into the most specific argument type.
///
/// Integers are tried first, then booleans; anything else stays a string.
/// Accepted boolean spellings are `t`, `T`, `true`, `TRUE`, `True` and the
/// matching `false` forms.
pub fn coerce(text: &str) -> StepArgument {
    if let Ok(i) = text.parse::<i64>() {
        return StepArgument::Integer(i);
    }

    match text {
        "t" | "T" | "true" | "TRUE" | "True" => StepArgument::Boolean(true),
        "f" | "F" | "false" | "FALSE" | "False" => StepArgument::Boolean(false),
        _ => StepArgument::Text(text.to_string()),
    }
}
