//! The step registry adapter.
//!
//! Scripts hand the core a pattern and a callable; this module turns that
//! pair into what the scenario engine consumes:
//!
//! - [`StepBinding`] - a pattern plus a handler taking the step's textual arguments
//! - [`StepRegistrar`] - the engine's registration surface
//! - [`StepOutcome`] - what a handler reports back (success or failure with a message)
//! - [`coerce`] - turns a textual argument into an integer, boolean or string
//!
//! # Example
//!
//! ```
//! use habitable::steps::{StepBinding, StepOutcome, StepRegistrar};
//!
//! let mut bindings: Vec<StepBinding> = Vec::new();
//! bindings
//!     .register_step(StepBinding::new("^I have (\\d+) cukes$", |args| {
//!         if args[0] == "0" {
//!             StepOutcome::failed("no cukes")
//!         } else {
//!             StepOutcome::Passed
//!         }
//!     }))
//!     .unwrap();
//!
//! assert_eq!(bindings[0].invoke(&["3".to_string()]), StepOutcome::Passed);
//! ```

pub mod binding;
pub mod coerce;

pub use binding::{StepBinding, StepHandler, StepOutcome, StepRegistrar, StepStatus};
pub use coerce::{coerce, StepArgument};
