//! Wrapping script callables as step handlers.

use std::rc::Rc;

use rhai::{Dynamic, Engine, EvalAltResult, FnPtr, AST};

use super::host::StepFailure;
use crate::plugins::Deferred;
use crate::steps::{coerce, StepArgument, StepBinding, StepOutcome};

/// Build the binding for a step declared during registration.
///
/// Each textual argument is coerced before the callable runs; the callable's
/// result is then mapped onto a [`StepOutcome`], waiting on deferred
/// results first.
pub(crate) fn bind_step(
    engine: Rc<Engine>,
    ast: Rc<AST>,
    pattern: String,
    handler: FnPtr,
) -> StepBinding {
    StepBinding::new(pattern, move |args| {
        let args: Vec<Dynamic> = args.iter().map(|arg| to_dynamic(coerce(arg))).collect();
        interpret(handler.call::<Dynamic>(&engine, &ast, args))
    })
}

fn to_dynamic(argument: StepArgument) -> Dynamic {
    match argument {
        StepArgument::Integer(i) => Dynamic::from(i),
        StepArgument::Boolean(b) => Dynamic::from(b),
        StepArgument::Text(s) => Dynamic::from(s),
    }
}

/// Map a handler's result onto the step contract.
///
/// Raised errors and [`StepFailure`] values fail the step. A [`Deferred`]
/// blocks until it settles. Any other value passes.
pub fn interpret(result: Result<Dynamic, Box<EvalAltResult>>) -> StepOutcome {
    match result {
        Ok(value) => settle(value.flatten()),
        Err(err) => match root_cause(*err) {
            EvalAltResult::ErrorRuntime(value, _) => {
                let value = value.flatten();
                match settle(value.clone()) {
                    StepOutcome::Passed => StepOutcome::failed(value.to_string()),
                    failed => failed,
                }
            }
            other => StepOutcome::failed(other.to_string()),
        },
    }
}

/// Strip the call frames Rhai wraps around errors raised inside functions.
fn root_cause(mut err: EvalAltResult) -> EvalAltResult {
    while let EvalAltResult::ErrorInFunctionCall(_, _, inner, _) = err {
        err = *inner;
    }
    err
}

fn settle(value: Dynamic) -> StepOutcome {
    if value.is::<StepFailure>() {
        let failure = value.cast::<StepFailure>();
        return StepOutcome::Failed(failure.message);
    }

    if value.is::<Deferred>() {
        let deferred = value.cast::<Deferred>();
        return match deferred.wait() {
            Ok(_) => StepOutcome::Passed,
            Err(message) => StepOutcome::Failed(message),
        };
    }

    StepOutcome::Passed
}
