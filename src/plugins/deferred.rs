//! Results of plugin calls running off the script thread.

use std::fmt;
use std::sync::mpsc::{self, Receiver};
use std::sync::{Arc, Mutex};
use std::thread;

use serde_json::Value;

type Outcome = Result<Value, String>;

enum State {
    Pending(Receiver<Outcome>),
    Settled(Outcome),
}

/// A pending asynchronous computation.
///
/// Step handlers may return a `Deferred`; the step wrapper then blocks until
/// it settles before reporting the step result. Clones observe the same
/// outcome.
#[derive(Clone)]
pub struct Deferred {
    state: Arc<Mutex<State>>,
}

impl Deferred {
    /// Run `work` on a new thread.
    pub fn spawn<F>(work: F) -> Self
    where
        F: FnOnce() -> Outcome + Send + 'static,
    {
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let _ = tx.send(work());
        });
        Self {
            state: Arc::new(Mutex::new(State::Pending(rx))),
        }
    }

    /// Block until the computation settles and return its outcome.
    pub fn wait(&self) -> Outcome {
        let mut state = self.state.lock().unwrap_or_else(|p| p.into_inner());
        if let State::Pending(rx) = &*state {
            let outcome = rx
                .recv()
                .unwrap_or_else(|_| Err("deferred computation panicked".to_string()));
            *state = State::Settled(outcome);
        }
        match &*state {
            State::Settled(outcome) => outcome.clone(),
            State::Pending(_) => Err("deferred computation did not settle".to_string()),
        }
    }

    /// Whether the outcome is already known, without blocking.
    pub fn is_settled(&self) -> bool {
        let mut state = self.state.lock().unwrap_or_else(|p| p.into_inner());
        if let State::Pending(rx) = &*state {
            match rx.try_recv() {
                Ok(outcome) => *state = State::Settled(outcome),
                Err(mpsc::TryRecvError::Empty) => return false,
                Err(mpsc::TryRecvError::Disconnected) => {
                    *state = State::Settled(Err("deferred computation panicked".to_string()))
                }
            }
        }
        true
    }
}

impl fmt::Debug for Deferred {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deferred")
            .field("settled", &self.is_settled())
            .finish()
    }
}
