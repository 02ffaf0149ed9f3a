//! Per-action state tracking for suspending front-end actions.
//!
//! A second submission of an action that is still in flight is rejected
//! with [`SessionError::Busy`] instead of racing the first one.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use tracing::trace;

use super::SessionError;

/// Front-end actions that suspend on I/O.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    Lookup,
    Export,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Lookup => "lookup",
            Self::Export => "export",
        };
        write!(f, "{label}")
    }
}

/// Lifecycle of one action kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActionState {
    #[default]
    Idle,
    InFlight,
    Done,
    Failed,
}

/// Shared state table for all action kinds.
///
/// Clones share the same table.
#[derive(Debug, Clone, Default)]
pub struct ActionTracker {
    states: Arc<Mutex<HashMap<ActionKind, ActionState>>>,
}

impl ActionTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state of `kind`.
    #[must_use]
    pub fn state(&self, kind: ActionKind) -> ActionState {
        self.states
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&kind)
            .copied()
            .unwrap_or_default()
    }

    /// Marks `kind` in flight and returns a guard that resolves it.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Busy`] if `kind` is already in flight.
    pub fn begin(&self, kind: ActionKind) -> Result<ActionGuard, SessionError> {
        let mut states = self.states.lock().unwrap_or_else(PoisonError::into_inner);
        let state = states.entry(kind).or_default();
        if *state == ActionState::InFlight {
            return Err(SessionError::Busy(kind));
        }
        *state = ActionState::InFlight;
        trace!(%kind, "Action in flight");
        Ok(ActionGuard {
            tracker: self.clone(),
            kind,
            resolved: false,
        })
    }

    fn set(&self, kind: ActionKind, state: ActionState) {
        self.states
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(kind, state);
        trace!(%kind, ?state, "Action resolved");
    }
}

/// Resolves an in-flight action.
///
/// Dropping the guard without calling [`ActionGuard::succeed`] or
/// [`ActionGuard::fail`] (for example when the future is cancelled) marks
/// the action `Failed`.
#[derive(Debug)]
pub struct ActionGuard {
    tracker: ActionTracker,
    kind: ActionKind,
    resolved: bool,
}

impl ActionGuard {
    pub fn succeed(mut self) {
        self.resolve(ActionState::Done);
    }

    pub fn fail(mut self) {
        self.resolve(ActionState::Failed);
    }

    /// Resolves according to `result`.
    pub fn finish<T, E>(self, result: &Result<T, E>) {
        if result.is_ok() {
            self.succeed();
        } else {
            self.fail();
        }
    }

    fn resolve(&mut self, state: ActionState) {
        self.resolved = true;
        self.tracker.set(self.kind, state);
    }
}

impl Drop for ActionGuard {
    fn drop(&mut self) {
        if !self.resolved {
            self.resolve(ActionState::Failed);
        }
    }
}
