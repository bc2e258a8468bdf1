//! Engine lifecycle state machine.
//!
//! UNSTARTED → RUNNING on the first checkpoint. RUNNING is the steady
//! state; FAULTED is only reachable through a ring overrun under the
//! fault policy, and reset returns either state to UNSTARTED.

use crate::error::{TimerError, TimerResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle states of a timer engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EngineState {
    /// No checkpoint seen yet; no query is running.
    #[default]
    Unstarted,
    /// A query is open between the last checkpoint and the next.
    Running,
    /// A ring overrun was rejected; checkpoints fail until reset.
    Faulted,
}

impl fmt::Display for EngineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unstarted => write!(f, "UNSTARTED"),
            Self::Running => write!(f, "RUNNING"),
            Self::Faulted => write!(f, "FAULTED"),
        }
    }
}

impl EngineState {
    /// Check if a transition to `target` is valid from the current state.
    #[must_use]
    pub fn can_transition_to(&self, target: EngineState) -> bool {
        use EngineState::{Faulted, Running, Unstarted};

        matches!(
            (self, target),
            (Unstarted, Running)
                | (Running, Faulted)
                // Reset
                | (Running, Unstarted)
                | (Faulted, Unstarted)
        )
    }

    /// Attempt to transition to `target`, returning error if invalid.
    ///
    /// # Errors
    ///
    /// Returns [`TimerError::InvalidStateTransition`] if the table forbids it.
    pub fn transition_to(&mut self, target: EngineState) -> TimerResult<()> {
        if self.can_transition_to(target) {
            *self = target;
            Ok(())
        } else {
            Err(TimerError::InvalidStateTransition {
                from: self.to_string(),
                to: target.to_string(),
            })
        }
    }
}
