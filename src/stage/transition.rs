//! Transition requests and their outcomes.

use crate::core::{GateVerdict, Marker};
use crate::error::StageError;

/// Where a transition is headed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransitionTarget<M> {
    Step(M),
    Next,
    Previous,
}

/// Flag-style transition request, as the rendering layer phrases it.
///
/// Exactly one of `step`, `next` and `prev` must be set.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TransitionQuery<M> {
    pub step: Option<M>,
    pub next: bool,
    pub prev: bool,
}

impl<M: Marker> TransitionQuery<M> {
    pub fn step(marker: M) -> Self {
        Self {
            step: Some(marker),
            next: false,
            prev: false,
        }
    }

    pub fn next() -> Self {
        Self {
            step: None,
            next: true,
            prev: false,
        }
    }

    pub fn prev() -> Self {
        Self {
            step: None,
            next: false,
            prev: true,
        }
    }

    pub fn resolve(&self) -> Result<TransitionTarget<M>, StageError> {
        match (self.step, self.next, self.prev) {
            (Some(step), false, false) => Ok(TransitionTarget::Step(step)),
            (None, true, false) => Ok(TransitionTarget::Next),
            (None, false, true) => Ok(TransitionTarget::Previous),
            (None, false, false) => Err(StageError::InvalidArgument(
                "transition query names no target; set one of step, next or prev".to_string(),
            )),
            _ => Err(StageError::InvalidArgument(format!(
                "transition query is ambiguous (step: {:?}, next: {}, prev: {})",
                self.step.map(|m| m.name()),
                self.next,
                self.prev
            ))),
        }
    }
}

/// Result of a transition attempt that did not fail hard.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransitionOutcome<M> {
    /// The current marker changed.
    Moved { from: M, to: M, verdict: GateVerdict },
    /// The target's gate returned false; nothing changed.
    Rejected { from: M, to: M },
    /// The target is the current marker, e.g. `next` at the last marker.
    Unchanged { at: M },
}

impl<M: Copy> TransitionOutcome<M> {
    pub fn is_moved(&self) -> bool {
        matches!(self, Self::Moved { .. })
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected { .. })
    }

    /// The marker the stage is on after the attempt.
    pub fn current(&self) -> M {
        match *self {
            Self::Moved { to, .. } => to,
            Self::Rejected { from, .. } => from,
            Self::Unchanged { at } => at,
        }
    }
}
