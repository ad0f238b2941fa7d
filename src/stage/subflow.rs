//! Nested sub-sequences.
//!
//! Some stage panels run their own short step sequence (a slideshow or a
//! guided calculation) while the parent stage stays within a fixed marker
//! range. The sub-flow keeps a plain step counter and follows the same rule
//! as the parent: moving forward is gated, moving back is not.

use crate::core::Marker;
use serde::{Deserialize, Serialize};

/// Step counter for a slideshow-style sub-flow.
///
/// A step listed as blocking keeps "Next" disabled until the student has
/// completed it (`max_step_completed >= step`). Step 0 never blocks because
/// `max_step_completed` starts at 0.
///
/// Deserializing rejects an empty slideshow and steps past the end, so a
/// restored stage never holds a counter its panels cannot display.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "SlideshowRecord")]
pub struct Slideshow {
    pub step: u32,
    pub length: u32,
    pub max_step_completed: u32,
    pub complete: bool,
}

/// Wire form of a [`Slideshow`], checked before it becomes one.
#[derive(Deserialize)]
#[serde(default)]
struct SlideshowRecord {
    step: u32,
    length: u32,
    max_step_completed: u32,
    complete: bool,
}

impl Default for SlideshowRecord {
    fn default() -> Self {
        let show = Slideshow::default();
        Self {
            step: show.step,
            length: show.length,
            max_step_completed: show.max_step_completed,
            complete: show.complete,
        }
    }
}

impl TryFrom<SlideshowRecord> for Slideshow {
    type Error = String;

    fn try_from(record: SlideshowRecord) -> Result<Self, Self::Error> {
        if record.length == 0 {
            return Err("slideshow length must be at least 1".to_string());
        }
        if record.step >= record.length || record.max_step_completed >= record.length {
            return Err(format!(
                "slideshow step {} (completed {}) is outside its {} steps",
                record.step, record.max_step_completed, record.length
            ));
        }
        Ok(Self {
            step: record.step,
            length: record.length,
            max_step_completed: record.max_step_completed,
            complete: record.complete,
        })
    }
}

impl Default for Slideshow {
    fn default() -> Self {
        Self::new(1)
    }
}

impl Slideshow {
    pub fn new(length: u32) -> Self {
        Self {
            step: 0,
            length: length.max(1),
            max_step_completed: 0,
            complete: false,
        }
    }

    pub fn is_last_step(&self) -> bool {
        self.step.saturating_add(1) >= self.length
    }

    pub fn is_blocked(&self, blocking: &[u32]) -> bool {
        blocking.contains(&self.step) && self.max_step_completed < self.step
    }

    pub fn can_advance(&self, blocking: &[u32]) -> bool {
        !self.is_last_step() && !self.is_blocked(blocking)
    }

    /// Move to the next step if allowed.
    pub fn advance(&mut self, blocking: &[u32]) -> bool {
        if !self.can_advance(blocking) {
            return false;
        }
        self.max_step_completed = self.max_step_completed.max(self.step);
        self.step += 1;
        true
    }

    /// Move to the previous step. Clamped at step 0.
    pub fn retreat(&mut self) -> bool {
        if self.step == 0 {
            return false;
        }
        self.step -= 1;
        true
    }

    /// Record that the interaction required by the current step is done.
    pub fn complete_current(&mut self) {
        self.max_step_completed = self.max_step_completed.max(self.step);
    }

    /// Reopen at the furthest completed step.
    pub fn resume(&mut self) {
        self.step = self.max_step_completed.min(self.length.saturating_sub(1));
    }

    /// Mark the slideshow complete. Only possible from the last step.
    pub fn finish(&mut self) -> bool {
        if !self.is_last_step() {
            return false;
        }
        self.complete_current();
        self.complete = true;
        true
    }
}

/// Parent marker range in which a sub-flow is active.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SubFlowScope<M> {
    pub start: M,
    pub end: M,
}

impl<M: Marker> SubFlowScope<M> {
    pub const fn new(start: M, end: M) -> Self {
        Self { start, end }
    }

    pub fn is_active(&self, current: M) -> bool {
        current.is_between(self.start, Some(self.end))
    }

    /// Whether the parent has moved past the scope.
    pub fn is_behind(&self, current: M) -> bool {
        current > self.end
    }
}
