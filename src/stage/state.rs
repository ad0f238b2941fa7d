//! The stage state machine.

use super::fields::StageFields;
use super::transition::{TransitionOutcome, TransitionQuery, TransitionTarget};
use crate::core::{GateRegistry, GateVerdict, Marker, TransitionLog, TransitionRecord};
use crate::error::StageError;
use crate::persist::{decode_record, encode_record, PersistError, StageCheckpoint, StageRecord};
use crate::story::StoryState;
use chrono::Utc;
use tracing::{debug, info};

/// Progress of one student through one stage.
///
/// The current marker changes only through [`transition_to`], which
/// [`transition_next`] and [`transition_previous`] delegate to. Forward moves
/// are gated; backward moves are always allowed.
///
/// A freshly built stage is not loaded. Until [`restore`] or
/// [`mark_loaded`] runs, every gate counts as failed and transitions return
/// [`StageError::NotReady`].
///
/// [`transition_to`]: StageState::transition_to
/// [`transition_next`]: StageState::transition_next
/// [`transition_previous`]: StageState::transition_previous
/// [`restore`]: StageState::restore
/// [`mark_loaded`]: StageState::mark_loaded
#[derive(Clone, Debug)]
pub struct StageState<M: Marker, F: StageFields> {
    current: M,
    fields: F,
    gates: GateRegistry<M, F>,
    history: TransitionLog<M>,
    loaded: bool,
}

impl<M: Marker, F: StageFields> StageState<M, F> {
    /// Create a stage at its first marker, waiting for persisted state.
    pub fn new(fields: F, gates: GateRegistry<M, F>) -> Self {
        Self::from_parts(M::first(), fields, gates, false)
    }

    pub(crate) fn from_parts(current: M, fields: F, gates: GateRegistry<M, F>, loaded: bool) -> Self {
        Self {
            current,
            fields,
            gates,
            history: TransitionLog::new(),
            loaded,
        }
    }

    pub fn stage_name(&self) -> &'static str {
        M::STAGE
    }

    pub fn current_step(&self) -> M {
        self.current
    }

    pub fn fields(&self) -> &F {
        &self.fields
    }

    pub fn gates(&self) -> &GateRegistry<M, F> {
        &self.gates
    }

    pub fn history(&self) -> &TransitionLog<M> {
        &self.history
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Accept the current contents as loaded, e.g. when the store has no
    /// record for this student yet.
    pub fn mark_loaded(&mut self) {
        self.loaded = true;
    }

    pub fn is_current_step(&self, marker: M) -> bool {
        self.current == marker
    }

    /// Inclusive range check against the current marker. A missing `end`
    /// means the last marker.
    pub fn current_step_between(&self, start: M, end: Option<M>) -> bool {
        self.current.is_between(start, end)
    }

    pub fn current_step_at_or_after(&self, marker: M) -> bool {
        self.current.ordinal() >= marker.ordinal()
    }

    pub fn current_step_at_or_before(&self, marker: M) -> bool {
        self.current.ordinal() <= marker.ordinal()
    }

    pub fn current_step_in(&self, markers: &[M]) -> bool {
        markers.contains(&self.current)
    }

    /// The marker a target refers to from the current position.
    pub fn resolve_target(&self, target: TransitionTarget<M>) -> M {
        match target {
            TransitionTarget::Step(marker) => marker,
            TransitionTarget::Next => self.current.next(),
            TransitionTarget::Previous => self.current.previous(),
        }
    }

    /// Evaluate the gate guarding `target` against the current fields.
    pub fn evaluate(&self, target: M) -> GateVerdict {
        if !self.loaded {
            return GateVerdict::Failed;
        }
        self.gates.evaluate(&self.fields, target)
    }

    /// Whether moving to `target` would currently pass its gate.
    ///
    /// This is the question behind an enabled "Next" control; it never
    /// transitions.
    pub fn can_transition(&self, target: TransitionTarget<M>) -> bool {
        self.evaluate(self.resolve_target(target)).allows()
    }

    /// [`can_transition`](Self::can_transition) for flag-style queries.
    pub fn can_transition_query(&self, query: &TransitionQuery<M>) -> Result<bool, StageError> {
        Ok(self.can_transition(query.resolve()?))
    }

    /// Move to any marker of the sequence.
    ///
    /// Without `force` the target's gate decides; a failed gate leaves the
    /// stage where it is and reports [`TransitionOutcome::Rejected`].
    pub fn transition_to(&mut self, target: M, force: bool) -> Result<TransitionOutcome<M>, StageError> {
        self.ensure_loaded()?;

        let from = self.current;
        if target == from {
            debug!(stage = M::STAGE, step = from.name(), "Already at requested step");
            return Ok(TransitionOutcome::Unchanged { at: from });
        }

        let verdict = if force {
            GateVerdict::Forced
        } else {
            self.gates.evaluate(&self.fields, target)
        };

        if !verdict.allows() {
            info!(
                stage = M::STAGE,
                from = from.name(),
                to = target.name(),
                "Conditions not met to transition from {} to {}",
                from.name(),
                target.name()
            );
            return Ok(TransitionOutcome::Rejected { from, to: target });
        }

        self.current = target;
        self.history = self.history.record(TransitionRecord {
            from,
            to: target,
            timestamp: Utc::now(),
            verdict,
        });
        debug!(
            stage = M::STAGE,
            from = from.name(),
            to = target.name(),
            ?verdict,
            "Transitioned"
        );
        Ok(TransitionOutcome::Moved {
            from,
            to: target,
            verdict,
        })
    }

    /// Gated move to the following marker.
    pub fn transition_next(&mut self) -> Result<TransitionOutcome<M>, StageError> {
        self.ensure_loaded()?;
        self.transition_to(self.current.next(), false)
    }

    /// Unconditional move to the preceding marker.
    pub fn transition_previous(&mut self) -> Result<TransitionOutcome<M>, StageError> {
        self.ensure_loaded()?;
        self.transition_to(self.current.previous(), true)
    }

    /// Apply a batch of field updates, then run the derived-update pass.
    pub fn update<U>(&mut self, story: &StoryState, apply: U)
    where
        U: FnOnce(&mut F),
    {
        apply(&mut self.fields);
        self.fields.derive(story);
    }

    /// Run only the derived-update pass, after story state changed.
    pub fn refresh(&mut self, story: &StoryState) {
        self.fields.derive(story);
    }

    /// Flat record of the fields plus `current_step`.
    pub fn snapshot(&self) -> Result<StageRecord, PersistError> {
        encode_record(self.current, &self.fields)
    }

    /// Replace fields and marker from a persisted record.
    ///
    /// The whole record is validated first; on error nothing changes. The
    /// fields are applied and derived before the marker, and the stage is
    /// loaded afterwards.
    pub fn restore(&mut self, record: &StageRecord, story: &StoryState) -> Result<(), PersistError> {
        let (step, mut fields) = decode_record::<M, F>(record)?;
        fields.reconcile(story);
        fields.derive(story);
        self.fields = fields;
        self.current = step;
        self.loaded = true;
        debug!(stage = M::STAGE, step = step.name(), "Restored stage state");
        Ok(())
    }

    pub fn checkpoint(&self) -> StageCheckpoint<M, F> {
        StageCheckpoint::new(self.current, self.fields.clone(), self.history.clone())
    }

    /// Replace fields, marker and history from a checkpoint.
    pub fn resume(&mut self, checkpoint: StageCheckpoint<M, F>, story: &StoryState) -> Result<(), PersistError> {
        let step = checkpoint.current_marker()?;
        let mut fields = checkpoint.fields;
        fields.reconcile(story);
        fields.derive(story);
        self.fields = fields;
        self.history = checkpoint.history;
        self.current = step;
        self.loaded = true;
        Ok(())
    }

    fn ensure_loaded(&self) -> Result<(), StageError> {
        if self.loaded {
            Ok(())
        } else {
            Err(StageError::NotReady { stage: M::STAGE })
        }
    }
}
