//! Per-stage driver: loading, transitions and write-behind persistence.

use crate::core::Marker;
use crate::effects::{load_stage_record, save_stage_record, StoreEnv};
use crate::error::StageError;
use crate::persist::{PersistError, StageKey, StageRecord};
use crate::stage::{StageFields, StageState, TransitionOutcome, TransitionQuery, TransitionTarget};
use crate::story::StoryState;
use stillwater::effect::Effect;
use tracing::{debug, warn};

/// Handle for one load of persisted state.
///
/// Only the most recently issued ticket may apply its result; a reload
/// supersedes any load still in flight.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LoadTicket(u64);

/// What happened to a completed load.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoadOutcome {
    /// A persisted record was restored.
    Restored,
    /// Nothing was stored yet; the stage starts fresh.
    Fresh,
    /// A later load was started; this result was dropped.
    Superseded,
}

/// A stage bound to a student and a store.
///
/// Every applied change replaces a single pending snapshot; [`flush`]
/// writes it. Transitions never wait on the store.
///
/// [`flush`]: StageSession::flush
#[derive(Debug)]
pub struct StageSession<M: Marker, F: StageFields> {
    key: StageKey,
    env: StoreEnv,
    debug_mode: bool,
    state: StageState<M, F>,
    latest_load: u64,
    pending: Option<StageRecord>,
}

impl<M: Marker, F: StageFields> StageSession<M, F> {
    pub fn new(key: StageKey, env: StoreEnv, debug_mode: bool, state: StageState<M, F>) -> Self {
        Self {
            key,
            env,
            debug_mode,
            state,
            latest_load: 0,
            pending: None,
        }
    }

    pub fn key(&self) -> &StageKey {
        &self.key
    }

    pub fn state(&self) -> &StageState<M, F> {
        &self.state
    }

    pub fn current_step(&self) -> M {
        self.state.current_step()
    }

    pub fn is_loaded(&self) -> bool {
        self.state.is_loaded()
    }

    pub fn pending_write(&self) -> Option<&StageRecord> {
        self.pending.as_ref()
    }

    /// Start a load, superseding any earlier one.
    pub fn begin_load(&mut self) -> LoadTicket {
        self.latest_load += 1;
        LoadTicket(self.latest_load)
    }

    /// Apply the result of a load if its ticket is still the latest.
    pub fn complete_load(
        &mut self,
        ticket: LoadTicket,
        record: Option<StageRecord>,
        story: &StoryState,
    ) -> Result<LoadOutcome, StageError> {
        if ticket.0 != self.latest_load {
            debug!(
                stage = M::STAGE,
                key = %self.key,
                "Discarding superseded load"
            );
            return Ok(LoadOutcome::Superseded);
        }

        match record {
            Some(record) => {
                self.state.restore(&record, story)?;
                Ok(LoadOutcome::Restored)
            }
            None => {
                self.state.refresh(story);
                self.state.mark_loaded();
                debug!(stage = M::STAGE, key = %self.key, "No stored state, starting fresh");
                Ok(LoadOutcome::Fresh)
            }
        }
    }

    /// Load persisted state from the store.
    pub async fn load(&mut self, story: &StoryState) -> Result<LoadOutcome, StageError> {
        let ticket = self.begin_load();
        let record = load_stage_record(self.key.clone())
            .run(&self.env)
            .await
            .map_err(PersistError::from)?;
        self.complete_load(ticket, record, story)
    }

    pub fn can_transition(&self, target: TransitionTarget<M>) -> bool {
        self.state.can_transition(target)
    }

    pub fn can_transition_query(&self, query: &TransitionQuery<M>) -> Result<bool, StageError> {
        self.state.can_transition_query(query)
    }

    pub fn transition_to(&mut self, target: M, force: bool) -> Result<TransitionOutcome<M>, StageError> {
        let outcome = self.state.transition_to(target, force)?;
        self.after_transition(outcome)
    }

    pub fn transition_next(&mut self) -> Result<TransitionOutcome<M>, StageError> {
        let outcome = self.state.transition_next()?;
        self.after_transition(outcome)
    }

    pub fn transition_previous(&mut self) -> Result<TransitionOutcome<M>, StageError> {
        let outcome = self.state.transition_previous()?;
        self.after_transition(outcome)
    }

    /// State editor jump to any marker, only available in debug mode.
    pub fn jump_to(&mut self, target: M) -> Result<TransitionOutcome<M>, StageError> {
        if !self.debug_mode {
            return Err(StageError::InvalidArgument(format!(
                "jumping to {} requires debug mode",
                target.erase()
            )));
        }
        self.transition_to(target, true)
    }

    /// Apply field updates, run the derived pass and queue a write.
    pub fn update<U>(&mut self, story: &StoryState, apply: U) -> Result<(), StageError>
    where
        U: FnOnce(&mut F),
    {
        self.state.update(story, apply);
        self.queue_write()
    }

    /// Re-derive fields after story state changed, queueing a write only if
    /// something changed.
    pub fn refresh(&mut self, story: &StoryState) -> Result<(), StageError> {
        let before = self.state.fields().clone();
        self.state.refresh(story);
        if *self.state.fields() != before {
            self.queue_write()?;
        }
        Ok(())
    }

    /// Write the pending snapshot, if any. Returns whether a write happened.
    ///
    /// On failure the snapshot stays pending.
    pub async fn flush(&mut self) -> Result<bool, StageError> {
        let Some(record) = self.pending.take() else {
            return Ok(false);
        };

        match save_stage_record(self.key.clone(), record.clone())
            .run(&self.env)
            .await
        {
            Ok(()) => {
                debug!(stage = M::STAGE, key = %self.key, "Stage state written");
                Ok(true)
            }
            Err(e) => {
                warn!(stage = M::STAGE, key = %self.key, error = %e, "Stage state write failed");
                self.pending = Some(record);
                Err(PersistError::from(e).into())
            }
        }
    }

    /// Give the stage back, dropping any unwritten snapshot.
    pub fn into_state(self) -> StageState<M, F> {
        self.state
    }

    fn after_transition(&mut self, outcome: TransitionOutcome<M>) -> Result<TransitionOutcome<M>, StageError> {
        if outcome.is_moved() {
            self.queue_write()?;
        }
        Ok(outcome)
    }

    fn queue_write(&mut self) -> Result<(), StageError> {
        if !self.state.is_loaded() {
            return Ok(());
        }
        self.pending = Some(self.state.snapshot()?);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::StageBuilder;
    use crate::persist::{InMemoryStore, StageStore, CURRENT_STEP_KEY};
    use serde::{Deserialize, Serialize};
    use serde_json::json;
    use std::sync::Arc;

    crate::marker_enum! {
        stage: "session_test";
        enum TestMarker {
            Intro => "int1",
            Select => "sel1",
            Done => "don1",
        }
    }

    #[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    struct Fields {
        ready: bool,
        total: usize,
    }

    impl StageFields for Fields {
        fn derive(&mut self, story: &StoryState) {
            self.total = story.measurements.len();
        }
    }

    fn new_session(debug_mode: bool) -> (Arc<InMemoryStore>, StageSession<TestMarker, Fields>) {
        let store = Arc::new(InMemoryStore::new());
        let state = StageBuilder::new()
            .gate(TestMarker::Select, |f: &Fields| f.ready)
            .build()
            .unwrap();
        let key = StageKey::new("hubbles_law", 1, TestMarker::STAGE);
        let session = StageSession::new(key, StoreEnv::new(store.clone()), debug_mode, state);
        (store, session)
    }

    #[tokio::test]
    async fn fresh_load_marks_stage_ready() {
        let (_, mut session) = new_session(false);
        assert!(matches!(session.transition_next(), Err(StageError::NotReady { .. })));

        let outcome = session.load(&StoryState::default()).await.unwrap();
        assert_eq!(outcome, LoadOutcome::Fresh);
        assert!(session.is_loaded());
        assert!(session.pending_write().is_none());
    }

    #[tokio::test]
    async fn stored_state_is_restored() {
        let (store, mut session) = new_session(false);
        let mut record = StageRecord::new();
        record.insert(CURRENT_STEP_KEY, json!(2));
        record.insert("ready", json!(true));
        store.put_stage_state(session.key(), &record).unwrap();

        assert_eq!(
            session.load(&StoryState::default()).await.unwrap(),
            LoadOutcome::Restored
        );
        assert_eq!(session.current_step(), TestMarker::Done);
        assert!(session.state().fields().ready);
    }

    #[test]
    fn superseded_load_is_discarded() {
        let (_, mut session) = new_session(false);
        let first = session.begin_load();
        let second = session.begin_load();

        let mut stale = StageRecord::new();
        stale.insert(CURRENT_STEP_KEY, json!(2));
        assert_eq!(
            session
                .complete_load(first, Some(stale), &StoryState::default())
                .unwrap(),
            LoadOutcome::Superseded
        );
        assert!(!session.is_loaded());

        assert_eq!(
            session
                .complete_load(second, None, &StoryState::default())
                .unwrap(),
            LoadOutcome::Fresh
        );
        assert_eq!(session.current_step(), TestMarker::Intro);
    }

    #[tokio::test]
    async fn writes_are_coalesced_until_flush() {
        let (store, mut session) = new_session(false);
        session.load(&StoryState::default()).await.unwrap();

        session
            .update(&StoryState::default(), |f| f.ready = true)
            .unwrap();
        session.transition_next().unwrap();
        session.transition_next().unwrap();
        assert_eq!(store.stage_writes(), 0);

        assert!(session.flush().await.unwrap());
        assert!(!session.flush().await.unwrap());
        assert_eq!(store.stage_writes(), 1);

        let stored = store.get_stage_state(session.key()).unwrap().unwrap();
        assert_eq!(stored.current_step(), Some(&json!(2)));
    }

    #[tokio::test]
    async fn rejected_transition_queues_nothing() {
        let (_, mut session) = new_session(false);
        session.load(&StoryState::default()).await.unwrap();
        assert!(session.transition_next().unwrap().is_rejected());
        assert!(session.pending_write().is_none());
    }

    #[test]
    fn nothing_is_queued_before_load() {
        let (_, mut session) = new_session(false);
        session
            .update(&StoryState::default(), |f| f.ready = true)
            .unwrap();
        assert!(session.pending_write().is_none());
    }

    #[tokio::test]
    async fn jump_requires_debug_mode() {
        let (_, mut session) = new_session(false);
        session.load(&StoryState::default()).await.unwrap();
        assert!(matches!(
            session.jump_to(TestMarker::Done),
            Err(StageError::InvalidArgument(_))
        ));

        let (_, mut debug_session) = new_session(true);
        debug_session.load(&StoryState::default()).await.unwrap();
        let outcome = debug_session.jump_to(TestMarker::Done).unwrap();
        assert_eq!(outcome.current(), TestMarker::Done);
    }

    #[tokio::test]
    async fn refresh_queues_only_on_change() {
        let (_, mut session) = new_session(false);
        session.load(&StoryState::default()).await.unwrap();

        session.refresh(&StoryState::default()).unwrap();
        assert!(session.pending_write().is_none());

        let mut story = StoryState::default();
        story.upsert_measurement(crate::story::Measurement::new("NGC 4472"));
        session.refresh(&story).unwrap();
        assert_eq!(
            session.pending_write().and_then(|r| r.get("total")),
            Some(&json!(1))
        );
    }
}
