//! Store reads and writes as effects.

use crate::persist::{StageKey, StageRecord, StageStore, StoreError};
use crate::story::StoryState;
use std::fmt;
use std::sync::Arc;
use stillwater::effect::BoxedEffect;
use stillwater::prelude::*;

/// Environment the persistence effects run in.
#[derive(Clone)]
pub struct StoreEnv {
    pub store: Arc<dyn StageStore>,
}

impl StoreEnv {
    pub fn new(store: Arc<dyn StageStore>) -> Self {
        Self { store }
    }
}

impl fmt::Debug for StoreEnv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("StoreEnv(..)")
    }
}

/// Fetch the persisted record of one stage, if any.
pub fn load_stage_record(key: StageKey) -> BoxedEffect<Option<StageRecord>, StoreError, StoreEnv> {
    from_fn(move |env: &StoreEnv| env.store.get_stage_state(&key)).boxed()
}

/// Write the record of one stage.
pub fn save_stage_record(key: StageKey, record: StageRecord) -> BoxedEffect<(), StoreError, StoreEnv> {
    from_fn(move |env: &StoreEnv| env.store.put_stage_state(&key, &record)).boxed()
}

/// Fetch the story state of a student, falling back to a fresh one.
pub fn load_story(story: String, student_id: u64) -> BoxedEffect<StoryState, StoreError, StoreEnv> {
    from_fn(move |env: &StoreEnv| env.store.get_story_state(&story, student_id))
        .map(Option::unwrap_or_default)
        .boxed()
}

pub fn save_story(
    story: String,
    student_id: u64,
    state: StoryState,
) -> BoxedEffect<(), StoreError, StoreEnv> {
    from_fn(move |env: &StoreEnv| env.store.put_story_state(&story, student_id, &state)).boxed()
}
