//! Storage backends for stage and story records.

use super::error::StoreError;
use super::record::{StageKey, StageRecord};
use crate::story::StoryState;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

/// Backend holding one record per (story, student, stage) and one story
/// state per (story, student).
///
/// Reads and writes are idempotent. The wire format is up to the backend.
pub trait StageStore: Send + Sync {
    fn get_stage_state(&self, key: &StageKey) -> Result<Option<StageRecord>, StoreError>;

    fn put_stage_state(&self, key: &StageKey, record: &StageRecord) -> Result<(), StoreError>;

    fn get_story_state(&self, story: &str, student_id: u64)
        -> Result<Option<StoryState>, StoreError>;

    fn put_story_state(
        &self,
        story: &str,
        student_id: u64,
        state: &StoryState,
    ) -> Result<(), StoreError>;
}

/// Process-local store keeping records as JSON text.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    stages: RwLock<HashMap<StageKey, String>>,
    stories: RwLock<HashMap<(String, u64), String>>,
    stage_writes: AtomicUsize,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stage records written so far.
    pub fn stage_writes(&self) -> usize {
        self.stage_writes.load(Ordering::SeqCst)
    }

    /// Store raw JSON for a stage, bypassing encoding. Useful for seeding
    /// records written by older versions.
    pub fn seed_stage_json(&self, key: StageKey, json: impl Into<String>) -> Result<(), StoreError> {
        let mut stages = self.stages.write().map_err(|_| poisoned())?;
        stages.insert(key, json.into());
        Ok(())
    }
}

impl StageStore for InMemoryStore {
    fn get_stage_state(&self, key: &StageKey) -> Result<Option<StageRecord>, StoreError> {
        let stages = self.stages.read().map_err(|_| poisoned())?;
        stages
            .get(key)
            .map(|json| serde_json::from_str(json).map_err(|e| StoreError::Malformed(e.to_string())))
            .transpose()
    }

    fn put_stage_state(&self, key: &StageKey, record: &StageRecord) -> Result<(), StoreError> {
        let json =
            serde_json::to_string(record).map_err(|e| StoreError::Malformed(e.to_string()))?;
        let mut stages = self.stages.write().map_err(|_| poisoned())?;
        stages.insert(key.clone(), json);
        self.stage_writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn get_story_state(
        &self,
        story: &str,
        student_id: u64,
    ) -> Result<Option<StoryState>, StoreError> {
        let stories = self.stories.read().map_err(|_| poisoned())?;
        stories
            .get(&(story.to_string(), student_id))
            .map(|json| serde_json::from_str(json).map_err(|e| StoreError::Malformed(e.to_string())))
            .transpose()
    }

    fn put_story_state(
        &self,
        story: &str,
        student_id: u64,
        state: &StoryState,
    ) -> Result<(), StoreError> {
        let json =
            serde_json::to_string(state).map_err(|e| StoreError::Malformed(e.to_string()))?;
        let mut stories = self.stories.write().map_err(|_| poisoned())?;
        stories.insert((story.to_string(), student_id), json);
        Ok(())
    }
}

fn poisoned() -> StoreError {
    StoreError::Unavailable("store lock poisoned".to_string())
}
