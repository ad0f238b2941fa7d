//! Session-scoped owner of story state and store access.

use super::config::SessionConfig;
use super::stage_session::StageSession;
use crate::core::Marker;
use crate::effects::{load_story, save_story, StoreEnv};
use crate::error::StageError;
use crate::logging::{init_logging, LoggingError};
use crate::persist::{PersistError, StageKey, StageStore};
use crate::stage::{StageFields, StageState};
use crate::story::StoryState;
use std::sync::Arc;
use stillwater::effect::Effect;
use tracing::{debug, info};

/// One student's session: config, story state and the store they share.
///
/// Stages are opened from the session and borrow its story state for their
/// derived fields.
#[derive(Debug)]
pub struct Session {
    config: SessionConfig,
    env: StoreEnv,
    story: StoryState,
}

impl Session {
    pub fn new(config: SessionConfig, store: Arc<dyn StageStore>) -> Self {
        let story = StoryState {
            debug_mode: config.debug_mode,
            ..StoryState::default()
        };
        Self {
            config,
            env: StoreEnv::new(store),
            story,
        }
    }

    /// Like [`new`](Self::new), first installing the diagnostics
    /// subscriber filtered by the configured `log_filter`.
    pub fn with_logging(config: SessionConfig, store: Arc<dyn StageStore>) -> Result<Self, LoggingError> {
        init_logging(&config.log_filter)?;
        Ok(Self::new(config, store))
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn story(&self) -> &StoryState {
        &self.story
    }

    /// Apply a change to story state.
    ///
    /// Stages hold copies of the story values their gates read, so open
    /// stages keep the old values until [`refresh_stage`] runs for them.
    ///
    /// [`refresh_stage`]: Self::refresh_stage
    pub fn update_story<U>(&mut self, apply: U)
    where
        U: FnOnce(&mut StoryState),
    {
        apply(&mut self.story);
    }

    /// Re-run the derived pass of an open stage against current story state.
    pub fn refresh_stage<M: Marker, F: StageFields>(&self, stage: &mut StageSession<M, F>) -> Result<(), StageError> {
        stage.refresh(&self.story)
    }

    pub fn stage_key(&self, stage: &str) -> StageKey {
        StageKey::new(&self.config.story_name, self.config.student_id, stage)
    }

    /// Replace story state with the stored one, if any.
    pub async fn load_story(&mut self) -> Result<(), StageError> {
        let mut story = load_story(self.config.story_name.clone(), self.config.student_id)
            .run(&self.env)
            .await
            .map_err(PersistError::from)?;
        story.debug_mode = self.config.debug_mode;
        self.story = story;
        info!(
            story = %self.config.story_name,
            student_id = self.config.student_id,
            measurements = self.story.measurements.len(),
            "Story state loaded"
        );
        Ok(())
    }

    pub async fn save_story(&self) -> Result<(), StageError> {
        save_story(
            self.config.story_name.clone(),
            self.config.student_id,
            self.story.clone(),
        )
        .run(&self.env)
        .await
        .map_err(PersistError::from)?;
        debug!(story = %self.config.story_name, "Story state written");
        Ok(())
    }

    /// Bind a stage to this session without loading it.
    pub fn open_stage<M: Marker, F: StageFields>(&self, state: StageState<M, F>) -> StageSession<M, F> {
        StageSession::new(
            self.stage_key(M::STAGE),
            self.env.clone(),
            self.config.debug_mode,
            state,
        )
    }

    /// Bind a stage and load its persisted state.
    pub async fn enter_stage<M: Marker, F: StageFields>(
        &self,
        state: StageState<M, F>,
    ) -> Result<StageSession<M, F>, StageError> {
        let mut stage = self.open_stage(state);
        stage.load(&self.story).await?;
        Ok(stage)
    }
}
