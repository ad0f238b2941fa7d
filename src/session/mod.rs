//! Session layer: the owner of per-student state and the driver that binds
//! a stage to the store.
//!
//! A [`Session`] holds the configuration, the story state and the store.
//! Stages are entered through it as [`StageSession`]s, which refuse
//! transitions until their persisted state has loaded and collect changes
//! into a single pending write.

mod config;
mod container;
mod stage_session;

pub use config::{ConfigError, SessionConfig, DEFAULT_STORY_NAME};
pub use container::Session;
pub use stage_session::{LoadOutcome, LoadTicket, StageSession};
