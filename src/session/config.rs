//! Session configuration.

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_STORY_NAME: &str = "hubbles_law";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse session config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Settings of one student session. Missing keys take their defaults.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Story name used in store keys
    pub story_name: String,

    pub student_id: u64,

    /// Enables the state editor jump
    pub debug_mode: bool,

    /// `tracing-subscriber` filter directive
    pub log_filter: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            story_name: DEFAULT_STORY_NAME.to_string(),
            student_id: 0,
            debug_mode: false,
            log_filter: "info".to_string(),
        }
    }
}

impl SessionConfig {
    pub fn for_student(student_id: u64) -> Self {
        Self {
            student_id,
            ..Self::default()
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json_string(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
