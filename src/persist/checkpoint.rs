//! Typed checkpoints of a stage.
//!
//! Unlike the flat [`StageRecord`](super::StageRecord), a checkpoint keeps
//! the transition history and can be written as compact binary. Gates are
//! not part of a checkpoint; they come from the stage definition.

use super::error::{PersistError, RestoreViolation};
use crate::core::{Marker, TransitionLog};
use crate::stage::StageFields;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Version identifier for checkpoint format
pub const CHECKPOINT_VERSION: u32 = 1;

/// Serializable snapshot of a stage with its history.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct StageCheckpoint<M: Marker, F: StageFields> {
    /// Checkpoint format version
    pub version: u32,

    /// Unique checkpoint identifier
    pub id: String,

    /// When checkpoint was created
    pub timestamp: DateTime<Utc>,

    /// Stage the checkpoint was taken from
    pub stage: String,

    /// Ordinal of the current marker
    pub current_step: u32,

    pub fields: F,

    pub history: TransitionLog<M>,
}

impl<M: Marker, F: StageFields> StageCheckpoint<M, F> {
    pub fn new(current: M, fields: F, history: TransitionLog<M>) -> Self {
        Self {
            version: CHECKPOINT_VERSION,
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            stage: M::STAGE.to_string(),
            current_step: current.ordinal(),
            fields,
            history,
        }
    }

    /// The current marker, after checking the checkpoint fits this stage.
    pub fn current_marker(&self) -> Result<M, PersistError> {
        self.validate()?;
        M::from_ordinal(self.current_step).ok_or_else(|| {
            PersistError::InvalidRecord(vec![RestoreViolation::UnknownStep {
                stage: M::STAGE,
                ordinal: u64::from(self.current_step),
                len: M::all().len(),
            }])
        })
    }

    pub fn validate(&self) -> Result<(), PersistError> {
        if self.version != CHECKPOINT_VERSION {
            return Err(PersistError::UnsupportedVersion {
                found: self.version,
                supported: CHECKPOINT_VERSION,
            });
        }
        if self.stage != M::STAGE {
            return Err(PersistError::StageMismatch {
                expected: M::STAGE.to_string(),
                found: self.stage.clone(),
            });
        }
        Ok(())
    }

    pub fn to_json(&self) -> Result<String, PersistError> {
        serde_json::to_string_pretty(self).map_err(|e| PersistError::SerializationFailed(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self, PersistError> {
        let checkpoint: Self = serde_json::from_str(json)
            .map_err(|e| PersistError::DeserializationFailed(e.to_string()))?;
        checkpoint.validate()?;
        Ok(checkpoint)
    }

    pub fn to_binary(&self) -> Result<Vec<u8>, PersistError> {
        bincode::serialize(self).map_err(|e| PersistError::SerializationFailed(e.to_string()))
    }

    pub fn from_binary(bytes: &[u8]) -> Result<Self, PersistError> {
        let checkpoint: Self = bincode::deserialize(bytes)
            .map_err(|e| PersistError::DeserializationFailed(e.to_string()))?;
        checkpoint.validate()?;
        Ok(checkpoint)
    }
}
