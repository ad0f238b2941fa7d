//! Persistence error types.

use thiserror::Error;

/// Errors raised by a [`StageStore`](super::StageStore) backend.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Stored record is malformed: {0}")]
    Malformed(String),
}

/// A single problem found while validating a persisted stage record.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum RestoreViolation {
    #[error("record has no 'current_step' entry")]
    MissingCurrentStep,

    #[error("'current_step' is not a non-negative integer: {value}")]
    MalformedCurrentStep { value: String },

    #[error("step ordinal {ordinal} is outside stage '{stage}' ({len} steps)")]
    UnknownStep {
        stage: &'static str,
        ordinal: u64,
        len: usize,
    },

    #[error("stage fields could not be decoded: {message}")]
    MalformedFields { message: String },
}

/// Errors that can occur while saving or restoring stage state.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("Serialization failed: {0}")]
    SerializationFailed(String),

    #[error("Deserialization failed: {0}")]
    DeserializationFailed(String),

    #[error("Unsupported checkpoint version {found}, supported: {supported}")]
    UnsupportedVersion { found: u32, supported: u32 },

    #[error("Checkpoint belongs to stage '{found}', expected '{expected}'")]
    StageMismatch { expected: String, found: String },

    #[error("Stage record failed validation: {}", join_violations(.0))]
    InvalidRecord(Vec<RestoreViolation>),

    #[error(transparent)]
    Store(#[from] StoreError),
}

fn join_violations(violations: &[RestoreViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
