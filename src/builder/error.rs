//! Build errors for stage builders.

use thiserror::Error;

/// Errors that can occur when assembling a stage.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BuildError {
    #[error("Stage '{stage}' registers more than one gate for step {marker}")]
    DuplicateGate {
        stage: &'static str,
        marker: &'static str,
    },

    #[error("Stage '{stage}' has no step named '{name}'")]
    UnknownMarker { stage: &'static str, name: String },
}
