//! Errors surfaced by stage operations.

use crate::persist::PersistError;
use thiserror::Error;

/// Hard failures of stage operations.
///
/// Rejected transitions and ungated targets are not errors; they are
/// reported through [`TransitionOutcome`](crate::stage::TransitionOutcome)
/// and [`GateVerdict`](crate::core::GateVerdict).
#[derive(Debug, Error)]
pub enum StageError {
    /// The request is ill-formed: ambiguous transition flags, markers of
    /// different stages, unknown marker names.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A transition was attempted before persisted state finished loading.
    #[error("Stage '{stage}' has not finished loading its persisted state")]
    NotReady { stage: &'static str },

    #[error(transparent)]
    Persist(#[from] PersistError),
}
