//! Hubble Stages: gated, marker-based progression through the stages of the
//! Hubble's Law data-collection activity.
//!
//! Each stage is a linear sequence of named markers. A student moves forward
//! only when the gate guarding the next marker passes against the stage's
//! fields; moving back is always allowed. Stage state round-trips through a
//! flat persisted record with the current marker stored as an ordinal.
//!
//! The crate follows a "pure core, imperative shell" split:
//!
//! - **core**: markers, gates and transition history; no I/O
//! - **stage**: the `StageState` state machine over a marker sequence
//! - **persist** / **effects**: records, checkpoints and store access
//! - **session**: load gating, write coalescing and the story state owner
//!
//! # Example
//!
//! ```rust
//! use hubble_stages::builder::StageBuilder;
//! use hubble_stages::marker_enum;
//! use hubble_stages::stage::{StageFields, TransitionTarget};
//! use hubble_stages::story::StoryState;
//! use serde::{Deserialize, Serialize};
//!
//! marker_enum! {
//!     stage: "demo";
//!     enum Step {
//!         Start => "sta1",
//!         Ready => "rea1",
//!         Done => "don1",
//!     }
//! }
//!
//! #[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
//! struct Fields {
//!     ready: bool,
//! }
//!
//! impl StageFields for Fields {}
//!
//! let mut stage = StageBuilder::<Step, Fields>::new()
//!     .gate(Step::Ready, |f| f.ready)
//!     .loaded()
//!     .build()
//!     .unwrap();
//!
//! assert!(!stage.can_transition(TransitionTarget::Next));
//! stage.update(&StoryState::default(), |f| f.ready = true);
//! assert_eq!(stage.transition_next().unwrap().current(), Step::Ready);
//!
//! let record = stage.snapshot().unwrap();
//! assert_eq!(record.current_step(), Some(&serde_json::json!(1)));
//! ```

pub mod builder;
pub mod core;
pub mod effects;
pub mod error;
pub mod logging;
pub mod persist;
pub mod render;
pub mod session;
pub mod stage;
pub mod stages;
pub mod story;

// Re-export commonly used types
pub use builder::{BuildError, StageBuilder};
pub use core::{Gate, GateRegistry, GateVerdict, Marker, MarkerRef, TransitionLog, TransitionRecord};
pub use error::StageError;
pub use persist::{PersistError, StageCheckpoint, StageRecord, StageStore};
pub use session::{Session, SessionConfig, StageSession};
pub use stage::{StageFields, StageState, TransitionOutcome, TransitionQuery, TransitionTarget};
pub use story::StoryState;
