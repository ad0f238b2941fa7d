//! Builder API for declaring stages.
//!
//! `marker_enum!` declares a marker sequence with minimal boilerplate and
//! [`StageBuilder`] assembles fields and gates into a [`StageState`].
//!
//! # Example
//!
//! ```
//! use hubble_stages::builder::StageBuilder;
//! use hubble_stages::marker_enum;
//! use hubble_stages::stage::StageFields;
//! use serde::{Deserialize, Serialize};
//!
//! marker_enum! {
//!     stage: "demo";
//!     enum Step {
//!         Intro => "int1",
//!         Measure => "mea1",
//!     }
//! }
//!
//! #[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
//! struct Fields {
//!     tool_used: bool,
//! }
//!
//! impl StageFields for Fields {}
//!
//! let mut stage = StageBuilder::<Step, Fields>::new()
//!     .gate(Step::Measure, |f| f.tool_used)
//!     .loaded()
//!     .build()
//!     .unwrap();
//!
//! assert!(stage.transition_next().unwrap().is_rejected());
//! ```
//!
//! [`StageState`]: crate::stage::StageState

pub mod error;
pub mod macros;
pub mod stage;

pub use error::BuildError;
pub use stage::StageBuilder;
