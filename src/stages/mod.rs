//! The stages of the Hubble's Law story.
//!
//! Each stage module declares its marker sequence, its fields with their
//! derived-update pass, the gate table (`stage()`) and the business-rule
//! operations the page triggers on top of plain next/back.

pub mod distance_measurements;
pub mod examining_data;
pub mod explore_data;
pub mod spectra_velocity;

/// Galaxies each student measures.
pub const GALAXY_COUNT: usize = 5;

pub use distance_measurements::{DistanceFields, DistanceMarker};
pub use examining_data::{ExaminingFields, ExaminingMarker};
pub use explore_data::{ExploreFields, ExploreMarker};
pub use spectra_velocity::{SpectraFields, SpectraMarker};
