//! Core stage progression types.
//!
//! This module contains the pure building blocks of a stage:
//! - Marker sequences via the `Marker` trait
//! - Gate predicates and the per-stage gate table
//! - Immutable transition history
//!
//! Nothing in this module performs I/O.

mod gate;
mod history;
mod marker;

pub use gate::{Gate, GateRegistry, GateVerdict};
pub use history::{TransitionLog, TransitionRecord};
pub use marker::{Marker, MarkerRef};
