//! Effectful persistence operations using Stillwater 0.11.0.
//!
//! This module is the imperative shell around the pure stage core: every
//! read or write of the store is an effect over a [`StoreEnv`], run by the
//! session layer.
//!
//! Following Stillwater 0.11.0 conventions, effects are built with
//! `from_fn()` and returned as `BoxedEffect` so the session can hold them
//! before running.

mod store;

pub use store::{load_stage_record, load_story, save_stage_record, save_story, StoreEnv};
