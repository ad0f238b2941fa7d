//! Persistence boundary for stage state.
//!
//! A stage is stored as a flat record: its fields by name plus the marker
//! ordinal under `current_step`. On restore the ordinal is applied last,
//! after every other field, so nothing observing the fields can move the
//! marker while the record is being applied.

mod checkpoint;
mod codec;
mod error;
mod record;
mod store;

pub use checkpoint::{StageCheckpoint, CHECKPOINT_VERSION};
pub use codec::{decode_record, encode_record, validate_record};
pub use error::{PersistError, RestoreViolation, StoreError};
pub use record::{StageKey, StageRecord, CURRENT_STEP_KEY};
pub use store::{InMemoryStore, StageStore};
