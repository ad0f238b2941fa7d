//! Stage state: the current marker, stage fields and the transitions
//! between markers.

mod fields;
mod state;
mod subflow;
mod transition;

pub use fields::StageFields;
pub use state::StageState;
pub use subflow::{Slideshow, SubFlowScope};
pub use transition::{TransitionOutcome, TransitionQuery, TransitionTarget};
