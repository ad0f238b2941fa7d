//! Stage-specific field sets.

use crate::story::StoryState;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// The mutable fields a stage tracks next to its current marker.
///
/// Fields must serialize to a JSON object whose keys are the persisted field
/// names; `current_step` is reserved for the marker ordinal. Deriving with
/// `#[serde(default)]` lets older records that lack newer fields restore.
///
/// # Example
///
/// ```rust
/// use hubble_stages::stage::StageFields;
/// use hubble_stages::story::StoryState;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
/// #[serde(default)]
/// struct Fields {
///     total_galaxies: usize,
///     tool_activated: bool,
/// }
///
/// impl StageFields for Fields {
///     fn derive(&mut self, story: &StoryState) {
///         self.total_galaxies = story.measurements.len();
///     }
/// }
/// ```
pub trait StageFields:
    Clone + PartialEq + Debug + Default + Serialize + for<'de> Deserialize<'de> + Send + Sync + 'static
{
    /// Recompute fields mirrored from story state.
    ///
    /// Runs after every batch of field updates and after restoration. It
    /// must not depend on the current marker.
    fn derive(&mut self, _story: &StoryState) {}

    /// Inspect freshly restored fields before the derived pass corrects
    /// them. Only runs on restore.
    fn reconcile(&mut self, _story: &StoryState) {}
}
