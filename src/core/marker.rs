//! Ordered marker sequences.
//!
//! A marker is one named step in a stage's linear progression. Every stage
//! declares its markers once, as a fieldless enum, and the declaration order
//! is the sequence order. Markers carry no state of their own; a
//! [`StageState`](crate::stage::StageState) points at exactly one of them.

use crate::error::StageError;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt::{self, Debug, Display};
use std::hash::Hash;

/// Trait for the steps of a stage.
///
/// Ordinals are contiguous and start at 0, in declaration order. The
/// [`marker_enum!`](crate::marker_enum) macro generates conforming
/// implementations; hand-written implementations must keep `all()` non-empty
/// and `all()[i].ordinal() == i`.
///
/// Navigation clamps at both ends: `next` of the last marker and `previous`
/// of the first marker return the marker unchanged.
///
/// # Example
///
/// ```rust
/// use hubble_stages::core::Marker;
/// use hubble_stages::marker_enum;
///
/// marker_enum! {
///     stage: "demo";
///     enum Step {
///         Intro => "intro1",
///         Measure => "mea1",
///         Done => "end1",
///     }
/// }
///
/// assert_eq!(Step::first(), Step::Intro);
/// assert_eq!(Step::Intro.next(), Step::Measure);
/// assert_eq!(Step::Done.next(), Step::Done);
/// assert!(Step::Measure.is_between(Step::Intro, None));
/// assert_eq!(Step::Measure.gate_name(), "mea1_gate");
/// ```
pub trait Marker:
    Copy + Eq + Ord + Hash + Debug + Serialize + for<'de> Deserialize<'de> + Send + Sync + 'static
{
    /// Name of the stage owning this sequence.
    const STAGE: &'static str;

    /// Every marker of the sequence, in order.
    fn all() -> &'static [Self];

    /// Unique identifier of the marker within its stage.
    fn name(&self) -> &'static str;

    /// Position of the marker in the sequence.
    fn ordinal(&self) -> u32;

    fn from_ordinal(ordinal: u32) -> Option<Self> {
        Self::all().get(ordinal as usize).copied()
    }

    fn from_name(name: &str) -> Option<Self> {
        Self::all().iter().copied().find(|m| m.name() == name)
    }

    fn first() -> Self {
        Self::all()[0]
    }

    fn last() -> Self {
        let all = Self::all();
        all[all.len() - 1]
    }

    fn is_first(&self) -> bool {
        *self == Self::first()
    }

    fn is_last(&self) -> bool {
        *self == Self::last()
    }

    /// The following marker, or `self` at the end of the sequence.
    fn next(&self) -> Self {
        Self::from_ordinal(self.ordinal() + 1).unwrap_or(*self)
    }

    /// The preceding marker, or `self` at the start of the sequence.
    fn previous(&self) -> Self {
        self.ordinal()
            .checked_sub(1)
            .and_then(Self::from_ordinal)
            .unwrap_or(*self)
    }

    /// Inclusive range check. A missing `end` means the last marker.
    fn is_between(&self, start: Self, end: Option<Self>) -> bool {
        let end = end.unwrap_or_else(Self::last);
        start.ordinal() <= self.ordinal() && self.ordinal() <= end.ordinal()
    }

    /// Name under which the gate guarding this marker is reported.
    fn gate_name(&self) -> String {
        format!("{}_gate", self.name())
    }

    fn erase(&self) -> MarkerRef {
        MarkerRef {
            stage: Self::STAGE,
            name: self.name(),
            ordinal: self.ordinal(),
        }
    }
}

/// A marker with its stage type erased.
///
/// Used where markers of several stages meet (diagnostics, the rendering
/// boundary). Ordering is only defined between markers of the same stage,
/// so comparison is fallible.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MarkerRef {
    stage: &'static str,
    name: &'static str,
    ordinal: u32,
}

impl MarkerRef {
    pub fn stage(&self) -> &'static str {
        self.stage
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn ordinal(&self) -> u32 {
        self.ordinal
    }

    /// Compare two markers by ordinal.
    ///
    /// Fails with [`StageError::InvalidArgument`] when the markers belong to
    /// different stages.
    pub fn try_cmp(&self, other: &MarkerRef) -> Result<Ordering, StageError> {
        if self.stage != other.stage {
            return Err(StageError::InvalidArgument(format!(
                "cannot compare marker '{self}' with marker '{other}' of another stage"
            )));
        }
        Ok(self.ordinal.cmp(&other.ordinal))
    }

    /// Recover the typed marker.
    pub fn downcast<M: Marker>(&self) -> Result<M, StageError> {
        if self.stage != M::STAGE {
            return Err(StageError::InvalidArgument(format!(
                "marker '{self}' does not belong to stage '{}'",
                M::STAGE
            )));
        }
        M::from_ordinal(self.ordinal).ok_or_else(|| {
            StageError::InvalidArgument(format!("marker '{self}' is not part of its sequence"))
        })
    }
}

impl Display for MarkerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.stage, self.name)
    }
}
