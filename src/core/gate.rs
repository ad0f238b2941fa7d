//! Transition gates.
//!
//! A gate is a pure predicate over a stage's fields that decides whether the
//! student may move forward into a given marker. Gates are registered in an
//! explicit table keyed by marker when the stage is built.

use super::marker::Marker;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::warn;

/// Pure predicate guarding entry into a marker.
///
/// # Example
///
/// ```rust
/// use hubble_stages::core::Gate;
///
/// struct Fields {
///     ready: bool,
/// }
///
/// let gate = Gate::new(|f: &Fields| f.ready);
///
/// assert!(gate.check(&Fields { ready: true }));
/// assert!(!gate.check(&Fields { ready: false }));
/// ```
pub struct Gate<F> {
    predicate: Arc<dyn Fn(&F) -> bool + Send + Sync>,
}

impl<F> Gate<F> {
    /// Create a gate from a predicate.
    ///
    /// The predicate must not have side effects; it is evaluated every time
    /// the rendering layer asks whether "Next" is enabled.
    pub fn new<P>(predicate: P) -> Self
    where
        P: Fn(&F) -> bool + Send + Sync + 'static,
    {
        Self {
            predicate: Arc::new(predicate),
        }
    }

    pub fn check(&self, fields: &F) -> bool {
        (self.predicate)(fields)
    }
}

impl<F> Clone for Gate<F> {
    fn clone(&self) -> Self {
        Self {
            predicate: Arc::clone(&self.predicate),
        }
    }
}

impl<F> fmt::Debug for Gate<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Gate(..)")
    }
}

/// How a transition target was judged.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GateVerdict {
    /// A gate is registered and returned true.
    Passed,
    /// A gate is registered and returned false.
    Failed,
    /// No gate is registered; the transition is allowed by default.
    Ungated,
    /// Gate evaluation was bypassed.
    Forced,
}

impl GateVerdict {
    pub fn allows(&self) -> bool {
        !matches!(self, Self::Failed)
    }
}

/// Table of gates for one stage, keyed by the marker each gate guards.
pub struct GateRegistry<M: Marker, F> {
    gates: HashMap<M, Gate<F>>,
}

impl<M: Marker, F> GateRegistry<M, F> {
    pub fn new() -> Self {
        Self {
            gates: HashMap::new(),
        }
    }

    /// Register a gate, returning the one it replaces.
    pub fn insert(&mut self, marker: M, gate: Gate<F>) -> Option<Gate<F>> {
        self.gates.insert(marker, gate)
    }

    /// Register a predicate for `marker`, builder style.
    pub fn with<P>(mut self, marker: M, predicate: P) -> Self
    where
        P: Fn(&F) -> bool + Send + Sync + 'static,
    {
        self.gates.insert(marker, Gate::new(predicate));
        self
    }

    pub fn resolve(&self, target: &M) -> Option<&Gate<F>> {
        self.gates.get(target)
    }

    pub fn contains(&self, target: &M) -> bool {
        self.gates.contains_key(target)
    }

    pub fn len(&self) -> usize {
        self.gates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.gates.is_empty()
    }

    /// Markers that have a gate, in sequence order.
    pub fn guarded_markers(&self) -> Vec<M> {
        let mut markers: Vec<M> = self.gates.keys().copied().collect();
        markers.sort();
        markers
    }

    /// Evaluate the gate for `target` against `fields`.
    ///
    /// Markers without a gate are allowed; that fallback is reported as a
    /// warning so missing gates stay visible.
    pub fn evaluate(&self, fields: &F, target: M) -> GateVerdict {
        match self.resolve(&target) {
            Some(gate) if gate.check(fields) => GateVerdict::Passed,
            Some(_) => GateVerdict::Failed,
            None => {
                warn!(
                    stage = M::STAGE,
                    gate = %target.gate_name(),
                    "No gate exists for step {}, allowing anyway",
                    target.name()
                );
                GateVerdict::Ungated
            }
        }
    }
}

impl<M: Marker, F> Default for GateRegistry<M, F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: Marker, F> Clone for GateRegistry<M, F> {
    fn clone(&self) -> Self {
        Self {
            gates: self.gates.clone(),
        }
    }
}

impl<M: Marker, F> fmt::Debug for GateRegistry<M, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GateRegistry")
            .field("guarded", &self.guarded_markers())
            .finish()
    }
}
