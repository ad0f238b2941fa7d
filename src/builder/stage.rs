//! Builder for constructing stages.

use crate::builder::error::BuildError;
use crate::core::{Gate, GateRegistry, Marker};
use crate::stage::{StageFields, StageState};

/// Builder for a [`StageState`] with a fluent API.
///
/// Gates may be registered by marker or by marker name. Registering two
/// gates for the same marker is an error, so a stage definition cannot
/// silently shadow one of its own gates.
pub struct StageBuilder<M: Marker, F: StageFields> {
    fields: F,
    gates: Vec<(M, Gate<F>)>,
    unknown: Vec<String>,
    initial: Option<M>,
    loaded: bool,
}

impl<M: Marker, F: StageFields> StageBuilder<M, F> {
    /// Create a new builder with default fields.
    pub fn new() -> Self {
        Self {
            fields: F::default(),
            gates: Vec::new(),
            unknown: Vec::new(),
            initial: None,
            loaded: false,
        }
    }

    /// Set the initial field values.
    pub fn fields(mut self, fields: F) -> Self {
        self.fields = fields;
        self
    }

    /// Guard `marker` with a predicate over the stage fields.
    pub fn gate<P>(mut self, marker: M, predicate: P) -> Self
    where
        P: Fn(&F) -> bool + Send + Sync + 'static,
    {
        self.gates.push((marker, Gate::new(predicate)));
        self
    }

    /// Guard the marker called `name`.
    pub fn gate_named<P>(mut self, name: &str, predicate: P) -> Self
    where
        P: Fn(&F) -> bool + Send + Sync + 'static,
    {
        match M::from_name(name) {
            Some(marker) => self.gates.push((marker, Gate::new(predicate))),
            None => self.unknown.push(name.to_string()),
        }
        self
    }

    /// Start somewhere other than the first marker.
    pub fn initial(mut self, marker: M) -> Self {
        self.initial = Some(marker);
        self
    }

    /// Build a stage that does not wait for persisted state.
    pub fn loaded(mut self) -> Self {
        self.loaded = true;
        self
    }

    /// Build the stage.
    pub fn build(self) -> Result<StageState<M, F>, BuildError> {
        if let Some(name) = self.unknown.into_iter().next() {
            return Err(BuildError::UnknownMarker {
                stage: M::STAGE,
                name,
            });
        }

        let mut registry = GateRegistry::new();
        for (marker, gate) in self.gates {
            if registry.insert(marker, gate).is_some() {
                return Err(BuildError::DuplicateGate {
                    stage: M::STAGE,
                    marker: marker.name(),
                });
            }
        }

        Ok(StageState::from_parts(
            self.initial.unwrap_or_else(M::first),
            self.fields,
            registry,
            self.loaded,
        ))
    }
}

impl<M: Marker, F: StageFields> Default for StageBuilder<M, F> {
    fn default() -> Self {
        Self::new()
    }
}
