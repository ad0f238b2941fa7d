//! Story-wide state shared by every stage.
//!
//! One `StoryState` exists per session. Stages never hold it; they read it
//! during their derived-update pass and gates see the mirrored values only.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Rest wavelengths, in angstroms, of the lines students measure.
pub const ELEMENT_REST: [(&str, f64); 2] = [("H-α", 6562.79), ("Mg-I", 5176.7)];

/// Fractional redshift error above which a wavelength counts as poorly measured.
pub const DEFAULT_WAVELENGTH_TOLERANCE: f64 = 0.5;

pub fn rest_wavelength(element: &str) -> Option<f64> {
    ELEMENT_REST
        .iter()
        .find(|(name, _)| *name == element)
        .map(|(_, wave)| *wave)
}

/// One student's measurement record for one galaxy.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub galaxy_id: String,
    pub rest_wave: Option<f64>,
    pub obs_wave: Option<f64>,
    /// Catalogue redshift of the galaxy.
    pub z: Option<f64>,
    pub velocity: Option<f64>,
    pub ang_size: Option<f64>,
    pub est_dist: Option<f64>,
}

impl Measurement {
    pub fn new(galaxy_id: impl Into<String>) -> Self {
        Self {
            galaxy_id: galaxy_id.into(),
            ..Self::default()
        }
    }

    /// Whether the observed wavelength implies a redshift too far from the
    /// catalogue value. Incomplete records are never flagged.
    pub fn is_wavelength_poorly_measured(&self, tolerance: f64) -> bool {
        match (self.obs_wave, self.rest_wave, self.z) {
            (Some(obs), Some(rest), Some(z)) if rest != 0.0 && z != 0.0 => {
                let z_meas = (obs - rest) / rest;
                ((z_meas - z) / z).abs() > tolerance
            }
            _ => false,
        }
    }
}

/// Multiple-choice question scoring, keyed by question tag.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct McScore {
    pub tag: String,
    pub score: Option<f64>,
    pub choice: Option<u32>,
    pub tries: u32,
    pub wrong_attempts: u32,
}

impl McScore {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Self::default()
        }
    }

    pub fn is_answered(&self) -> bool {
        self.score.is_some()
    }
}

/// State of the whole story for one student.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoryState {
    pub debug_mode: bool,
    pub title: String,
    pub started: bool,
    pub measurements: Vec<Measurement>,
    pub example_measurements: Vec<Measurement>,
    pub validation_failure_counts: BTreeMap<String, u32>,
    pub has_best_fit_galaxy: bool,
    pub enough_students_ready: bool,
    pub class_data_students: Vec<u64>,
    pub mc_scoring: BTreeMap<String, McScore>,
}

impl Default for StoryState {
    fn default() -> Self {
        Self {
            debug_mode: false,
            title: "Hubble's Law".to_string(),
            started: false,
            measurements: Vec::new(),
            example_measurements: Vec::new(),
            validation_failure_counts: BTreeMap::new(),
            has_best_fit_galaxy: false,
            enough_students_ready: false,
            class_data_students: Vec::new(),
            mc_scoring: BTreeMap::new(),
        }
    }
}

impl StoryState {
    pub fn measurement(&self, galaxy_id: &str) -> Option<&Measurement> {
        self.measurements.iter().find(|m| m.galaxy_id == galaxy_id)
    }

    pub fn example_measurement(&self, galaxy_id: &str) -> Option<&Measurement> {
        self.example_measurements
            .iter()
            .find(|m| m.galaxy_id == galaxy_id)
    }

    /// Insert or replace the measurement for its galaxy.
    pub fn upsert_measurement(&mut self, measurement: Measurement) {
        upsert(&mut self.measurements, measurement);
    }

    pub fn upsert_example_measurement(&mut self, measurement: Measurement) {
        upsert(&mut self.example_measurements, measurement);
    }

    /// Count of measurements whose observed wavelength is off by more than
    /// `tolerance`.
    pub fn bad_velocity_count(&self, tolerance: f64) -> usize {
        self.measurements
            .iter()
            .filter(|m| m.is_wavelength_poorly_measured(tolerance))
            .count()
    }

    /// Register a question tag. Returns `false` if it was already known.
    pub fn init_mc_response(&mut self, tag: &str) -> bool {
        if self.mc_scoring.contains_key(tag) {
            return false;
        }
        self.mc_scoring.insert(tag.to_string(), McScore::new(tag));
        true
    }

    pub fn record_mc_score(&mut self, score: McScore) {
        self.mc_scoring.insert(score.tag.clone(), score);
    }

    pub fn mc_answered(&self, tag: &str) -> bool {
        self.mc_scoring.get(tag).is_some_and(McScore::is_answered)
    }

    /// Bump the failure counter for a validation point, returning the new count.
    pub fn record_validation_failure(&mut self, key: &str) -> u32 {
        let count = self
            .validation_failure_counts
            .entry(key.to_string())
            .or_insert(0);
        *count += 1;
        *count
    }
}

fn upsert(list: &mut Vec<Measurement>, measurement: Measurement) {
    match list
        .iter_mut()
        .find(|m| m.galaxy_id == measurement.galaxy_id)
    {
        Some(existing) => *existing = measurement,
        None => list.push(measurement),
    }
}
