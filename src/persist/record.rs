//! Flat stage records as exchanged with the store.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Reserved record key holding the marker ordinal.
pub const CURRENT_STEP_KEY: &str = "current_step";

/// Field-name to value mapping for one stage of one student.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StageRecord(Map<String, Value>);

impl StageRecord {
    pub fn new() -> Self {
        Self(Map::new())
    }

    pub fn from_map(map: Map<String, Value>) -> Self {
        Self(map)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(key.into(), value)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    pub fn current_step(&self) -> Option<&Value> {
        self.0.get(CURRENT_STEP_KEY)
    }

    /// Every entry except `current_step`.
    pub fn field_map(&self) -> Map<String, Value> {
        let mut map = self.0.clone();
        map.remove(CURRENT_STEP_KEY);
        map
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Identity of a stage record: story, student and stage.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StageKey {
    pub story: String,
    pub student_id: u64,
    pub stage: String,
}

impl StageKey {
    pub fn new(story: impl Into<String>, student_id: u64, stage: impl Into<String>) -> Self {
        Self {
            story: story.into(),
            student_id,
            stage: stage.into(),
        }
    }
}

impl fmt::Display for StageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.story, self.student_id, self.stage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn field_map_excludes_current_step() {
        let mut record = StageRecord::new();
        record.insert(CURRENT_STEP_KEY, json!(3));
        record.insert("total_galaxies", json!(5));

        let fields = record.field_map();
        assert_eq!(fields.len(), 1);
        assert_eq!(record.current_step(), Some(&json!(3)));
        assert_eq!(record.len(), 2);
    }

    #[test]
    fn record_serializes_flat() {
        let mut record = StageRecord::new();
        record.insert(CURRENT_STEP_KEY, json!(1));
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json, json!({ "current_step": 1 }));
    }

    #[test]
    fn key_display() {
        let key = StageKey::new("hubbles_law", 42, "spectra_velocity");
        assert_eq!(key.to_string(), "hubbles_law/42/spectra_velocity");
    }
}
