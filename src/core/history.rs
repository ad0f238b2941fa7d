//! Transition history tracking.
//!
//! Keeps an immutable log of the marker transitions a stage has applied.
//! Rejected transitions never reach the log.

use super::gate::GateVerdict;
use super::marker::Marker;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Record of a single applied transition.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct TransitionRecord<M: Marker> {
    /// The marker being left
    pub from: M,
    /// The marker being entered
    pub to: M,
    /// When the transition was applied
    pub timestamp: DateTime<Utc>,
    /// How the target was judged
    pub verdict: GateVerdict,
}

/// Ordered log of applied transitions.
///
/// The log is immutable - `record` returns a new log with the transition
/// appended.
///
/// # Example
///
/// ```rust
/// use chrono::Utc;
/// use hubble_stages::core::{GateVerdict, TransitionLog, TransitionRecord};
/// use hubble_stages::marker_enum;
///
/// marker_enum! {
///     stage: "demo";
///     enum Step {
///         A => "a1",
///         B => "b1",
///         C => "c1",
///     }
/// }
///
/// let log = TransitionLog::new()
///     .record(TransitionRecord {
///         from: Step::A,
///         to: Step::C,
///         timestamp: Utc::now(),
///         verdict: GateVerdict::Forced,
///     });
///
/// assert_eq!(log.get_path(), vec![&Step::A, &Step::C]);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct TransitionLog<M: Marker> {
    transitions: Vec<TransitionRecord<M>>,
}

impl<M: Marker> Default for TransitionLog<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: Marker> TransitionLog<M> {
    pub fn new() -> Self {
        Self {
            transitions: Vec::new(),
        }
    }

    /// Record a transition, returning a new log. The original is unchanged.
    pub fn record(&self, transition: TransitionRecord<M>) -> Self {
        let mut transitions = self.transitions.clone();
        transitions.push(transition);
        Self { transitions }
    }

    /// Markers visited: the first `from`, then every `to`.
    pub fn get_path(&self) -> Vec<&M> {
        let mut path = Vec::new();
        if let Some(first) = self.transitions.first() {
            path.push(&first.from);
        }
        for transition in &self.transitions {
            path.push(&transition.to);
        }
        path
    }

    /// Time between the first and the last recorded transition.
    pub fn duration(&self) -> Option<Duration> {
        if let (Some(first), Some(last)) = (self.transitions.first(), self.transitions.last()) {
            let duration = last.timestamp.signed_duration_since(first.timestamp);
            duration.to_std().ok()
        } else {
            None
        }
    }

    /// Number of transitions that bypassed their gate.
    pub fn forced_count(&self) -> usize {
        self.transitions
            .iter()
            .filter(|t| t.verdict == GateVerdict::Forced)
            .count()
    }

    pub fn last(&self) -> Option<&TransitionRecord<M>> {
        self.transitions.last()
    }

    pub fn transitions(&self) -> &[TransitionRecord<M>] {
        &self.transitions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    crate::marker_enum! {
        stage: "test";
        enum TestMarker {
            Start => "sta1",
            Middle => "mid1",
            End => "end1",
        }
    }

    fn record(from: TestMarker, to: TestMarker, verdict: GateVerdict) -> TransitionRecord<TestMarker> {
        TransitionRecord {
            from,
            to,
            timestamp: Utc::now(),
            verdict,
        }
    }

    #[test]
    fn new_log_is_empty() {
        let log: TransitionLog<TestMarker> = TransitionLog::new();
        assert!(log.transitions().is_empty());
        assert!(log.get_path().is_empty());
        assert!(log.duration().is_none());
    }

    #[test]
    fn record_is_immutable() {
        let log = TransitionLog::new();
        let next = log.record(record(TestMarker::Start, TestMarker::Middle, GateVerdict::Passed));
        assert_eq!(log.transitions().len(), 0);
        assert_eq!(next.transitions().len(), 1);
    }

    #[test]
    fn path_follows_recorded_transitions() {
        let log = TransitionLog::new()
            .record(record(TestMarker::Start, TestMarker::End, GateVerdict::Forced))
            .record(record(TestMarker::End, TestMarker::Middle, GateVerdict::Forced));

        assert_eq!(
            log.get_path(),
            vec![&TestMarker::Start, &TestMarker::End, &TestMarker::Middle]
        );
        assert_eq!(log.forced_count(), 2);
        assert_eq!(log.last().map(|t| t.to), Some(TestMarker::Middle));
    }

    #[test]
    fn duration_spans_first_to_last() {
        let start = Utc::now();
        let log = TransitionLog::new()
            .record(TransitionRecord {
                from: TestMarker::Start,
                to: TestMarker::Middle,
                timestamp: start,
                verdict: GateVerdict::Ungated,
            })
            .record(TransitionRecord {
                from: TestMarker::Middle,
                to: TestMarker::End,
                timestamp: start + chrono::Duration::seconds(30),
                verdict: GateVerdict::Passed,
            });

        assert_eq!(log.duration(), Some(Duration::from_secs(30)));
    }

    #[test]
    fn log_serializes() {
        let log = TransitionLog::new().record(record(
            TestMarker::Start,
            TestMarker::Middle,
            GateVerdict::Passed,
        ));
        let json = serde_json::to_string(&log).unwrap();
        let restored: TransitionLog<TestMarker> = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, log);
    }
}
