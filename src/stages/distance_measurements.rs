//! Stage 3: angular sizes and distances.

use super::GALAXY_COUNT;
use crate::builder::{BuildError, StageBuilder};
use crate::error::StageError;
use crate::marker_enum;
use crate::session::StageSession;
use crate::stage::{StageFields, StageState, TransitionOutcome};
use crate::story::StoryState;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Distance in Mpc times angular size in arcseconds for a galaxy the size
/// of the Milky Way.
pub const DISTANCE_CONSTANT: f64 = 6200.0;

marker_enum! {
    stage: "distance_measurements";
    pub enum DistanceMarker {
        AngSiz1 => "ang_siz1",
        ChoRow1 => "cho_row1",
        AngSiz2 => "ang_siz2",
        AngSiz2b => "ang_siz2b",
        AngSiz3 => "ang_siz3",
        AngSiz4 => "ang_siz4",
        AngSiz5 => "ang_siz5",
        EstDis1 => "est_dis1",
        EstDis2 => "est_dis2",
        EstDis3 => "est_dis3",
        EstDis4 => "est_dis4",
        DotSeq1 => "dot_seq1",
        DotSeq2 => "dot_seq2",
        DotSeq3 => "dot_seq3",
        DotSeq4 => "dot_seq4",
        DotSeq4a => "dot_seq4a",
        AngSiz5a => "ang_siz5a",
        AngSiz6 => "ang_siz6",
        DotSeq5 => "dot_seq5",
        DotSeq5a => "dot_seq5a",
        DotSeq5b => "dot_seq5b",
        DotSeq5c => "dot_seq5c",
        DotSeq6 => "dot_seq6",
        DotSeq7 => "dot_seq7",
        RepRem1 => "rep_rem1",
        FilRem1 => "fil_rem1",
    }
}

pub fn distance_from_angular_size(angular_size: f64) -> Option<f64> {
    (angular_size > 0.0).then(|| DISTANCE_CONSTANT / angular_size)
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DistanceFields {
    pub selected_galaxy: Option<String>,
    pub selected_example_galaxy: Option<String>,
    pub show_ruler: bool,
    pub ruler_click_count: u32,
    pub n_meas: u32,
    pub meas_theta: f64,
    pub dosdonts_tutorial_opened: bool,
    pub bad_measurement: bool,
    pub example_angular_sizes_total: usize,
    pub angular_sizes_total: usize,
    pub distances_total: usize,
    pub fill_est_dist_values: bool,
    pub angular_size_line: Option<f64>,
    pub distance_line: Option<f64>,
    pub show_dotplot_lines: bool,
}

impl StageFields for DistanceFields {
    fn derive(&mut self, story: &StoryState) {
        self.example_angular_sizes_total = story
            .example_measurements
            .iter()
            .filter(|m| m.ang_size.is_some())
            .count();
        self.angular_sizes_total = story
            .measurements
            .iter()
            .filter(|m| m.ang_size.is_some())
            .count();
        self.distances_total = story
            .measurements
            .iter()
            .filter(|m| m.est_dist.is_some())
            .count();
    }
}

pub type DistanceStage = StageState<DistanceMarker, DistanceFields>;
pub type DistanceSession = StageSession<DistanceMarker, DistanceFields>;

/// Build stage 3, waiting for persisted state.
pub fn stage() -> Result<DistanceStage, BuildError> {
    use DistanceMarker::*;

    StageBuilder::new()
        .gate(AngSiz2, |f: &DistanceFields| f.selected_example_galaxy.is_some())
        .gate(AngSiz3, |f: &DistanceFields| f.dosdonts_tutorial_opened)
        .gate(AngSiz4, |f: &DistanceFields| f.ruler_click_count >= 1)
        .gate(AngSiz5, |f: &DistanceFields| f.n_meas >= 1)
        .gate(EstDis1, |f: &DistanceFields| {
            f.meas_theta > 0.0 && !f.bad_measurement
        })
        .gate(RepRem1, |f: &DistanceFields| f.example_angular_sizes_total >= 1)
        .gate(FilRem1, |f: &DistanceFields| {
            f.angular_sizes_total == GALAXY_COUNT && f.distances_total == GALAXY_COUNT
        })
        .build()
}

/// Choose the example galaxy. At `cho_row1` this moves on to the first
/// angular size step.
pub fn select_example_galaxy(
    session: &mut DistanceSession,
    story: &StoryState,
    galaxy_id: Option<String>,
) -> Result<Option<TransitionOutcome<DistanceMarker>>, StageError> {
    info!(selected_example_galaxy = ?galaxy_id, "Example galaxy selected");
    session.update(story, |f| f.selected_example_galaxy = galaxy_id)?;
    if session.state().is_current_step(DistanceMarker::ChoRow1) {
        return session.transition_to(DistanceMarker::AngSiz2, false).map(Some);
    }
    Ok(None)
}

pub fn select_galaxy(
    session: &mut DistanceSession,
    story: &StoryState,
    galaxy_id: Option<String>,
) -> Result<(), StageError> {
    session.update(story, |f| {
        f.selected_galaxy = galaxy_id;
        f.bad_measurement = false;
    })
}

/// The ruler was clicked. The first click at `ang_siz3` moves on.
pub fn ruler_clicked(
    session: &mut DistanceSession,
    story: &StoryState,
) -> Result<Option<TransitionOutcome<DistanceMarker>>, StageError> {
    session.update(story, |f| f.ruler_click_count += 1)?;
    let state = session.state();
    if state.is_current_step(DistanceMarker::AngSiz3) && state.fields().ruler_click_count == 1 {
        return session.transition_to(DistanceMarker::AngSiz4, false).map(Some);
    }
    Ok(None)
}

/// The distance tool flagged the last measurement as unusable.
pub fn flag_bad_measurement(session: &mut DistanceSession, story: &StoryState) -> Result<(), StageError> {
    session.update(story, |f| f.bad_measurement = true)
}

/// Angular size of the example galaxy. The first one at `ang_siz4` moves on.
pub fn measure_example_angular_size(
    session: &mut DistanceSession,
    story: &mut StoryState,
    theta: f64,
) -> Result<Option<TransitionOutcome<DistanceMarker>>, StageError> {
    if let Some(galaxy) = session.state().fields().selected_example_galaxy.clone() {
        if let Some(mut measurement) = story.example_measurement(&galaxy).cloned() {
            measurement.ang_size = Some(theta);
            story.upsert_example_measurement(measurement);
        }
    }

    session.update(story, |f| {
        f.n_meas += 1;
        f.meas_theta = theta;
        f.bad_measurement = false;
    })?;

    let state = session.state();
    if state.is_current_step(DistanceMarker::AngSiz4) && state.fields().n_meas == 1 {
        return session.transition_to(DistanceMarker::AngSiz5, false).map(Some);
    }
    Ok(None)
}

/// Angular size of one of the student's galaxies, with its distance.
pub fn measure_angular_size(
    session: &mut DistanceSession,
    story: &mut StoryState,
    galaxy_id: &str,
    theta: f64,
) -> Result<Option<f64>, StageError> {
    let Some(mut measurement) = story.measurement(galaxy_id).cloned() else {
        return Ok(None);
    };
    let distance = distance_from_angular_size(theta).map(f64::round);
    measurement.ang_size = Some(theta);
    measurement.est_dist = distance;
    story.upsert_measurement(measurement);
    debug!(galaxy = galaxy_id, theta, ?distance, "Angular size measured");

    session.update(story, |f| f.meas_theta = theta)?;
    Ok(distance)
}

/// Skip the second example measurement, as the dot plot sequence does.
pub fn skip_second_measurement(
    session: &mut DistanceSession,
) -> Result<TransitionOutcome<DistanceMarker>, StageError> {
    session.transition_to(DistanceMarker::DotSeq5b, false)
}

pub fn force_to_remaining_galaxies(
    session: &mut DistanceSession,
) -> Result<TransitionOutcome<DistanceMarker>, StageError> {
    session.transition_to(DistanceMarker::RepRem1, true)
}

/// Back from `rep_rem1` returns to the dot plot rather than `dot_seq7`.
pub fn back_from_remaining_galaxies(
    session: &mut DistanceSession,
) -> Result<TransitionOutcome<DistanceMarker>, StageError> {
    session.transition_to(DistanceMarker::DotSeq5, true)
}

/// Dot plot reference lines are shown from `dot_seq4a` on.
pub fn sync_dotplot_lines(session: &mut DistanceSession, story: &StoryState) -> Result<(), StageError> {
    let show = session
        .state()
        .current_step_at_or_after(DistanceMarker::DotSeq4a);
    if session.state().fields().show_dotplot_lines == show {
        return Ok(());
    }
    session.update(story, |f| f.show_dotplot_lines = show)
}
