//! Stage 1: measuring spectra and computing recession velocities.
//!
//! Students pick five galaxies, work through an example spectrum with a
//! guided Doppler calculation, then measure the observed wavelength and
//! velocity of each of their own galaxies.

use super::GALAXY_COUNT;
use crate::builder::{BuildError, StageBuilder};
use crate::error::StageError;
use crate::marker_enum;
use crate::session::StageSession;
use crate::stage::{Slideshow, StageFields, StageState, SubFlowScope, TransitionOutcome};
use crate::story::{StoryState, DEFAULT_WAVELENGTH_TOLERANCE};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

/// Speed of light in km/s, as used for student velocities.
pub const SPEED_OF_LIGHT: f64 = 3.0e5;

/// Relative error allowed on the student's value for the speed of light.
pub const SPEED_OF_LIGHT_TOLERANCE: f64 = 0.01;

marker_enum! {
    stage: "spectra_velocity";
    pub enum SpectraMarker {
        MeeGui1 => "mee_gui1",
        SelGal1 => "sel_gal1",
        SelGal2 => "sel_gal2",
        SelGal3 => "sel_gal3",
        SelGal4 => "sel_gal4",
        NotGalTab => "not_gal_tab",
        ChoRow1 => "cho_row1",
        MeeSpe1 => "mee_spe1",
        ResWav1 => "res_wav1",
        ObsWav1 => "obs_wav1",
        ObsWav2 => "obs_wav2",
        DopCal0 => "dop_cal0",
        DopCal1 => "dop_cal1",
        DopCal2 => "dop_cal2",
        DopCal3 => "dop_cal3",
        DopCal4 => "dop_cal4",
        DopCal5 => "dop_cal5",
        CheMea1 => "che_mea1",
        IntDot1 => "int_dot1",
        DotSeq1 => "dot_seq1",
        DotSeq2 => "dot_seq2",
        DotSeq3 => "dot_seq3",
        DotSeq4 => "dot_seq4",
        DotSeq5 => "dot_seq5",
        DotSeq6 => "dot_seq6",
        DotSeq7 => "dot_seq7",
        DotSeq8 => "dot_seq8",
        DotSeq9 => "dot_seq9",
        DotSeq10 => "dot_seq10",
        DotSeq11 => "dot_seq11",
        RefDat1 => "ref_dat1",
        DotSeq12 => "dot_seq12",
        DotSeq13 => "dot_seq13",
        DotSeq14 => "dot_seq14",
        RemGal1 => "rem_gal1",
        DopCal6 => "dop_cal6",
        RefVel1 => "ref_vel1",
        EndSta1 => "end_sta1",
    }
}

/// Markers during which the guided Doppler calculation is on screen.
pub const DOPPLER_SCOPE: SubFlowScope<SpectraMarker> =
    SubFlowScope::new(SpectraMarker::MeeSpe1, SpectraMarker::CheMea1);

/// Markers during which the dot plot tutorial can be opened.
pub const DOTPLOT_SCOPE: SubFlowScope<SpectraMarker> =
    SubFlowScope::new(SpectraMarker::IntDot1, SpectraMarker::DotSeq14);

/// Reflection slideshow steps that need an answer before moving on.
pub const REFLECTION_INTERACT_STEPS: [u32; 5] = [2, 3, 4, 5, 6];

/// State of the guided Doppler calculation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DopplerCalc {
    pub slideshow: Slideshow,
    pub validation_4_failed: bool,
    pub validation_5_failed: bool,
    pub interact_steps_5: Vec<u32>,
    pub student_c: f64,
    pub velocity_calculated: bool,
}

impl Default for DopplerCalc {
    fn default() -> Self {
        Self {
            slideshow: Slideshow::new(6),
            validation_4_failed: false,
            validation_5_failed: false,
            interact_steps_5: vec![3, 4],
            student_c: 0.0,
            velocity_calculated: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpectraFields {
    pub selected_galaxy: Option<String>,
    pub selected_example_galaxy: Option<String>,
    pub total_galaxies: usize,
    pub spectrum_tutorial_opened: bool,
    pub obs_wave_tool_activated: bool,
    pub obs_wave_tool_used: bool,
    pub zoom_tool_activated: bool,
    pub obs_wave: f64,
    pub doppler: DopplerCalc,
    pub show_doppler_dialog: bool,
    pub show_dotplot_tutorial_dialog: bool,
    pub dotplot_tutorial: Slideshow,
    pub dotplot_tutorial_finished: bool,
    pub show_reflection_dialog: bool,
    pub velocity_reflection: Slideshow,
    pub reflection_complete: bool,
    pub obs_wave_total: usize,
    pub velocities_total: usize,
    pub has_bad_velocities: bool,
    pub has_multiple_bad_velocities: bool,
}

impl Default for SpectraFields {
    fn default() -> Self {
        Self {
            selected_galaxy: None,
            selected_example_galaxy: None,
            total_galaxies: 0,
            spectrum_tutorial_opened: false,
            obs_wave_tool_activated: false,
            obs_wave_tool_used: false,
            zoom_tool_activated: false,
            obs_wave: 0.0,
            doppler: DopplerCalc::default(),
            show_doppler_dialog: false,
            show_dotplot_tutorial_dialog: false,
            dotplot_tutorial: Slideshow::new(6),
            dotplot_tutorial_finished: false,
            show_reflection_dialog: false,
            velocity_reflection: Slideshow::new(8),
            reflection_complete: false,
            obs_wave_total: 0,
            velocities_total: 0,
            has_bad_velocities: false,
            has_multiple_bad_velocities: false,
        }
    }
}

impl StageFields for SpectraFields {
    fn derive(&mut self, story: &StoryState) {
        self.total_galaxies = story.measurements.len();
        self.obs_wave_total = story
            .measurements
            .iter()
            .filter(|m| m.obs_wave.is_some())
            .count();
        self.velocities_total = story
            .measurements
            .iter()
            .filter(|m| m.velocity.is_some())
            .count();
        self.has_multiple_bad_velocities =
            story.bad_velocity_count(DEFAULT_WAVELENGTH_TOLERANCE) > 1;
    }

    fn reconcile(&mut self, story: &StoryState) {
        if self.total_galaxies != story.measurements.len() {
            error!(
                stored = self.total_galaxies,
                measurements = story.measurements.len(),
                "Detected mismatch between stored measurements and current recorded number of galaxies"
            );
        }
    }
}

pub type SpectraStage = StageState<SpectraMarker, SpectraFields>;
pub type SpectraSession = StageSession<SpectraMarker, SpectraFields>;

/// Build stage 1, waiting for persisted state.
pub fn stage() -> Result<SpectraStage, BuildError> {
    use SpectraMarker::*;

    StageBuilder::new()
        .gate(SelGal2, |f: &SpectraFields| f.total_galaxies >= 1)
        .gate(SelGal3, |f: &SpectraFields| f.total_galaxies >= 2)
        .gate(SelGal4, |f: &SpectraFields| f.total_galaxies == GALAXY_COUNT)
        .gate(NotGalTab, |f: &SpectraFields| f.total_galaxies == GALAXY_COUNT)
        .gate(MeeSpe1, |f: &SpectraFields| f.selected_example_galaxy.is_some())
        .gate(ResWav1, |f: &SpectraFields| f.spectrum_tutorial_opened)
        .gate(ObsWav1, |f: &SpectraFields| f.obs_wave_tool_activated)
        .gate(ObsWav2, |f: &SpectraFields| f.obs_wave_tool_used)
        .gate(DopCal0, |f: &SpectraFields| {
            f.zoom_tool_activated && f.obs_wave > 0.0
        })
        .gate(CheMea1, |f: &SpectraFields| f.doppler.velocity_calculated)
        .gate(DotSeq1, |f: &SpectraFields| f.dotplot_tutorial_finished)
        .gate(RemGal1, |f: &SpectraFields| f.reflection_complete)
        .gate(DopCal6, |f: &SpectraFields| f.obs_wave_total == GALAXY_COUNT)
        .gate(RefVel1, |f: &SpectraFields| f.velocities_total == GALAXY_COUNT)
        .gate(EndSta1, |f: &SpectraFields| {
            f.velocities_total == GALAXY_COUNT && !f.has_multiple_bad_velocities
        })
        .build()
}

pub fn select_galaxy(
    session: &mut SpectraSession,
    story: &StoryState,
    galaxy_id: Option<String>,
) -> Result<(), StageError> {
    session.update(story, |f| f.selected_galaxy = galaxy_id)
}

pub fn select_example_galaxy(
    session: &mut SpectraSession,
    story: &StoryState,
    galaxy_id: Option<String>,
) -> Result<(), StageError> {
    session.update(story, |f| f.selected_example_galaxy = galaxy_id)
}

/// Observed wavelength of the example galaxy, from the spectrum viewer.
pub fn measure_example_wavelength(
    session: &mut SpectraSession,
    story: &mut StoryState,
    value: f64,
) -> Result<(), StageError> {
    let Some(galaxy) = session.state().fields().selected_example_galaxy.clone() else {
        return Ok(());
    };
    let Some(mut measurement) = story.example_measurement(&galaxy).cloned() else {
        return Ok(());
    };
    measurement.obs_wave = Some(value);
    story.upsert_example_measurement(measurement);

    session.update(story, |f| {
        f.obs_wave_tool_used = true;
        f.obs_wave = value;
    })
}

/// Observed wavelength of the selected galaxy.
///
/// A poorly measured wavelength is not stored; the stage only records
/// that the last attempt was bad. Returns whether the value was accepted.
pub fn measure_wavelength(
    session: &mut SpectraSession,
    story: &mut StoryState,
    value: f64,
) -> Result<bool, StageError> {
    let Some(galaxy) = session.state().fields().selected_galaxy.clone() else {
        return Ok(false);
    };
    let Some(mut measurement) = story.measurement(&galaxy).cloned() else {
        return Ok(false);
    };

    let mut candidate = measurement.clone();
    candidate.obs_wave = Some(value);
    let is_bad = candidate.is_wavelength_poorly_measured(DEFAULT_WAVELENGTH_TOLERANCE);

    if is_bad {
        info!(galaxy = %galaxy, value, "Wavelength measurement is bad");
    } else {
        measurement.obs_wave = Some(value);
        story.upsert_measurement(measurement);
    }

    session.update(story, |f| {
        f.has_bad_velocities = is_bad;
        if !is_bad {
            f.obs_wave = value;
        }
    })?;
    Ok(!is_bad)
}

/// Compute and store the velocity of a measured galaxy.
pub fn calculate_velocity(
    session: &mut SpectraSession,
    story: &mut StoryState,
    galaxy_id: &str,
) -> Result<Option<f64>, StageError> {
    let Some(mut measurement) = story.measurement(galaxy_id).cloned() else {
        return Ok(None);
    };
    let (Some(obs), Some(rest)) = (measurement.obs_wave, measurement.rest_wave) else {
        return Ok(None);
    };

    let velocity = (SPEED_OF_LIGHT * (obs / rest - 1.0)).round();
    measurement.velocity = Some(velocity);
    story.upsert_measurement(measurement);
    session.refresh(story)?;
    Ok(Some(velocity))
}

/// The student finished the Doppler calculation for the example galaxy.
pub fn example_velocity_calculated(
    session: &mut SpectraSession,
    story: &mut StoryState,
    velocity: f64,
) -> Result<(), StageError> {
    if let Some(galaxy) = session.state().fields().selected_example_galaxy.clone() {
        if let Some(mut measurement) = story.example_measurement(&galaxy).cloned() {
            measurement.velocity = Some(velocity.round());
            story.upsert_example_measurement(measurement);
        }
    }
    session.update(story, |f| {
        f.doppler.velocity_calculated = true;
        if f.doppler.interact_steps_5.contains(&f.doppler.slideshow.step) {
            f.doppler.slideshow.complete_current();
        }
    })
}

/// A Doppler panel checked the student's answer.
///
/// A valid answer advances the stage and opens the calculation dialog.
pub fn doppler_validated(
    session: &mut SpectraSession,
    story: &StoryState,
    validated: bool,
) -> Result<Option<TransitionOutcome<SpectraMarker>>, StageError> {
    let outcome = if validated {
        Some(session.transition_next()?)
    } else {
        None
    };
    session.update(story, |f| {
        f.show_doppler_dialog = validated;
        f.doppler.validation_4_failed = !validated;
    })?;
    Ok(outcome)
}

/// Reopen the Doppler calculation where the student left it. Returns
/// `false` outside the markers that show the calculation.
pub fn open_doppler_calc(session: &mut SpectraSession, story: &StoryState) -> Result<bool, StageError> {
    if !DOPPLER_SCOPE.is_active(session.current_step()) {
        return Ok(false);
    }
    session.update(story, |f| {
        f.show_doppler_dialog = true;
        f.doppler.slideshow.resume();
    })?;
    Ok(true)
}

/// Step the Doppler calculation forward. Its interactive steps stay
/// blocked until their answer has been accepted.
pub fn advance_doppler_calc(session: &mut SpectraSession, story: &StoryState) -> Result<bool, StageError> {
    if !DOPPLER_SCOPE.is_active(session.current_step()) {
        return Ok(false);
    }
    let mut moved = false;
    session.update(story, |f| {
        moved = f.doppler.slideshow.advance(&f.doppler.interact_steps_5);
    })?;
    Ok(moved)
}

pub fn retreat_doppler_calc(session: &mut SpectraSession, story: &StoryState) -> Result<bool, StageError> {
    let mut moved = false;
    session.update(story, |f| moved = f.doppler.slideshow.retreat())?;
    Ok(moved)
}

/// Check the student's value for the speed of light. An accepted value
/// completes the current interactive step; a rejected one is flagged so
/// the panel can show a hint.
pub fn submit_speed_of_light(
    session: &mut SpectraSession,
    story: &StoryState,
    value: f64,
) -> Result<bool, StageError> {
    let accepted = ((value - SPEED_OF_LIGHT) / SPEED_OF_LIGHT).abs() <= SPEED_OF_LIGHT_TOLERANCE;
    if !accepted {
        info!(value, "Speed of light answer rejected");
    }
    session.update(story, |f| {
        let doppler = &mut f.doppler;
        doppler.validation_5_failed = !accepted;
        if accepted {
            doppler.student_c = value;
            if doppler.interact_steps_5.contains(&doppler.slideshow.step) {
                doppler.slideshow.complete_current();
            }
        }
    })?;
    Ok(accepted)
}

/// Close the calculation from its last step and move on to `che_mea1`.
/// Nothing happens until the velocity has been calculated.
pub fn finish_doppler_calc(
    session: &mut SpectraSession,
    story: &StoryState,
) -> Result<Option<TransitionOutcome<SpectraMarker>>, StageError> {
    let doppler = &session.state().fields().doppler;
    if !doppler.slideshow.is_last_step()
        || !doppler.velocity_calculated
        || !DOPPLER_SCOPE.is_active(session.current_step())
    {
        return Ok(None);
    }
    session.update(story, |f| {
        f.doppler.slideshow.finish();
        f.show_doppler_dialog = false;
    })?;
    session.transition_to(SpectraMarker::CheMea1, false).map(Some)
}

/// Open the dot plot tutorial. Returns `false` outside the dot plot
/// sequence.
pub fn open_dotplot_tutorial(session: &mut SpectraSession, story: &StoryState) -> Result<bool, StageError> {
    if !DOTPLOT_SCOPE.is_active(session.current_step()) {
        return Ok(false);
    }
    session.update(story, |f| {
        f.show_dotplot_tutorial_dialog = true;
        f.dotplot_tutorial.resume();
    })?;
    Ok(true)
}

/// Step the dot plot tutorial forward; from its last slide this finishes
/// it, closes the dialog and unlocks `dot_seq1`.
pub fn advance_dotplot_tutorial(session: &mut SpectraSession, story: &StoryState) -> Result<bool, StageError> {
    let mut moved = false;
    session.update(story, |f| {
        if f.dotplot_tutorial.is_last_step() {
            moved = f.dotplot_tutorial.finish();
            f.dotplot_tutorial_finished |= moved;
            f.show_dotplot_tutorial_dialog = !moved;
        } else {
            moved = f.dotplot_tutorial.advance(&[]);
        }
    })?;
    Ok(moved)
}

pub fn retreat_dotplot_tutorial(session: &mut SpectraSession, story: &StoryState) -> Result<bool, StageError> {
    let mut moved = false;
    session.update(story, |f| moved = f.dotplot_tutorial.retreat())?;
    Ok(moved)
}

pub fn close_dotplot_tutorial(session: &mut SpectraSession, story: &StoryState) -> Result<(), StageError> {
    session.update(story, |f| f.show_dotplot_tutorial_dialog = false)
}

/// Leave `dot_seq12` either to remeasure the example galaxy or to carry on
/// with the student's own galaxies.
pub fn finish_example_comparison(
    session: &mut SpectraSession,
    remeasure: bool,
) -> Result<TransitionOutcome<SpectraMarker>, StageError> {
    let target = if remeasure {
        SpectraMarker::DotSeq13
    } else {
        SpectraMarker::RemGal1
    };
    session.transition_to(target, true)
}

/// Advance the velocity reflection slideshow; finishing it unlocks
/// `rem_gal1`.
pub fn advance_reflection(session: &mut SpectraSession, story: &StoryState) -> Result<bool, StageError> {
    let mut moved = false;
    session.update(story, |f| {
        if f.velocity_reflection.is_last_step() {
            moved = f.velocity_reflection.finish();
            f.reflection_complete = f.velocity_reflection.complete;
        } else {
            moved = f.velocity_reflection.advance(&REFLECTION_INTERACT_STEPS);
        }
    })?;
    Ok(moved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{GateVerdict, Marker};
    use crate::effects::StoreEnv;
    use crate::persist::{InMemoryStore, StageKey};
    use crate::story::Measurement;
    use std::sync::Arc;

    fn loaded() -> SpectraStage {
        let mut stage = stage().unwrap();
        stage.mark_loaded();
        stage
    }

    fn story_with(galaxies: usize) -> StoryState {
        let mut story = StoryState::default();
        for i in 0..galaxies {
            story.upsert_measurement(Measurement::new(format!("gal{i}")));
        }
        story
    }

    #[test]
    fn sequence_is_contiguous() {
        assert_eq!(SpectraMarker::ALL.len(), 38);
        assert_eq!(SpectraMarker::first(), SpectraMarker::MeeGui1);
        assert_eq!(SpectraMarker::last(), SpectraMarker::EndSta1);
        assert_eq!(SpectraMarker::from_name("dot_seq12"), Some(SpectraMarker::DotSeq12));
    }

    #[test]
    fn galaxy_selection_gates_follow_total() {
        let mut stage = loaded();
        stage.transition_to(SpectraMarker::SelGal1, true).unwrap();
        assert!(stage.transition_next().unwrap().is_rejected());

        stage.refresh(&story_with(1));
        assert_eq!(stage.transition_next().unwrap().current(), SpectraMarker::SelGal2);
        assert!(stage.transition_next().unwrap().is_rejected());

        stage.refresh(&story_with(GALAXY_COUNT));
        assert_eq!(stage.transition_next().unwrap().current(), SpectraMarker::SelGal3);
        assert_eq!(stage.transition_next().unwrap().current(), SpectraMarker::SelGal4);
    }

    #[test]
    fn zoom_gate_needs_wavelength() {
        let mut stage = loaded();
        stage.update(&StoryState::default(), |f| f.zoom_tool_activated = true);
        assert_eq!(stage.evaluate(SpectraMarker::DopCal0), GateVerdict::Failed);
        stage.update(&StoryState::default(), |f| f.obs_wave = 6565.0);
        assert_eq!(stage.evaluate(SpectraMarker::DopCal0), GateVerdict::Passed);
    }

    #[test]
    fn ungated_markers_are_allowed() {
        let stage = loaded();
        assert_eq!(stage.evaluate(SpectraMarker::DopCal3), GateVerdict::Ungated);
    }

    #[test]
    fn derive_counts_measurements() {
        let mut story = story_with(3);
        let mut m = Measurement::new("gal0");
        m.rest_wave = Some(6562.79);
        m.obs_wave = Some(6700.0);
        m.z = Some(0.02);
        m.velocity = Some(6270.0);
        story.upsert_measurement(m);

        let mut fields = SpectraFields::default();
        fields.derive(&story);
        assert_eq!(fields.total_galaxies, 3);
        assert_eq!(fields.obs_wave_total, 1);
        assert_eq!(fields.velocities_total, 1);
        assert!(!fields.has_multiple_bad_velocities);
    }

    #[test]
    fn reconcile_leaves_correction_to_derive() {
        let mut fields = SpectraFields {
            total_galaxies: 4,
            ..SpectraFields::default()
        };
        let story = story_with(2);
        fields.reconcile(&story);
        assert_eq!(fields.total_galaxies, 4);
        fields.derive(&story);
        assert_eq!(fields.total_galaxies, 2);
    }

    fn session_at(marker: SpectraMarker) -> SpectraSession {
        let mut session = StageSession::new(
            StageKey::new("hubbles_law", 1, SpectraMarker::STAGE),
            StoreEnv::new(Arc::new(InMemoryStore::new())),
            false,
            loaded(),
        );
        session.transition_to(marker, true).unwrap();
        session
    }

    fn walk_to_step(session: &mut SpectraSession, story: &StoryState, step: u32) {
        while session.state().fields().doppler.slideshow.step < step {
            assert!(advance_doppler_calc(session, story).unwrap());
        }
    }

    #[test]
    fn doppler_calc_only_runs_in_scope() {
        let story = StoryState::default();
        let mut session = session_at(SpectraMarker::ChoRow1);
        assert!(!open_doppler_calc(&mut session, &story).unwrap());
        assert!(!advance_doppler_calc(&mut session, &story).unwrap());
        assert_eq!(session.state().fields().doppler.slideshow.step, 0);

        let mut session = session_at(SpectraMarker::DopCal5);
        assert!(open_doppler_calc(&mut session, &story).unwrap());
        assert!(session.state().fields().show_doppler_dialog);
    }

    #[test]
    fn speed_of_light_step_blocks_until_accepted() {
        let story = StoryState::default();
        let mut session = session_at(SpectraMarker::DopCal5);
        walk_to_step(&mut session, &story, 3);
        assert!(!advance_doppler_calc(&mut session, &story).unwrap());

        assert!(!submit_speed_of_light(&mut session, &story, 2.0e5).unwrap());
        assert!(session.state().fields().doppler.validation_5_failed);
        assert!(!advance_doppler_calc(&mut session, &story).unwrap());

        assert!(submit_speed_of_light(&mut session, &story, 299_792.0).unwrap());
        let doppler = &session.state().fields().doppler;
        assert!(!doppler.validation_5_failed);
        assert_eq!(doppler.student_c, 299_792.0);
        assert!(advance_doppler_calc(&mut session, &story).unwrap());
        assert_eq!(session.state().fields().doppler.slideshow.step, 4);
    }

    #[test]
    fn velocity_step_finishes_calculation() {
        let mut story = StoryState::default();
        let mut session = session_at(SpectraMarker::DopCal5);
        walk_to_step(&mut session, &story, 3);
        submit_speed_of_light(&mut session, &story, SPEED_OF_LIGHT).unwrap();
        walk_to_step(&mut session, &story, 4);
        assert!(!advance_doppler_calc(&mut session, &story).unwrap());
        assert_eq!(finish_doppler_calc(&mut session, &story).unwrap(), None);

        example_velocity_calculated(&mut session, &mut story, 6270.4).unwrap();
        walk_to_step(&mut session, &story, 5);
        assert!(retreat_doppler_calc(&mut session, &story).unwrap());
        walk_to_step(&mut session, &story, 5);

        let outcome = finish_doppler_calc(&mut session, &story).unwrap().unwrap();
        assert_eq!(outcome.current(), SpectraMarker::CheMea1);
        let fields = session.state().fields();
        assert!(fields.doppler.slideshow.complete);
        assert!(!fields.show_doppler_dialog);
    }

    #[test]
    fn failed_validation_is_remembered() {
        let story = StoryState::default();
        let mut session = session_at(SpectraMarker::DopCal4);
        assert_eq!(doppler_validated(&mut session, &story, false).unwrap(), None);
        assert!(session.state().fields().doppler.validation_4_failed);
        assert_eq!(session.current_step(), SpectraMarker::DopCal4);

        let outcome = doppler_validated(&mut session, &story, true).unwrap().unwrap();
        assert_eq!(outcome.current(), SpectraMarker::DopCal5);
        assert!(!session.state().fields().doppler.validation_4_failed);
        assert!(session.state().fields().show_doppler_dialog);
    }

    #[test]
    fn dotplot_tutorial_unlocks_sequence() {
        let story = StoryState::default();
        let mut session = session_at(SpectraMarker::CheMea1);
        assert!(!open_dotplot_tutorial(&mut session, &story).unwrap());

        session.transition_to(SpectraMarker::IntDot1, true).unwrap();
        assert!(open_dotplot_tutorial(&mut session, &story).unwrap());
        assert!(session.transition_next().unwrap().is_rejected());

        let length = session.state().fields().dotplot_tutorial.length;
        for _ in 1..length {
            assert!(advance_dotplot_tutorial(&mut session, &story).unwrap());
        }
        assert!(retreat_dotplot_tutorial(&mut session, &story).unwrap());
        assert!(advance_dotplot_tutorial(&mut session, &story).unwrap());
        assert!(session.state().fields().show_dotplot_tutorial_dialog);

        assert!(advance_dotplot_tutorial(&mut session, &story).unwrap());
        let fields = session.state().fields();
        assert!(fields.dotplot_tutorial_finished);
        assert!(!fields.show_dotplot_tutorial_dialog);
        assert_eq!(session.transition_next().unwrap().current(), SpectraMarker::DotSeq1);

        open_dotplot_tutorial(&mut session, &story).unwrap();
        close_dotplot_tutorial(&mut session, &story).unwrap();
        assert!(!session.state().fields().show_dotplot_tutorial_dialog);
    }

    #[test]
    fn doppler_scope_covers_calculation() {
        assert!(DOPPLER_SCOPE.is_active(SpectraMarker::DopCal4));
        assert!(!DOPPLER_SCOPE.is_active(SpectraMarker::IntDot1));
        assert!(DOPPLER_SCOPE.is_behind(SpectraMarker::DotSeq1));
        assert!(DOTPLOT_SCOPE.is_active(SpectraMarker::RefDat1));
    }
}
