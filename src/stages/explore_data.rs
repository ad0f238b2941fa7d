//! Stage 4: exploring class data, fitting Hubble's law and estimating the
//! age of the universe.

use crate::builder::{BuildError, StageBuilder};
use crate::error::StageError;
use crate::marker_enum;
use crate::render::GuidelinePanel;
use crate::session::StageSession;
use crate::stage::{Slideshow, StageFields, StageState};
use crate::story::StoryState;
use serde::{Deserialize, Serialize};

/// Converts a Hubble constant in km/s/Mpc into an age in Gyr.
pub const AGE_CONSTANT: f64 = 977.8;

marker_enum! {
    stage: "explore_data";
    pub enum ExploreMarker {
        ExpDat1 => "exp_dat1",
        TreDat1 => "tre_dat1",
        TreDat2 => "tre_dat2",
        TreDat3 => "tre_dat3",
        RelVel1 => "rel_vel1",
        TreLin1 => "tre_lin1",
        TreLin2 => "tre_lin2",
        BesFit1 => "bes_fit1",
        HubExp1 => "hub_exp1",
        AgeUni1 => "age_uni1",
        HypGal1 => "hyp_gal1",
        AgeRac1 => "age_rac1",
        AgeUni2 => "age_uni2",
        AgeUni3 => "age_uni3",
        AgeUni4 => "age_uni4",
        YouAge1 => "you_age1",
        ShoEst1 => "sho_est1",
        ShoEst2 => "sho_est2",
    }
}

/// Age of the universe in Gyr for a Hubble constant in km/s/Mpc.
pub fn age_of_universe(hubble_constant: f64) -> Option<f64> {
    (hubble_constant > 0.0).then(|| AGE_CONSTANT / hubble_constant)
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExploreFields {
    pub class_data_students_total: usize,
    pub trend_line_drawn: bool,
    pub best_fit_line_drawn: bool,
    pub show_hubble_slideshow_dialog: bool,
    pub hubble_slideshow: Slideshow,
    pub hubble_slideshow_finished: bool,
}

impl Default for ExploreFields {
    fn default() -> Self {
        Self {
            class_data_students_total: 0,
            trend_line_drawn: false,
            best_fit_line_drawn: false,
            show_hubble_slideshow_dialog: false,
            hubble_slideshow: Slideshow::new(7),
            hubble_slideshow_finished: false,
        }
    }
}

impl StageFields for ExploreFields {
    fn derive(&mut self, story: &StoryState) {
        self.class_data_students_total = story.class_data_students.len();
        self.hubble_slideshow_finished |= self.hubble_slideshow.complete;
    }
}

pub type ExploreStage = StageState<ExploreMarker, ExploreFields>;
pub type ExploreSession = StageSession<ExploreMarker, ExploreFields>;

pub fn stage() -> Result<ExploreStage, BuildError> {
    use ExploreMarker::*;

    StageBuilder::new()
        .gate(TreDat1, |f: &ExploreFields| f.class_data_students_total > 0)
        .gate(BesFit1, |f: &ExploreFields| f.trend_line_drawn)
        .gate(HubExp1, |f: &ExploreFields| f.best_fit_line_drawn)
        .gate(AgeUni1, |f: &ExploreFields| f.hubble_slideshow_finished)
        .build()
}

pub fn guidelines() -> Vec<GuidelinePanel<ExploreMarker>> {
    use ExploreMarker::*;

    [
        ("GuidelineExploreData", ExpDat1),
        ("GuidelineTrendsDataMC1", TreDat1),
        ("GuidelineTrendsData2", TreDat2),
        ("GuidelineTrendsDataMC3", TreDat3),
        ("GuidelineRelationshipsVelDistMC", RelVel1),
        ("GuidelineTrendLines1", TreLin1),
        ("GuidelineTrendLinesDraw2", TreLin2),
        ("GuidelineBestFitLine", BesFit1),
        ("GuidelineHubblesExpandingUniverse1", HubExp1),
        ("GuidelineAgeUniverse", AgeUni1),
        ("GuidelineHypotheticalGalaxy", HypGal1),
        ("GuidelineAgeRaceEquation", AgeRac1),
        ("GuidelineAgeUniverseEquation2", AgeUni2),
        ("GuidelineAgeUniverseEstimate3", AgeUni3),
        ("GuidelineAgeUniverseEstimate4", AgeUni4),
        ("GuidelineYourAgeEstimate", YouAge1),
        ("GuidelineShortcomingsEstReflect1", ShoEst1),
        ("GuidelineShortcomingsEst2", ShoEst2),
    ]
    .into_iter()
    .map(|(name, marker)| GuidelinePanel::at(name, marker))
    .collect()
}

/// Pick the classmates whose data is plotted. An existing selection is
/// kept so the plot does not change between visits.
pub fn select_class_data_students<I>(
    session: &mut ExploreSession,
    story: &mut StoryState,
    student_ids: I,
) -> Result<(), StageError>
where
    I: IntoIterator<Item = u64>,
{
    if story.class_data_students.is_empty() {
        let mut ids: Vec<u64> = student_ids.into_iter().collect();
        ids.sort_unstable();
        ids.dedup();
        story.class_data_students = ids;
    }
    session.refresh(story)
}

pub fn trend_line_drawn(session: &mut ExploreSession, story: &StoryState) -> Result<(), StageError> {
    session.update(story, |f| f.trend_line_drawn = true)
}

pub fn best_fit_line_drawn(session: &mut ExploreSession, story: &StoryState) -> Result<(), StageError> {
    session.update(story, |f| f.best_fit_line_drawn = true)
}

pub fn open_hubble_slideshow(session: &mut ExploreSession, story: &StoryState) -> Result<(), StageError> {
    session.update(story, |f| {
        f.show_hubble_slideshow_dialog = true;
        f.hubble_slideshow.resume();
    })
}

/// Step the Hubble slideshow forward; from its last slide this finishes it.
pub fn advance_hubble_slideshow(session: &mut ExploreSession, story: &StoryState) -> Result<bool, StageError> {
    let mut moved = false;
    session.update(story, |f| {
        moved = if f.hubble_slideshow.is_last_step() {
            let finished = f.hubble_slideshow.finish();
            f.show_hubble_slideshow_dialog = !finished;
            finished
        } else {
            f.hubble_slideshow.advance(&[])
        };
    })?;
    Ok(moved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{GateVerdict, Marker};
    use crate::persist::{PersistError, RestoreViolation, CURRENT_STEP_KEY};
    use crate::render::visible_panels;
    use serde_json::json;

    #[test]
    fn every_marker_has_one_guideline() {
        let panels = guidelines();
        assert_eq!(panels.len(), ExploreMarker::ALL.len());

        let mut stage = stage().unwrap();
        stage.mark_loaded();
        for marker in ExploreMarker::ALL {
            stage.transition_to(*marker, true).unwrap();
            assert_eq!(visible_panels(&panels, &stage).len(), 1);
        }
    }

    #[test]
    fn age_formula() {
        let age = age_of_universe(70.0).unwrap();
        assert!((age - 13.968).abs() < 0.01);
        assert_eq!(age_of_universe(0.0), None);
    }

    #[test]
    fn slideshow_completion_unlocks_age_step() {
        let mut stage = stage().unwrap();
        stage.mark_loaded();
        assert_eq!(stage.evaluate(ExploreMarker::AgeUni1), GateVerdict::Failed);

        stage.update(&StoryState::default(), |f| {
            f.hubble_slideshow.step = f.hubble_slideshow.length - 1;
            f.hubble_slideshow.finish();
        });
        assert!(stage.fields().hubble_slideshow_finished);
        assert_eq!(stage.evaluate(ExploreMarker::AgeUni1), GateVerdict::Passed);
    }

    #[test]
    fn empty_slideshow_record_is_rejected_whole() {
        let mut record = stage().unwrap().snapshot().unwrap();
        record.insert(CURRENT_STEP_KEY, json!(8));
        record.insert("hubble_slideshow", json!({ "length": 0 }));
        record.insert("trend_line_drawn", json!(true));

        let mut stage = stage().unwrap();
        let err = stage.restore(&record, &StoryState::default()).unwrap_err();
        assert!(matches!(
            err,
            PersistError::InvalidRecord(ref violations)
                if matches!(violations[..], [RestoreViolation::MalformedFields { .. }])
        ));
        assert!(!stage.is_loaded());
        assert_eq!(stage.current_step(), ExploreMarker::ExpDat1);
        assert!(!stage.fields().trend_line_drawn);
        assert_eq!(stage.fields().hubble_slideshow, Slideshow::new(7));
    }

    #[test]
    fn class_data_gate() {
        let mut stage = stage().unwrap();
        stage.mark_loaded();
        assert!(stage.transition_next().unwrap().is_rejected());

        let mut story = StoryState::default();
        story.class_data_students = vec![3, 5];
        stage.refresh(&story);
        assert_eq!(stage.transition_next().unwrap().current(), ExploreMarker::TreDat1);
    }
}
