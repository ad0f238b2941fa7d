//! Stage 5: comparing one's own results with the class.

use crate::builder::{BuildError, StageBuilder};
use crate::marker_enum;
use crate::render::GuidelinePanel;
use crate::session::StageSession;
use crate::stage::{StageFields, StageState};
use crate::story::StoryState;
use serde::{Deserialize, Serialize};

marker_enum! {
    stage: "examining_data";
    pub enum ExaminingMarker {
        RanVar1 => "ran_var1",
        FinCla1 => "fin_cla1",
        ClaDat1 => "cla_dat1",
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExaminingFields {
    pub enough_students_ready: bool,
    pub class_data_loaded: bool,
}

impl StageFields for ExaminingFields {
    fn derive(&mut self, story: &StoryState) {
        self.enough_students_ready = story.enough_students_ready;
        self.class_data_loaded = !story.class_data_students.is_empty();
    }
}

pub type ExaminingStage = StageState<ExaminingMarker, ExaminingFields>;
pub type ExaminingSession = StageSession<ExaminingMarker, ExaminingFields>;

pub fn stage() -> Result<ExaminingStage, BuildError> {
    StageBuilder::new()
        .gate(ExaminingMarker::FinCla1, |f: &ExaminingFields| f.enough_students_ready)
        .gate(ExaminingMarker::ClaDat1, |f: &ExaminingFields| {
            f.enough_students_ready && f.class_data_loaded
        })
        .build()
}

pub fn guidelines() -> Vec<GuidelinePanel<ExaminingMarker>> {
    vec![
        GuidelinePanel::at("GuidelineRandomVariability", ExaminingMarker::RanVar1),
        GuidelinePanel::at("GuidelineFinishedClassmates", ExaminingMarker::FinCla1),
        GuidelinePanel::at("GuidelineClassData", ExaminingMarker::ClaDat1),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Marker;
    use crate::render::PanelView;

    #[test]
    fn waits_for_classmates() {
        let mut stage = stage().unwrap();
        stage.mark_loaded();
        assert!(stage.transition_next().unwrap().is_rejected());

        let mut story = StoryState::default();
        story.enough_students_ready = true;
        stage.refresh(&story);
        assert_eq!(stage.transition_next().unwrap().current(), ExaminingMarker::FinCla1);
        assert!(stage.transition_next().unwrap().is_rejected());

        story.class_data_students = vec![1, 2, 3];
        stage.refresh(&story);
        assert_eq!(stage.transition_next().unwrap().current(), ExaminingMarker::ClaDat1);
        assert!(stage.current_step().is_last());
    }

    #[test]
    fn first_panel_cannot_go_back() {
        let mut stage = stage().unwrap();
        stage.mark_loaded();
        let views: Vec<PanelView> = guidelines()
            .iter()
            .filter_map(|panel| panel.view(&stage))
            .collect();
        assert_eq!(
            views,
            vec![PanelView {
                name: "GuidelineRandomVariability",
                can_advance: false,
                can_retreat: false,
            }]
        );
    }
}
