use crate::core::Marker;
use crate::error::StageError;
use crate::session::StageSession;
use crate::stage::{StageFields, StageState, TransitionOutcome, TransitionTarget};
use crate::story::{McScore, StoryState};
use serde::Serialize;
use tracing::debug;

/// Markers under which a panel is shown.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Visibility<M> {
    At(M),
    AnyOf(Vec<M>),
    /// Inclusive; `None` runs to the last marker.
    Between(M, Option<M>),
    AtOrAfter(M),
    AtOrBefore(M),
}

impl<M: Marker> Visibility<M> {
    pub fn is_visible<F: StageFields>(&self, stage: &StageState<M, F>) -> bool {
        match self {
            Self::At(marker) => stage.is_current_step(*marker),
            Self::AnyOf(markers) => stage.current_step_in(markers),
            Self::Between(start, end) => stage.current_step_between(*start, *end),
            Self::AtOrAfter(marker) => stage.current_step_at_or_after(*marker),
            Self::AtOrBefore(marker) => stage.current_step_at_or_before(*marker),
        }
    }
}

/// What the renderer needs to draw a visible panel.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PanelView {
    pub name: &'static str,
    pub can_advance: bool,
    pub can_retreat: bool,
}

/// Events a panel forwards to its stage.
#[derive(Clone, Debug, PartialEq)]
pub enum PanelEvent<M> {
    Next,
    Back,
    /// The panel validated an answer; only a valid answer advances.
    ValidatedTransition(bool),
    /// Business-rule jump to a specific marker.
    Jump { target: M, force: bool },
    /// A multiple-choice question was shown for the first time.
    McInitialize(String),
    McScore(McScore),
}

#[derive(Clone, Debug)]
pub struct GuidelinePanel<M> {
    name: &'static str,
    visibility: Visibility<M>,
}

impl<M: Marker> GuidelinePanel<M> {
    pub fn new(name: &'static str, visibility: Visibility<M>) -> Self {
        Self { name, visibility }
    }

    pub fn at(name: &'static str, marker: M) -> Self {
        Self::new(name, Visibility::At(marker))
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn visibility(&self) -> &Visibility<M> {
        &self.visibility
    }

    /// The panel as currently drawn, or `None` while hidden.
    pub fn view<F: StageFields>(&self, stage: &StageState<M, F>) -> Option<PanelView> {
        if !self.visibility.is_visible(stage) {
            return None;
        }
        Some(PanelView {
            name: self.name,
            can_advance: stage.can_transition(TransitionTarget::Next),
            can_retreat: !stage.current_step().is_first(),
        })
    }

    /// Forward an event to the stage.
    ///
    /// Transition events from a hidden panel are dropped; scoring events
    /// always reach the story state.
    pub fn dispatch<F: StageFields>(
        &self,
        stage: &mut StageSession<M, F>,
        story: &mut StoryState,
        event: PanelEvent<M>,
    ) -> Result<Option<TransitionOutcome<M>>, StageError> {
        match event {
            PanelEvent::McInitialize(tag) => {
                story.init_mc_response(&tag);
                Ok(None)
            }
            PanelEvent::McScore(score) => {
                story.record_mc_score(score);
                Ok(None)
            }
            event if !self.visibility.is_visible(stage.state()) => {
                debug!(
                    panel = self.name,
                    step = stage.current_step().name(),
                    ?event,
                    "Ignoring event from hidden panel"
                );
                Ok(None)
            }
            PanelEvent::Next => stage.transition_next().map(Some),
            PanelEvent::Back => stage.transition_previous().map(Some),
            PanelEvent::ValidatedTransition(true) => stage.transition_next().map(Some),
            PanelEvent::ValidatedTransition(false) => Ok(None),
            PanelEvent::Jump { target, force } => stage.transition_to(target, force).map(Some),
        }
    }
}

/// Views of every panel visible at the current marker, in declaration order.
pub fn visible_panels<M: Marker, F: StageFields>(
    panels: &[GuidelinePanel<M>],
    stage: &StageState<M, F>,
) -> Vec<PanelView> {
    panels.iter().filter_map(|panel| panel.view(stage)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::StageBuilder;
    use crate::effects::StoreEnv;
    use crate::persist::{InMemoryStore, StageKey};
    use serde::Deserialize;
    use std::sync::Arc;

    crate::marker_enum! {
        stage: "render_test";
        enum TestMarker {
            Intro => "int1",
            Measure => "mea1",
            Check => "che1",
            Done => "don1",
        }
    }

    #[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
    struct Fields {
        measured: bool,
    }

    impl StageFields for Fields {}

    fn stage() -> StageSession<TestMarker, Fields> {
        let state = StageBuilder::new()
            .gate(TestMarker::Check, |f: &Fields| f.measured)
            .loaded()
            .build()
            .unwrap();
        StageSession::new(
            StageKey::new("hubbles_law", 1, TestMarker::STAGE),
            StoreEnv::new(Arc::new(InMemoryStore::new())),
            false,
            state,
        )
    }

    #[test]
    fn visibility_variants() {
        let mut session = stage();
        session.transition_to(TestMarker::Check, true).unwrap();
        let state = session.state();

        assert!(Visibility::At(TestMarker::Check).is_visible(state));
        assert!(!Visibility::At(TestMarker::Intro).is_visible(state));
        assert!(Visibility::AnyOf(vec![TestMarker::Measure, TestMarker::Check]).is_visible(state));
        assert!(Visibility::Between(TestMarker::Measure, None).is_visible(state));
        assert!(!Visibility::Between(TestMarker::Intro, Some(TestMarker::Measure)).is_visible(state));
        assert!(Visibility::AtOrAfter(TestMarker::Check).is_visible(state));
        assert!(!Visibility::AtOrBefore(TestMarker::Measure).is_visible(state));
    }

    #[test]
    fn view_reports_gate_state() {
        let mut session = stage();
        let panel = GuidelinePanel::at("GuidelineMeasure", TestMarker::Measure);
        assert_eq!(panel.view(session.state()), None);

        session.transition_next().unwrap();
        assert_eq!(
            panel.view(session.state()),
            Some(PanelView {
                name: "GuidelineMeasure",
                can_advance: false,
                can_retreat: true,
            })
        );
    }

    #[test]
    fn next_and_back_events_move_the_stage() {
        let mut session = stage();
        let mut story = StoryState::default();
        let intro = GuidelinePanel::at("GuidelineIntro", TestMarker::Intro);
        let measure = GuidelinePanel::at("GuidelineMeasure", TestMarker::Measure);

        let outcome = intro
            .dispatch(&mut session, &mut story, PanelEvent::Next)
            .unwrap();
        assert_eq!(outcome.map(|o| o.current()), Some(TestMarker::Measure));

        let outcome = measure
            .dispatch(&mut session, &mut story, PanelEvent::Back)
            .unwrap();
        assert_eq!(outcome.map(|o| o.current()), Some(TestMarker::Intro));
    }

    #[test]
    fn hidden_panel_events_are_ignored() {
        let mut session = stage();
        let mut story = StoryState::default();
        let panel = GuidelinePanel::at("GuidelineDone", TestMarker::Done);

        let outcome = panel
            .dispatch(&mut session, &mut story, PanelEvent::Next)
            .unwrap();
        assert!(outcome.is_none());
        assert_eq!(session.current_step(), TestMarker::Intro);
    }

    #[test]
    fn only_valid_answers_advance() {
        let mut session = stage();
        let mut story = StoryState::default();
        let panel = GuidelinePanel::new(
            "GuidelineCheck",
            Visibility::Between(TestMarker::Intro, Some(TestMarker::Measure)),
        );

        let outcome = panel
            .dispatch(&mut session, &mut story, PanelEvent::ValidatedTransition(false))
            .unwrap();
        assert!(outcome.is_none());

        let outcome = panel
            .dispatch(&mut session, &mut story, PanelEvent::ValidatedTransition(true))
            .unwrap();
        assert_eq!(outcome.map(|o| o.current()), Some(TestMarker::Measure));
    }

    #[test]
    fn scoring_events_update_story() {
        let mut session = stage();
        let mut story = StoryState::default();
        let panel = GuidelinePanel::at("GuidelineDone", TestMarker::Done);

        panel
            .dispatch(
                &mut session,
                &mut story,
                PanelEvent::McInitialize("galaxy-trend".to_string()),
            )
            .unwrap();
        assert!(story.mc_scoring.contains_key("galaxy-trend"));
        assert!(!story.mc_answered("galaxy-trend"));

        let score = McScore {
            score: Some(10.0),
            choice: Some(1),
            tries: 1,
            ..McScore::new("galaxy-trend")
        };
        panel
            .dispatch(&mut session, &mut story, PanelEvent::McScore(score))
            .unwrap();
        assert!(story.mc_answered("galaxy-trend"));
    }

    #[test]
    fn visible_panels_in_order() {
        let session = stage();
        let panels = vec![
            GuidelinePanel::at("A", TestMarker::Intro),
            GuidelinePanel::at("B", TestMarker::Measure),
            GuidelinePanel::new("C", Visibility::AtOrBefore(TestMarker::Measure)),
        ];
        let names: Vec<&str> = visible_panels(&panels, session.state())
            .into_iter()
            .map(|v| v.name)
            .collect();
        assert_eq!(names, vec!["A", "C"]);
    }
}
