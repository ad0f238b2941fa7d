//! Rendering boundary.
//!
//! Guideline panels declare the markers under which they are shown and
//! forward their button events to the stage. The renderer only needs
//! [`GuidelinePanel::view`] and [`GuidelinePanel::dispatch`].

mod panel;

pub use panel::{visible_panels, GuidelinePanel, PanelEvent, PanelView, Visibility};
