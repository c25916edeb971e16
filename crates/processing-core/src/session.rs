//! Per-target transform lifecycle for the currently selected media.
//!
//! Each target frame gets its own [`GestureController`]. Selecting a new
//! file bumps the generation, resets every transform and drops any drag;
//! events tagged with an older generation are discarded.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use reframe_common::error::{ReframeError, ReframeResult};
use reframe_frame_model::event::PointerEvent;
use reframe_frame_model::layout::Layout;
use reframe_frame_model::media::{MediaDimensions, MediaKind};
use reframe_frame_model::rect::Size;
use reframe_frame_model::target::TargetFrame;
use reframe_frame_model::transform::Transform;

use crate::gesture::{GestureConfig, GestureController};

/// Bumped on every media selection.
pub type Generation = u64;

/// The file being reframed.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectedMedia {
    pub path: PathBuf,
    pub kind: MediaKind,
    pub dimensions: MediaDimensions,
}

impl SelectedMedia {
    /// Classify `path` by extension.
    pub fn new(path: impl Into<PathBuf>, dimensions: MediaDimensions) -> ReframeResult<Self> {
        let path = path.into();
        let kind = MediaKind::from_path(&path).ok_or_else(|| {
            ReframeError::unsupported(format!("unrecognized media type: {}", path.display()))
        })?;
        Ok(Self {
            path,
            kind,
            dimensions,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[derive(Debug)]
pub struct EditSession {
    targets: Vec<TargetFrame>,
    controllers: BTreeMap<String, GestureController>,
    media: Option<SelectedMedia>,
    generation: Generation,
}

impl EditSession {
    pub fn new(targets: Vec<TargetFrame>, config: GestureConfig) -> Self {
        let controllers = targets
            .iter()
            .map(|t| (t.label().to_string(), GestureController::new(config)))
            .collect();
        Self {
            targets,
            controllers,
            media: None,
            generation: 0,
        }
    }

    pub fn targets(&self) -> &[TargetFrame] {
        &self.targets
    }

    pub fn media(&self) -> Option<&SelectedMedia> {
        self.media.as_ref()
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Switch to a new file. Returns the generation events must carry.
    pub fn select_media(&mut self, media: SelectedMedia) -> Generation {
        self.generation += 1;
        let aspect = media.dimensions.aspect();
        for controller in self.controllers.values_mut() {
            controller.reset();
            controller.set_media_aspect(aspect);
        }
        tracing::info!(
            path = %media.path.display(),
            kind = media.kind.as_str(),
            dimensions = %media.dimensions,
            generation = self.generation,
            "Media selected"
        );
        self.media = Some(media);
        self.generation
    }

    pub fn controller(&self, label: &str) -> Option<&GestureController> {
        self.controllers.get(label)
    }

    /// Report the measured preview container for one target.
    pub fn set_container(&mut self, label: &str, container: Size) -> ReframeResult<()> {
        self.controller_mut(label)?.set_container(container);
        Ok(())
    }

    /// Feed one pointer event to the controller for `label`.
    ///
    /// Events from an older generation are dropped and yield `Ok(None)`.
    pub fn apply(
        &mut self,
        label: &str,
        generation: Generation,
        event: &PointerEvent,
    ) -> ReframeResult<Option<Transform>> {
        if generation != self.generation {
            tracing::debug!(
                label,
                event_generation = generation,
                current = self.generation,
                "Dropping stale pointer event"
            );
            return Ok(None);
        }
        self.controller_mut(label)?.handle_event(event)
    }

    /// Restore identity for one target.
    pub fn reset(&mut self, label: &str) -> ReframeResult<()> {
        self.controller_mut(label)?.reset();
        Ok(())
    }

    /// Current transform for `label`.
    pub fn transform(&self, label: &str) -> Option<Transform> {
        self.controllers.get(label).map(GestureController::transform)
    }

    /// Snapshot of every target's transform, keyed by label.
    pub fn transforms(&self) -> BTreeMap<String, Transform> {
        self.controllers
            .iter()
            .map(|(label, c)| (label.clone(), c.transform()))
            .collect()
    }

    /// Seed transforms from a saved layout. Unknown labels are ignored.
    pub fn restore(&mut self, layout: &Layout) {
        for (label, controller) in self.controllers.iter_mut() {
            controller.set_transform(layout.transform_for(label));
        }
    }

    /// Layout file contents for the current state.
    pub fn to_layout(&self) -> Layout {
        let mut layout = Layout::new(self.media.as_ref().map(|m| m.path.clone()));
        for (label, transform) in self.transforms() {
            layout.set(label, transform);
        }
        layout
    }

    fn controller_mut(&mut self, label: &str) -> ReframeResult<&mut GestureController> {
        self.controllers
            .get_mut(label)
            .ok_or_else(|| ReframeError::invalid_input(format!("unknown target frame: {label}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> EditSession {
        EditSession::new(TargetFrame::defaults(), GestureConfig::default())
    }

    fn clip() -> SelectedMedia {
        SelectedMedia::new("clip.mp4", MediaDimensions::new(1920, 1080).unwrap()).unwrap()
    }

    fn drag_right(session: &mut EditSession, label: &str, generation: Generation) {
        session
            .apply(label, generation, &PointerEvent::resize(0, 1000.0, 1000.0))
            .unwrap();
        session
            .apply(label, generation, &PointerEvent::down(1, 500.0, 500.0, None))
            .unwrap();
        session
            .apply(label, generation, &PointerEvent::moved(2, 700.0, 500.0))
            .unwrap();
    }

    #[test]
    fn test_new_session_is_identity() {
        let session = session();
        assert_eq!(session.generation(), 0);
        assert!(session.transforms().values().all(Transform::is_identity));
        assert_eq!(session.transforms().len(), 3);
    }

    #[test]
    fn test_targets_edit_independently() {
        let mut session = session();
        let generation = session.select_media(clip());
        drag_right(&mut session, "square", generation);

        assert!((session.transform("square").unwrap().x - 0.2).abs() < 1e-12);
        assert!(session.transform("portrait").unwrap().is_identity());
    }

    #[test]
    fn test_select_media_resets_and_cancels() {
        let mut session = session();
        let first = session.select_media(clip());
        drag_right(&mut session, "square", first);
        assert!(session.controller("square").unwrap().is_dragging());

        let second = session.select_media(clip());
        assert_eq!(second, first + 1);
        assert!(session.transform("square").unwrap().is_identity());
        assert!(!session.controller("square").unwrap().is_dragging());
    }

    #[test]
    fn test_stale_generation_is_dropped() {
        let mut session = session();
        let old = session.select_media(clip());
        session.select_media(clip());
        session
            .set_container("square", Size::new(1000.0, 1000.0))
            .unwrap();

        let result = session
            .apply("square", old, &PointerEvent::down(0, 10.0, 10.0, None))
            .unwrap();
        assert_eq!(result, None);
        assert!(!session.controller("square").unwrap().is_dragging());
    }

    #[test]
    fn test_unknown_label_rejected() {
        let mut session = session();
        let err = session.reset("banner").unwrap_err();
        assert!(matches!(err, ReframeError::InvalidInput { .. }));
    }

    #[test]
    fn test_down_before_media_is_not_ready() {
        let mut session = session();
        session
            .set_container("square", Size::new(500.0, 500.0))
            .unwrap();
        let err = session
            .apply("square", 0, &PointerEvent::down(0, 1.0, 1.0, None))
            .unwrap_err();
        assert!(err.is_not_ready());
    }

    #[test]
    fn test_reset_one_target() {
        let mut session = session();
        let generation = session.select_media(clip());
        drag_right(&mut session, "landscape", generation);
        session.reset("landscape").unwrap();
        assert!(session.transform("landscape").unwrap().is_identity());
    }

    #[test]
    fn test_layout_round_trip() {
        let mut session = session();
        let generation = session.select_media(clip());
        drag_right(&mut session, "square", generation);
        session
            .apply("square", generation, &PointerEvent::up(3))
            .unwrap();

        let layout = session.to_layout();
        assert_eq!(layout.media, Some(PathBuf::from("clip.mp4")));

        let mut restored = EditSession::new(TargetFrame::defaults(), GestureConfig::default());
        restored.restore(&layout);
        assert_eq!(restored.transforms(), session.transforms());
    }

    #[test]
    fn test_unrecognized_extension() {
        let dims = MediaDimensions::new(10, 10).unwrap();
        assert!(SelectedMedia::new("notes.txt", dims).is_err());
        assert_eq!(
            SelectedMedia::new("photo.JPG", dims).unwrap().kind,
            MediaKind::Image
        );
    }
}
