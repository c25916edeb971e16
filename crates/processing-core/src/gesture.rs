//! Drag state machine for the preview's bounding box.
//!
//! ```text
//!            pointer_down(kind)
//!   Idle ───────────────────────▶ Dragging(session)
//!    ▲                               │    ▲
//!    │   pointer_up / pointer_leave  │    │ pointer_move
//!    └───────────────────────────────┘────┘
//! ```
//!
//! Every move is computed from the session's `start_transform` snapshot,
//! never from the previous move's output, so coalesced or dropped moves
//! cannot accumulate drift.

use reframe_common::error::{ReframeError, ReframeResult};
use reframe_frame_model::event::{Handle, PointerEvent, PointerEventKind};
use reframe_frame_model::rect::{FittedRect, Point, Rect, Size};
use reframe_frame_model::transform::{clamp_scale, Transform, MIN_SCALE};

use crate::geometry::{fit_contain, pixel_rect_to_transform, transform_to_pixel_rect};

/// Pan distance (fraction of the frame) under which a move snaps to center.
pub const SNAP_THRESHOLD: f64 = 0.03;

/// Tuning for the gesture controller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GestureConfig {
    /// Snap to center when `|x|` or `|y|` falls below this.
    pub snap_threshold: f64,

    /// Scale floor; never lower than [`MIN_SCALE`].
    pub min_scale: f64,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            snap_threshold: SNAP_THRESHOLD,
            min_scale: MIN_SCALE,
        }
    }
}

/// What the pointer grabbed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragKind {
    /// The box body: pan.
    Move,
    /// A resize handle.
    Resize(Handle),
}

impl From<Option<Handle>> for DragKind {
    fn from(handle: Option<Handle>) -> Self {
        handle.map_or(DragKind::Move, DragKind::Resize)
    }
}

/// A drag in progress. Lives only while the button is held.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragSession {
    pub kind: DragKind,
    pub start_pointer: Point,
    pub start_transform: Transform,
}

/// Controller state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureState {
    Idle,
    Dragging(DragSession),
}

/// Center-snap indicator. Transient UI signal, not part of the transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SnapFlags {
    pub x: bool,
    pub y: bool,
}

/// Turns pointer events into transform updates for one target frame.
#[derive(Debug, Clone)]
pub struct GestureController {
    config: GestureConfig,
    state: GestureState,
    container: Option<Size>,
    media_aspect: Option<f64>,
    fitted: Option<FittedRect>,
    transform: Transform,
    drag_snap: SnapFlags,
}

impl GestureController {
    pub fn new(config: GestureConfig) -> Self {
        Self {
            config,
            state: GestureState::Idle,
            container: None,
            media_aspect: None,
            fitted: None,
            transform: Transform::IDENTITY,
            drag_snap: SnapFlags::default(),
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(GestureConfig::default())
    }

    pub fn config(&self) -> &GestureConfig {
        &self.config
    }

    pub fn state(&self) -> &GestureState {
        &self.state
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, GestureState::Dragging(_))
    }

    /// Committed transform (the live value while dragging).
    pub fn transform(&self) -> Transform {
        self.transform
    }

    /// Replace the transform outright and end any drag.
    pub fn set_transform(&mut self, transform: Transform) {
        self.cancel();
        self.transform = self.floor_scale(transform.sanitized());
    }

    /// Back to fitted and centered.
    pub fn reset(&mut self) {
        self.set_transform(Transform::IDENTITY);
    }

    /// Drop an in-flight drag, keeping whatever transform it produced.
    pub fn cancel(&mut self) {
        if self.is_dragging() {
            tracing::debug!("Drag cancelled");
        }
        self.state = GestureState::Idle;
        self.drag_snap = SnapFlags::default();
    }

    /// Container size changed. An in-flight drag is cancelled since its
    /// pixel deltas were measured against the old size.
    pub fn set_container(&mut self, container: Size) {
        if self.container != Some(container) {
            self.cancel();
        }
        self.container = Some(container);
        self.refit();
    }

    /// Media aspect became known (or changed with a new file).
    pub fn set_media_aspect(&mut self, aspect: f64) {
        self.media_aspect = Some(aspect);
        self.refit();
    }

    pub fn container(&self) -> Option<Size> {
        self.container
    }

    /// Contained placement of the media; `None` until both the container
    /// and the media aspect are known.
    pub fn fitted_rect(&self) -> Option<FittedRect> {
        self.fitted
    }

    pub fn is_ready(&self) -> bool {
        self.fitted.is_some()
    }

    /// The box the preview should draw for the current transform.
    pub fn preview_rect(&self) -> Option<Rect> {
        let (fitted, container) = self.layout().ok()?;
        Some(transform_to_pixel_rect(&self.transform, &fitted, container))
    }

    /// Snap indicator. While idle it mirrors whether the transform sits
    /// exactly on center, so a centered layout shows the guides at rest.
    pub fn snap_flags(&self) -> SnapFlags {
        match self.state {
            GestureState::Dragging(_) => self.drag_snap,
            GestureState::Idle => SnapFlags {
                x: self.transform.is_centered_x(),
                y: self.transform.is_centered_y(),
            },
        }
    }

    /// Start a drag. Restarts the session if one is already active.
    pub fn pointer_down(&mut self, position: Point, kind: DragKind) -> ReframeResult<()> {
        self.layout()?;
        self.state = GestureState::Dragging(DragSession {
            kind,
            start_pointer: position,
            start_transform: self.transform,
        });
        self.drag_snap = SnapFlags::default();
        tracing::trace!(?kind, x = position.x, y = position.y, "Drag started");
        Ok(())
    }

    /// Apply a pointer move. Returns the new transform, or `None` when idle.
    pub fn pointer_move(&mut self, position: Point) -> Option<Transform> {
        let GestureState::Dragging(session) = self.state else {
            return None;
        };
        let (fitted, container) = self.layout().ok()?;
        let delta = position.delta_from(&session.start_pointer);

        let (transform, snap) = match session.kind {
            DragKind::Move => self.apply_move(&session.start_transform, delta, container),
            DragKind::Resize(handle) => {
                let start_rect =
                    transform_to_pixel_rect(&session.start_transform, &fitted, container);
                let rect = resize_rect(&start_rect, handle, delta);
                let transform =
                    self.floor_scale(pixel_rect_to_transform(&rect, &fitted, container));
                let snap = SnapFlags {
                    x: transform.is_centered_x(),
                    y: transform.is_centered_y(),
                };
                (transform, snap)
            }
        };

        self.transform = transform;
        self.drag_snap = snap;
        Some(transform)
    }

    /// End the drag; the last transform stays committed.
    pub fn pointer_up(&mut self) -> Transform {
        if let GestureState::Dragging(session) = self.state {
            tracing::trace!(
                kind = ?session.kind,
                scale = self.transform.scale,
                x = self.transform.x,
                y = self.transform.y,
                "Drag committed"
            );
        }
        self.state = GestureState::Idle;
        self.drag_snap = SnapFlags::default();
        self.transform
    }

    /// Pointer left the container; same as releasing the button.
    pub fn pointer_leave(&mut self) -> Transform {
        self.pointer_up()
    }

    /// Dispatch a recorded or live pointer event.
    ///
    /// Returns the transform when the event changed or committed it.
    pub fn handle_event(&mut self, event: &PointerEvent) -> ReframeResult<Option<Transform>> {
        match event.kind {
            PointerEventKind::Down { x, y, handle } => {
                self.pointer_down(Point::new(x, y), DragKind::from(handle))?;
                Ok(None)
            }
            PointerEventKind::Move { x, y } => Ok(self.pointer_move(Point::new(x, y))),
            PointerEventKind::Up => Ok(Some(self.pointer_up())),
            PointerEventKind::Leave => Ok(Some(self.pointer_leave())),
            PointerEventKind::Resize { width, height } => {
                self.set_container(Size::new(width, height));
                Ok(None)
            }
        }
    }

    fn apply_move(&self, start: &Transform, delta: Point, container: Size) -> (Transform, SnapFlags) {
        let mut x = start.x + delta.x / container.width;
        let mut y = start.y + delta.y / container.height;
        let mut snap = SnapFlags::default();

        if x.abs() < self.config.snap_threshold {
            x = 0.0;
            snap.x = true;
        }
        if y.abs() < self.config.snap_threshold {
            y = 0.0;
            snap.y = true;
        }

        (start.with_offset(x, y), snap)
    }

    fn floor_scale(&self, transform: Transform) -> Transform {
        let floor = self.config.min_scale.max(MIN_SCALE);
        transform.with_scale(clamp_scale(transform.scale, floor))
    }

    fn refit(&mut self) {
        self.fitted = match (self.media_aspect, self.container) {
            (Some(aspect), Some(container)) => fit_contain(aspect, container).ok(),
            _ => None,
        };
    }

    fn layout(&self) -> ReframeResult<(FittedRect, Size)> {
        match (self.fitted, self.container) {
            (Some(fitted), Some(container)) => Ok((fitted, container)),
            (_, None) => Err(ReframeError::not_ready("preview container not measured")),
            (None, Some(_)) => Err(ReframeError::not_ready(
                "media dimensions unknown or container empty",
            )),
        }
    }
}

impl Default for GestureController {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Move the edges of `start` named by `handle` by `delta`.
///
/// `e`/`s` grow the box, `w`/`n` move the left/top edge. Corner handles
/// keep the start box's aspect ratio by deriving height from the new
/// width; when the handle includes `n` the bottom edge stays put.
pub fn resize_rect(start: &Rect, handle: Handle, delta: Point) -> Rect {
    let mut left = start.left;
    let mut top = start.top;
    let mut width = start.width;
    let mut height = start.height;

    if handle.has_east() {
        width += delta.x;
    }
    if handle.has_west() {
        width -= delta.x;
        left += delta.x;
    }
    if handle.has_south() {
        height += delta.y;
    }
    if handle.has_north() {
        height -= delta.y;
        top += delta.y;
    }

    if handle.is_corner() {
        // Height follows width only, whichever edge the pointer leads with.
        height = width / start.aspect();
        if handle.has_north() {
            top = start.bottom() - height;
        }
    }

    Rect::new(left, top, width, height)
}
