//! Contain fitting and the mapping between pixel boxes and transforms.
//!
//! The preview draws the media as a box of `fitted * scale` pixels whose
//! center sits at `container_center + (x * container.w, y * container.h)`.
//! [`transform_to_pixel_rect`] is that forward formula and
//! [`pixel_rect_to_transform`] its inverse.

use reframe_common::error::{ReframeError, ReframeResult};
use reframe_frame_model::rect::{FittedRect, Point, Rect, Size};
use reframe_frame_model::transform::{clamp_scale, Transform, MIN_SCALE};

/// Largest rectangle of aspect `media_aspect` that fits inside `container`,
/// centered.
///
/// Fails with `NotReady` until both the container and the media aspect
/// are known and positive.
pub fn fit_contain(media_aspect: f64, container: Size) -> ReframeResult<FittedRect> {
    if !container.is_measured() {
        return Err(ReframeError::not_ready(format!(
            "container not measured ({}x{})",
            container.width, container.height
        )));
    }
    if !media_aspect.is_finite() || media_aspect <= 0.0 {
        return Err(ReframeError::not_ready(format!(
            "media aspect unknown ({media_aspect})"
        )));
    }

    let (width, height) = if media_aspect > container.aspect() {
        let width = container.width;
        (width, width / media_aspect)
    } else {
        let height = container.height;
        (height * media_aspect, height)
    };

    Ok(Rect::new(
        (container.width - width) / 2.0,
        (container.height - height) / 2.0,
        width,
        height,
    ))
}

/// Re-express a literal pixel box as a transform.
///
/// Scale is floored at [`MIN_SCALE`].
pub fn pixel_rect_to_transform(rect: &Rect, fitted: &FittedRect, container: Size) -> Transform {
    let scale = clamp_scale(rect.width / fitted.width, MIN_SCALE);
    let center = rect.center();
    let x = (center.x - container.width / 2.0) / container.width;
    let y = (center.y - container.height / 2.0) / container.height;
    Transform::new(scale, x, y)
}

/// The pixel box the preview draws for `transform`.
pub fn transform_to_pixel_rect(transform: &Transform, fitted: &FittedRect, container: Size) -> Rect {
    let width = fitted.width * transform.scale;
    let height = fitted.height * transform.scale;
    let center = Point::new(
        container.width / 2.0 + transform.x * container.width,
        container.height / 2.0 + transform.y * container.height,
    );
    Rect::centered(center, width, height)
}
