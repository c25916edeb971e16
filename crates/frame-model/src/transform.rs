//! Normalized media transform relative to a target frame.

use serde::{Deserialize, Serialize};

/// Smallest scale a transform may carry.
pub const MIN_SCALE: f64 = 0.1;

/// How media sits inside a target frame.
///
/// `scale` multiplies the contain-fitted size (`1.0` = exactly fitted).
/// `x` and `y` shift the media's center by a fraction of the target
/// frame's width and height, so `x = 0.5` moves it right by half a frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub scale: f64,
    pub x: f64,
    pub y: f64,
}

impl Transform {
    /// Fitted and centered.
    pub const IDENTITY: Transform = Transform {
        scale: 1.0,
        x: 0.0,
        y: 0.0,
    };

    /// Create a transform, clamping scale to [`MIN_SCALE`].
    ///
    /// Non-finite pan values collapse to zero.
    pub fn new(scale: f64, x: f64, y: f64) -> Self {
        Self {
            scale: clamp_scale(scale, MIN_SCALE),
            x: if x.is_finite() { x } else { 0.0 },
            y: if y.is_finite() { y } else { 0.0 },
        }
    }

    /// Same pan, different scale (clamped).
    pub fn with_scale(self, scale: f64) -> Self {
        Self::new(scale, self.x, self.y)
    }

    /// Same scale, different pan.
    pub fn with_offset(self, x: f64, y: f64) -> Self {
        Self::new(self.scale, x, y)
    }

    /// Re-apply the scale floor to a value that may have been deserialized
    /// or built by hand.
    pub fn sanitized(self) -> Self {
        Self::new(self.scale, self.x, self.y)
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    pub fn is_centered_x(&self) -> bool {
        self.x == 0.0
    }

    pub fn is_centered_y(&self) -> bool {
        self.y == 0.0
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Clamp a scale to `floor`, mapping NaN and non-positive values to the floor.
pub fn clamp_scale(scale: f64, floor: f64) -> f64 {
    if scale.is_nan() || scale < floor {
        floor
    } else if scale.is_infinite() {
        f64::MAX
    } else {
        scale
    }
}
