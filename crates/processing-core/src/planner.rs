//! Composition planning: transform + source/target sizes -> scale/pad/crop.
//!
//! The same plan drives the raster compositor (one draw call) and the
//! video filter chain (scale, pad, crop, format), so both produce the
//! same visible geometry.
//!
//! All output dimensions and offsets are even. Block-based encoders need
//! even frame sizes, and ffmpeg's pad/crop round odd offsets down to the
//! chroma grid for 4:2:0 input; keeping everything even means neither
//! backend moves a pixel the other does not.

use serde::Serialize;

use reframe_frame_model::color::Color;
use reframe_frame_model::media::MediaDimensions;
use reframe_frame_model::target::TargetFrame;
use reframe_frame_model::transform::Transform;

/// Smallest scaled media side.
pub const MIN_SCALED_DIMENSION: u32 = 2;

/// Pixel format the video chain ends with.
pub const OUTPUT_PIXEL_FORMAT: &str = "yuv420p";

/// One geometric stage of a composition.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum Stage {
    /// Resize the source to `width x height`.
    Scale { width: u32, height: u32 },

    /// Place the scaled media at `(x, y)` on a `width x height` canvas
    /// filled with `color`.
    Pad {
        width: u32,
        height: u32,
        x: u32,
        y: u32,
        color: Color,
    },

    /// Cut the `width x height` window at `(x, y)` out of the canvas.
    Crop {
        width: u32,
        height: u32,
        x: u32,
        y: u32,
    },

    /// Convert to the encoder's pixel format.
    Format { pixel_format: String },
}

impl Stage {
    /// This stage as an ffmpeg filter.
    pub fn to_ffmpeg(&self) -> String {
        match self {
            Stage::Scale { width, height } => format!("scale={width}:{height}:flags=lanczos"),
            Stage::Pad {
                width,
                height,
                x,
                y,
                color,
            } => format!(
                "pad={width}:{height}:{x}:{y}:color={}",
                color.to_ffmpeg()
            ),
            Stage::Crop {
                width,
                height,
                x,
                y,
            } => format!("crop={width}:{height}:{x}:{y}:exact=1"),
            Stage::Format { pixel_format } => format!("format={pixel_format}"),
        }
    }
}

/// Where the raster path draws the scaled media on a
/// `pad_width x pad_height` canvas. May hang off any edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DrawRect {
    pub x: i64,
    pub y: i64,
    pub width: u32,
    pub height: u32,
}

/// Exact export geometry for one media/target/transform triple.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompositionPlan {
    pub target_label: String,
    pub media: MediaDimensions,
    pub transform: Transform,
    pub background: Color,

    /// Output frame after the even-dimension adjustment.
    pub pad_width: u32,
    pub pad_height: u32,

    /// Contain scale of media into the output frame.
    pub base_scale: f64,
    /// `base_scale * transform.scale`.
    pub final_scale: f64,

    /// Media size after scaling (even, at least 2).
    pub scaled_width: u32,
    pub scaled_height: u32,

    /// Top-left of the scaled media relative to the output frame.
    pub x_pos: i64,
    pub y_pos: i64,

    /// Intermediate canvas holding the whole scaled media.
    pub canvas_width: u32,
    pub canvas_height: u32,

    pub pad_x: u32,
    pub pad_y: u32,
    pub crop_x: u32,
    pub crop_y: u32,

    /// Ordered stages: scale, pad, crop, format.
    pub stages: Vec<Stage>,
}

impl CompositionPlan {
    /// ffmpeg `-vf` chain for the video backend.
    pub fn filter_chain(&self) -> String {
        self.stages
            .iter()
            .map(Stage::to_ffmpeg)
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Single draw call for the raster backend.
    pub fn draw_rect(&self) -> DrawRect {
        DrawRect {
            x: self.pad_x as i64 - self.crop_x as i64,
            y: self.pad_y as i64 - self.crop_y as i64,
            width: self.scaled_width,
            height: self.scaled_height,
        }
    }

    /// Whether the final crop has to discard canvas on the left or top.
    pub fn needs_crop(&self) -> bool {
        self.crop_x > 0 || self.crop_y > 0
    }

    /// Media already matches the output exactly.
    pub fn is_passthrough(&self) -> bool {
        self.scaled_width == self.pad_width
            && self.scaled_height == self.pad_height
            && self.x_pos == 0
            && self.y_pos == 0
            && self.media.width() == self.pad_width
            && self.media.height() == self.pad_height
    }
}

/// Compute the export geometry for `media` rendered into `target`.
///
/// `media` cannot be zero-sized and `target` is at least 2x2, so every
/// input here is plannable; unprobed media must be rejected before this.
pub fn plan_composition(
    media: &MediaDimensions,
    target: &TargetFrame,
    transform: &Transform,
    background: Color,
) -> CompositionPlan {
    let transform = transform.sanitized();

    let pad_width = floor_even(target.width());
    let pad_height = floor_even(target.height());

    let media_w = media.width() as f64;
    let media_h = media.height() as f64;
    let base_scale = (pad_width as f64 / media_w).min(pad_height as f64 / media_h);
    let final_scale = base_scale * transform.scale;

    let scaled_width = scaled_dimension(media_w * final_scale);
    let scaled_height = scaled_dimension(media_h * final_scale);

    // Media wholly outside the frame renders the same at any distance, so
    // positions stop one media length past either edge.
    let x_pos = nearest_even(
        (pad_width as f64 - scaled_width as f64) / 2.0 + pad_width as f64 * transform.x,
    )
    .clamp(-(scaled_width as i64), pad_width as i64);
    let y_pos = nearest_even(
        (pad_height as f64 - scaled_height as f64) / 2.0 + pad_height as f64 * transform.y,
    )
    .clamp(-(scaled_height as i64), pad_height as i64);

    let pad_x = clamp_u32(x_pos.max(0));
    let pad_y = clamp_u32(y_pos.max(0));
    let crop_x = clamp_u32((-x_pos).max(0));
    let crop_y = clamp_u32((-y_pos).max(0));

    // Grows past max(pad, scaled) only when a pan pushes the media over an edge.
    let canvas_width = pad_width
        .max(scaled_width)
        .max(pad_x.saturating_add(scaled_width))
        .max(crop_x.saturating_add(pad_width));
    let canvas_height = pad_height
        .max(scaled_height)
        .max(pad_y.saturating_add(scaled_height))
        .max(crop_y.saturating_add(pad_height));

    let stages = vec![
        Stage::Scale {
            width: scaled_width,
            height: scaled_height,
        },
        Stage::Pad {
            width: canvas_width,
            height: canvas_height,
            x: pad_x,
            y: pad_y,
            color: background,
        },
        Stage::Crop {
            width: pad_width,
            height: pad_height,
            x: crop_x,
            y: crop_y,
        },
        Stage::Format {
            pixel_format: OUTPUT_PIXEL_FORMAT.to_string(),
        },
    ];

    CompositionPlan {
        target_label: target.label().to_string(),
        media: *media,
        transform,
        background,
        pad_width,
        pad_height,
        base_scale,
        final_scale,
        scaled_width,
        scaled_height,
        x_pos,
        y_pos,
        canvas_width,
        canvas_height,
        pad_x,
        pad_y,
        crop_x,
        crop_y,
        stages,
    }
}

fn floor_even(value: u32) -> u32 {
    value - value % 2
}

fn scaled_dimension(value: f64) -> u32 {
    // `as` saturates, so huge scales clamp to u32::MAX instead of wrapping.
    let rounded = value.round() as u32;
    floor_even(rounded).max(MIN_SCALED_DIMENSION)
}

fn nearest_even(value: f64) -> i64 {
    // Bounded well inside i64 so doubling cannot overflow.
    const LIMIT: f64 = u32::MAX as f64;
    let half = (value / 2.0).round().clamp(-LIMIT, LIMIT);
    half as i64 * 2
}

fn clamp_u32(value: i64) -> u32 {
    value.clamp(0, u32::MAX as i64) as u32
}
