//! Still-image compositor built on the `image` crate.
//!
//! The plan's scale/pad/crop collapses into one draw: scale the source
//! and overlay it at the plan's draw rect on a background-filled canvas
//! of the output size. Parts hanging off the canvas are clipped.

use std::io::Cursor;
use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};

use reframe_common::error::{ReframeError, ReframeResult};
use reframe_processing_core::planner::CompositionPlan;

/// Output encoding for an image export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageOutput {
    Png,
    Jpeg { quality: u8 },
}

impl ImageOutput {
    /// Same family as the source: JPEG stays JPEG, everything else is PNG.
    pub fn for_source(source: &Path, jpeg_quality: u8) -> Self {
        match ImageFormat::from_path(source) {
            Ok(ImageFormat::Jpeg) => Self::Jpeg {
                quality: jpeg_quality.clamp(1, 100),
            },
            _ => Self::Png,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg { .. } => "jpg",
        }
    }
}

/// Renders one plan of a still image to encoded bytes.
pub trait RasterBackend: Send + Sync {
    fn render(
        &self,
        plan: &CompositionPlan,
        source: &Path,
        output: ImageOutput,
    ) -> ReframeResult<Vec<u8>>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ImageRasterBackend;

impl RasterBackend for ImageRasterBackend {
    fn render(
        &self,
        plan: &CompositionPlan,
        source: &Path,
        output: ImageOutput,
    ) -> ReframeResult<Vec<u8>> {
        let started = std::time::Instant::now();
        let decoded = image::open(source)
            .map_err(|e| ReframeError::encode(format!("cannot decode {}: {e}", source.display())))?;

        let canvas = compose(plan, &decoded);
        let bytes = encode(canvas, output)?;

        tracing::info!(
            label = %plan.target_label,
            width = plan.pad_width,
            height = plan.pad_height,
            bytes = bytes.len(),
            elapsed_ms = started.elapsed().as_millis(),
            "Image rendered"
        );
        Ok(bytes)
    }
}

/// Draw `source` onto a `pad_width x pad_height` canvas per `plan`.
pub fn compose(plan: &CompositionPlan, source: &DynamicImage) -> RgbaImage {
    let mut canvas = RgbaImage::from_pixel(
        plan.pad_width,
        plan.pad_height,
        Rgba(plan.background.to_rgba8()),
    );
    let draw = plan.draw_rect();
    let scaled = source
        .resize_exact(draw.width, draw.height, FilterType::Lanczos3)
        .to_rgba8();
    imageops::overlay(&mut canvas, &scaled, draw.x, draw.y);
    canvas
}

fn encode(canvas: RgbaImage, output: ImageOutput) -> ReframeResult<Vec<u8>> {
    let mut bytes = Vec::new();
    match output {
        ImageOutput::Png => DynamicImage::ImageRgba8(canvas)
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .map_err(|e| ReframeError::encode(format!("PNG encode failed: {e}")))?,
        ImageOutput::Jpeg { quality } => {
            // JPEG has no alpha; flatten first.
            let rgb = DynamicImage::ImageRgba8(canvas).to_rgb8();
            JpegEncoder::new_with_quality(&mut bytes, quality)
                .encode_image(&rgb)
                .map_err(|e| ReframeError::encode(format!("JPEG encode failed: {e}")))?;
        }
    }
    if bytes.is_empty() {
        return Err(ReframeError::encode("encoder produced no bytes"));
    }
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use reframe_frame_model::color::Color;
    use reframe_frame_model::media::MediaDimensions;
    use reframe_frame_model::target::TargetFrame;
    use reframe_frame_model::transform::Transform;
    use reframe_processing_core::planner::plan_composition;

    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);

    // Resampling a flat color can land a unit off.
    fn is_red(p: &Rgba<u8>) -> bool {
        p[0] >= 250 && p[1] <= 5 && p[2] <= 5 && p[3] >= 250
    }

    fn solid(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(width, height, RED))
    }

    fn plan(media: (u32, u32), target: (u32, u32), transform: Transform, bg: Color) -> CompositionPlan {
        plan_composition(
            &MediaDimensions::new(media.0, media.1).unwrap(),
            &TargetFrame::new("t", target.0, target.1).unwrap(),
            &transform,
            bg,
        )
    }

    #[test]
    fn test_letterbox_fills_background() {
        let plan = plan((200, 100), (100, 100), Transform::IDENTITY, Color::WHITE);
        let canvas = compose(&plan, &solid(200, 100));

        assert_eq!(canvas.dimensions(), (100, 100));
        // Media occupies rows 26..76 (50 px tall, placed on the even grid).
        assert_eq!(*canvas.get_pixel(50, 10), Rgba([255, 255, 255, 255]));
        assert!(is_red(canvas.get_pixel(50, 50)));
        assert_eq!(*canvas.get_pixel(50, 90), Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn test_pan_past_edge_is_clipped() {
        let plan = plan((100, 200), (100, 100), Transform::new(1.0, 0.5, 0.0), Color::BLACK);
        let canvas = compose(&plan, &solid(100, 200));

        // 50 px wide media at 25 + 50 = 75, snapped to 76.
        assert_eq!(plan.draw_rect().x, 76);
        assert_eq!(*canvas.get_pixel(10, 50), Rgba([0, 0, 0, 255]));
        assert!(is_red(canvas.get_pixel(90, 50)));
    }

    #[test]
    fn test_negative_offset_draws_visible_part() {
        let plan = plan((100, 100), (100, 100), Transform::new(2.0, 0.0, 0.0), Color::BLACK);
        let canvas = compose(&plan, &solid(100, 100));
        assert_eq!(plan.draw_rect().x, -50);
        assert!(canvas.pixels().all(is_red));
    }

    #[test]
    fn test_output_format_follows_source() {
        assert_eq!(
            ImageOutput::for_source(Path::new("a.JPG"), 90),
            ImageOutput::Jpeg { quality: 90 }
        );
        assert_eq!(ImageOutput::for_source(Path::new("a.webp"), 90), ImageOutput::Png);
        assert_eq!(ImageOutput::for_source(Path::new("a.png"), 90).extension(), "png");
    }

    #[test]
    fn test_encode_png_and_jpeg() {
        let canvas = RgbaImage::from_pixel(8, 8, RED);
        let png = encode(canvas.clone(), ImageOutput::Png).unwrap();
        assert_eq!(&png[..4], b"\x89PNG");
        let jpeg = encode(canvas, ImageOutput::Jpeg { quality: 80 }).unwrap();
        assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn test_render_from_file() {
        let path = std::env::temp_dir().join("reframe_test_raster_source.png");
        RgbaImage::from_pixel(40, 20, RED).save(&path).unwrap();

        let plan = plan((40, 20), (30, 30), Transform::IDENTITY, Color::BLACK);
        let bytes = ImageRasterBackend
            .render(&plan, &path, ImageOutput::Png)
            .unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (30, 30));

        std::fs::remove_file(&path).ok();
    }
}
