//! Natural size (and duration, for video) of a source file.

use std::path::{Path, PathBuf};
use std::process::Command;

use serde::{Deserialize, Serialize};

use reframe_common::error::{ReframeError, ReframeResult};
use reframe_frame_model::media::{MediaDimensions, MediaKind};

/// What a probe learned about a file.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MediaInfo {
    pub kind: MediaKind,
    pub dimensions: MediaDimensions,
    /// Container duration; `None` for images or when ffprobe omits it.
    pub duration_secs: Option<f64>,
}

/// Reads media dimensions from a file.
pub trait MediaProber: Send + Sync {
    fn probe(&self, path: &Path) -> ReframeResult<MediaInfo>;
}

/// ffprobe for video, the `image` crate's header reader for stills.
#[derive(Debug, Clone)]
pub struct DefaultProber {
    ffprobe: PathBuf,
}

impl DefaultProber {
    pub fn new(ffprobe: impl Into<PathBuf>) -> Self {
        Self {
            ffprobe: ffprobe.into(),
        }
    }
}

impl Default for DefaultProber {
    fn default() -> Self {
        Self::new("ffprobe")
    }
}

impl MediaProber for DefaultProber {
    fn probe(&self, path: &Path) -> ReframeResult<MediaInfo> {
        if !path.exists() {
            return Err(ReframeError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let kind = MediaKind::from_path(path).ok_or_else(|| {
            ReframeError::unsupported(format!("unrecognized media type: {}", path.display()))
        })?;

        let info = match kind {
            MediaKind::Image => probe_image(path)?,
            MediaKind::Video => probe_video(&self.ffprobe, path)?,
        };
        tracing::debug!(
            path = %path.display(),
            kind = kind.as_str(),
            dimensions = %info.dimensions,
            duration_secs = ?info.duration_secs,
            "Probed media"
        );
        Ok(info)
    }
}

fn probe_image(path: &Path) -> ReframeResult<MediaInfo> {
    let (width, height) = image::image_dimensions(path)
        .map_err(|e| ReframeError::probe(format!("{}: {e}", path.display())))?;
    let dimensions = MediaDimensions::new(width, height)
        .map_err(|e| ReframeError::probe(format!("{}: {e}", path.display())))?;
    Ok(MediaInfo {
        kind: MediaKind::Image,
        dimensions,
        duration_secs: None,
    })
}

fn probe_video(ffprobe: &Path, path: &Path) -> ReframeResult<MediaInfo> {
    let output = Command::new(ffprobe)
        .args([
            "-v",
            "error",
            "-select_streams",
            "v:0",
            "-show_entries",
            "stream=width,height:stream_side_data=rotation:format=duration",
            "-of",
            "json",
        ])
        .arg(path)
        .output()
        .map_err(|e| ReframeError::probe(format!("cannot run {}: {e}", ffprobe.display())))?;

    if !output.status.success() {
        return Err(ReframeError::probe(format!(
            "ffprobe failed on {} ({}): {}",
            path.display(),
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }

    parse_ffprobe_json(&output.stdout)
        .map_err(|e| ReframeError::probe(format!("{}: {e}", path.display())))
}

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    streams: Vec<FfprobeStream>,
    format: Option<FfprobeFormat>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    width: Option<u32>,
    height: Option<u32>,
    #[serde(default)]
    side_data_list: Vec<FfprobeSideData>,
}

#[derive(Debug, Deserialize)]
struct FfprobeSideData {
    rotation: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

fn parse_ffprobe_json(raw: &[u8]) -> Result<MediaInfo, String> {
    let parsed: FfprobeOutput =
        serde_json::from_slice(raw).map_err(|e| format!("unreadable ffprobe output: {e}"))?;
    let stream = parsed
        .streams
        .first()
        .ok_or_else(|| "no video stream".to_string())?;

    let (width, height) = match (stream.width, stream.height) {
        (Some(w), Some(h)) => (w, h),
        _ => return Err("video stream has no dimensions".to_string()),
    };

    // ffmpeg autorotates on decode, so the filter chain sees the rotated size.
    let rotation = stream
        .side_data_list
        .iter()
        .find_map(|side| side.rotation)
        .unwrap_or(0);
    let (width, height) = if rotation.rem_euclid(180) == 90 {
        (height, width)
    } else {
        (width, height)
    };

    let dimensions = MediaDimensions::new(width, height).map_err(|e| e.to_string())?;
    let duration_secs = parsed
        .format
        .and_then(|f| f.duration)
        .and_then(|d| d.parse::<f64>().ok())
        .filter(|d| d.is_finite() && *d > 0.0);

    Ok(MediaInfo {
        kind: MediaKind::Video,
        dimensions,
        duration_secs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ffprobe_json() {
        let raw = br#"{"programs":[],"streams":[{"width":1920,"height":1080}],"format":{"duration":"12.480000"}}"#;
        let info = parse_ffprobe_json(raw).unwrap();
        assert_eq!(info.dimensions, MediaDimensions::new(1920, 1080).unwrap());
        assert_eq!(info.duration_secs, Some(12.48));
    }

    #[test]
    fn test_parse_ffprobe_rotated_stream() {
        let raw = br#"{"streams":[{"width":1920,"height":1080,"side_data_list":[{"side_data_type":"Display Matrix","rotation":-90}]}]}"#;
        let info = parse_ffprobe_json(raw).unwrap();
        assert_eq!(info.dimensions.width(), 1080);
        assert_eq!(info.dimensions.height(), 1920);
        assert_eq!(info.duration_secs, None);
    }

    #[test]
    fn test_parse_ffprobe_rejects_missing_stream_and_zero() {
        assert!(parse_ffprobe_json(br#"{"streams":[]}"#).is_err());
        assert!(parse_ffprobe_json(br#"{"streams":[{"width":0,"height":720}]}"#).is_err());
        assert!(parse_ffprobe_json(b"not json").is_err());
    }

    #[test]
    fn test_probe_png_header() {
        let path = std::env::temp_dir().join("reframe_test_probe.png");
        image::RgbaImage::new(64, 48).save(&path).unwrap();

        let info = DefaultProber::default().probe(&path).unwrap();
        assert_eq!(info.kind, MediaKind::Image);
        assert_eq!(info.dimensions.width(), 64);
        assert_eq!(info.dimensions.height(), 48);

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_probe_missing_file() {
        let err = DefaultProber::default()
            .probe(Path::new("/nonexistent/clip.mp4"))
            .unwrap_err();
        assert!(matches!(err, ReframeError::FileNotFound { .. }));
    }
}
