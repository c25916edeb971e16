//! Application configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Global application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Directory where exports are written when no output is given.
    pub exports_dir: PathBuf,

    /// Background fill for areas the media does not cover (colour string).
    pub background: String,

    /// Output frames every export targets.
    pub targets: Vec<TargetSpec>,

    /// Encoder settings.
    pub encode: EncodeDefaults,

    /// Pointer gesture tuning.
    pub gesture: GestureDefaults,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// A configured output frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetSpec {
    pub label: String,
    pub width: u32,
    pub height: u32,
}

/// Default encoder parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EncodeDefaults {
    /// ffmpeg video codec name.
    pub video_codec: String,

    /// Encoder speed/quality preset.
    pub preset: String,

    /// Constant rate factor (lower = better quality).
    pub crf: u8,

    /// Encoder threads (0 = let the encoder decide).
    pub threads: u32,

    /// JPEG quality for still exports.
    pub jpeg_quality: u8,
}

/// Gesture tuning values.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureDefaults {
    /// Pan distance (fraction of frame) under which the media snaps to center.
    pub snap_threshold: f64,

    /// Lower bound for the transform scale.
    pub min_scale: f64,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "reframe=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,

    /// Optional log file path.
    pub file: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            exports_dir: default_exports_dir(),
            background: "#000000".to_string(),
            targets: TargetSpec::defaults(),
            encode: EncodeDefaults::default(),
            gesture: GestureDefaults::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl TargetSpec {
    pub fn new(label: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            label: label.into(),
            width,
            height,
        }
    }

    /// Square, landscape, and portrait frames.
    pub fn defaults() -> Vec<Self> {
        vec![
            Self::new("square", 1080, 1080),
            Self::new("landscape", 1920, 1080),
            Self::new("portrait", 1080, 1920),
        ]
    }
}

impl Default for EncodeDefaults {
    fn default() -> Self {
        Self {
            video_codec: "libx264".to_string(),
            preset: "veryfast".to_string(),
            crf: 23,
            threads: 0,
            jpeg_quality: 92,
        }
    }
}

impl Default for GestureDefaults {
    fn default() -> Self {
        Self {
            snap_threshold: 0.03,
            min_scale: 0.1,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file: None,
        }
    }
}

impl AppConfig {
    /// Load config from the standard location, falling back to defaults.
    pub fn load() -> Self {
        Self::load_from(&config_file_path())
    }

    /// Load config from an explicit path, falling back to defaults.
    pub fn load_from(config_path: &Path) -> Self {
        if config_path.exists() {
            match std::fs::read_to_string(config_path) {
                Ok(content) => match serde_json::from_str(&content) {
                    Ok(config) => return config,
                    Err(e) => {
                        tracing::warn!("Failed to parse config at {:?}: {}", config_path, e);
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read config at {:?}: {}", config_path, e);
                }
            }
        }
        Self::default()
    }

    /// Save config to the standard location.
    pub fn save(&self) -> Result<(), std::io::Error> {
        self.save_to(&config_file_path())
    }

    /// Save config to an explicit path.
    pub fn save_to(&self, config_path: &Path) -> Result<(), std::io::Error> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(config_path, json)
    }

    /// Look up a configured target by label.
    pub fn target(&self, label: &str) -> Option<&TargetSpec> {
        self.targets.iter().find(|t| t.label == label)
    }
}

/// Standard config file location.
pub fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("reframe").join("config.json")
}

/// Default exports directory.
fn default_exports_dir() -> PathBuf {
    let base = std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".local").join("share")
        });
    base.join("reframe").join("exports")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_targets_cover_three_orientations() {
        let config = AppConfig::default();
        assert_eq!(config.targets.len(), 3);
        assert_eq!(config.target("square").map(|t| t.width), Some(1080));
        assert_eq!(config.target("portrait").map(|t| t.height), Some(1920));
        assert!(config.target("missing").is_none());
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let parsed: AppConfig =
            serde_json::from_str(r##"{"background": "#ffffff", "encode": {"crf": 18}}"##).unwrap();
        assert_eq!(parsed.background, "#ffffff");
        assert_eq!(parsed.encode.crf, 18);
        assert_eq!(parsed.encode.video_codec, "libx264");
        assert_eq!(parsed.targets, TargetSpec::defaults());
        assert!((parsed.gesture.snap_threshold - 0.03).abs() < 1e-12);
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let path = std::env::temp_dir()
            .join("reframe_test_config")
            .join("config.json");
        let _ = std::fs::remove_file(&path);

        let mut config = AppConfig::default();
        config.targets = vec![TargetSpec::new("story", 720, 1280)];
        config.save_to(&path).unwrap();

        let loaded = AppConfig::load_from(&path);
        assert_eq!(loaded.targets, vec![TargetSpec::new("story", 720, 1280)]);

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_unparseable_config_falls_back_to_defaults() {
        let path = std::env::temp_dir().join("reframe_test_bad_config.json");
        std::fs::write(&path, "{ not json").unwrap();

        let loaded = AppConfig::load_from(&path);
        assert_eq!(loaded.background, "#000000");

        std::fs::remove_file(&path).ok();
    }
}
