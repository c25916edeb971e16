pub mod check;
pub mod export;
pub mod plan;
pub mod probe;
pub mod replay;
pub mod targets;

use std::path::{Path, PathBuf};

use anyhow::Context;

use reframe_common::config::AppConfig;
use reframe_frame_model::color::Color;
use reframe_frame_model::layout::Layout;
use reframe_frame_model::target::TargetFrame;
use reframe_processing_core::gesture::GestureConfig;
use reframe_render_engine::engine::EngineConfig;

/// Parse `WIDTHxHEIGHT` into container pixels.
pub fn parse_size(raw: &str) -> Result<(f64, f64), String> {
    let (w, h) = raw
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got {raw:?}"))?;
    let width: f64 = w.trim().parse().map_err(|_| format!("bad width {w:?}"))?;
    let height: f64 = h.trim().parse().map_err(|_| format!("bad height {h:?}"))?;
    if !(width > 0.0 && height > 0.0) {
        return Err(format!("container must be positive, got {raw:?}"));
    }
    Ok((width, height))
}

/// Configured target frames, optionally narrowed to `selected` labels.
pub fn resolve_targets(config: &AppConfig, selected: &[String]) -> anyhow::Result<Vec<TargetFrame>> {
    let all = config
        .targets
        .iter()
        .map(|spec| {
            TargetFrame::new(spec.label.clone(), spec.width, spec.height)
                .with_context(|| format!("invalid target {:?} in config", spec.label))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    if selected.is_empty() {
        return Ok(all);
    }
    selected
        .iter()
        .map(|label| {
            all.iter()
                .find(|t| t.label() == label)
                .cloned()
                .ok_or_else(|| anyhow::anyhow!("Unknown target: {label}. Run `reframe targets`."))
        })
        .collect()
}

pub fn resolve_background(config: &AppConfig, flag: Option<String>) -> anyhow::Result<Color> {
    let raw = flag.unwrap_or_else(|| config.background.clone());
    raw.parse::<Color>()
        .with_context(|| format!("invalid background colour {raw:?}"))
}

pub fn load_layout(path: Option<&Path>) -> anyhow::Result<Layout> {
    match path {
        Some(path) => Layout::load(path)
            .map_err(|e| anyhow::anyhow!("Failed to load layout: {e}")),
        None => Ok(Layout::new(None)),
    }
}

pub fn gesture_config(config: &AppConfig) -> GestureConfig {
    GestureConfig {
        snap_threshold: config.gesture.snap_threshold,
        min_scale: config.gesture.min_scale,
    }
}

pub fn engine_config(config: &AppConfig) -> EngineConfig {
    EngineConfig {
        scratch_dir: config.exports_dir.join(".scratch"),
        ..EngineConfig::default()
    }
}

pub fn default_output_dir(config: &AppConfig, output: Option<PathBuf>) -> PathBuf {
    output.unwrap_or_else(|| config.exports_dir.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_size() {
        assert_eq!(parse_size("1000x500"), Ok((1000.0, 500.0)));
        assert_eq!(parse_size("640X360"), Ok((640.0, 360.0)));
        assert!(parse_size("1000").is_err());
        assert!(parse_size("0x10").is_err());
        assert!(parse_size("axb").is_err());
    }

    #[test]
    fn test_resolve_targets_filters_and_rejects_unknown() {
        let config = AppConfig::default();
        assert_eq!(resolve_targets(&config, &[]).unwrap().len(), 3);

        let only = resolve_targets(&config, &["portrait".to_string()]).unwrap();
        assert_eq!(only.len(), 1);
        assert_eq!(only[0].height(), 1920);

        assert!(resolve_targets(&config, &["banner".to_string()]).is_err());
    }

    #[test]
    fn test_background_flag_overrides_config() {
        let config = AppConfig::default();
        assert_eq!(resolve_background(&config, None).unwrap(), Color::BLACK);
        assert_eq!(
            resolve_background(&config, Some("#fff".to_string())).unwrap(),
            Color::WHITE
        );
        assert!(resolve_background(&config, Some("chartreuse-ish".to_string())).is_err());
    }
}
