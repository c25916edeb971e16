//! Fixed output frames.

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// One output frame an export renders into.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawTarget")]
pub struct TargetFrame {
    width: u32,
    height: u32,
    label: String,
}

#[derive(Deserialize)]
struct RawTarget {
    width: u32,
    height: u32,
    label: String,
}

impl TryFrom<RawTarget> for TargetFrame {
    type Error = ModelError;

    fn try_from(raw: RawTarget) -> Result<Self, Self::Error> {
        Self::new(raw.label, raw.width, raw.height)
    }
}

impl TargetFrame {
    /// Both sides must be at least 2 px so the even-dimension rounding
    /// never reaches zero. The label must be non-empty.
    pub fn new(label: impl Into<String>, width: u32, height: u32) -> Result<Self, ModelError> {
        let label = label.into();
        if label.trim().is_empty() {
            return Err(ModelError::InvalidTarget {
                message: "label must not be empty".to_string(),
            });
        }
        if width < 2 || height < 2 {
            return Err(ModelError::InvalidTarget {
                message: format!("{label}: {width}x{height} is smaller than 2x2"),
            });
        }
        Ok(Self {
            width,
            height,
            label,
        })
    }

    /// 1080x1080 square.
    pub fn square() -> Self {
        Self {
            width: 1080,
            height: 1080,
            label: "square".to_string(),
        }
    }

    /// 1920x1080 landscape.
    pub fn landscape() -> Self {
        Self {
            width: 1920,
            height: 1080,
            label: "landscape".to_string(),
        }
    }

    /// 1080x1920 portrait.
    pub fn portrait() -> Self {
        Self {
            width: 1080,
            height: 1920,
            label: "portrait".to_string(),
        }
    }

    pub fn defaults() -> Vec<Self> {
        vec![Self::square(), Self::landscape(), Self::portrait()]
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn aspect(&self) -> f64 {
        self.width as f64 / self.height as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let targets = TargetFrame::defaults();
        let labels: Vec<_> = targets.iter().map(|t| t.label()).collect();
        assert_eq!(labels, vec!["square", "landscape", "portrait"]);
        assert!((targets[2].aspect() - 9.0 / 16.0).abs() < 1e-12);
    }

    #[test]
    fn test_rejects_degenerate_frames() {
        assert!(TargetFrame::new("tiny", 1, 100).is_err());
        assert!(TargetFrame::new("", 100, 100).is_err());
        assert!(TargetFrame::new("odd", 1001, 999).is_ok());
    }
}
