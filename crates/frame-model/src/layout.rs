//! Layout file: the per-target transforms for one media file.
//!
//! A layout is what the preview hands to the export side. It is keyed by
//! target label; a label without an entry exports with the identity
//! transform.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::transform::Transform;

/// Current layout schema version.
pub const LAYOUT_VERSION: &str = "1.0";

/// Top-level layout file (`layout.json`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    /// Schema version.
    pub version: String,

    /// Media file the transforms were made for, if recorded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media: Option<PathBuf>,

    /// Last modified timestamp (RFC 3339).
    pub modified_at: String,

    /// Transform per target label.
    #[serde(default)]
    pub transforms: BTreeMap<String, Transform>,
}

impl Layout {
    /// Create an empty layout.
    pub fn new(media: Option<PathBuf>) -> Self {
        Self {
            version: LAYOUT_VERSION.to_string(),
            media,
            modified_at: chrono::Utc::now().to_rfc3339(),
            transforms: BTreeMap::new(),
        }
    }

    /// Transform for `label`, identity when absent. Always sanitized.
    pub fn transform_for(&self, label: &str) -> Transform {
        self.transforms
            .get(label)
            .copied()
            .unwrap_or_default()
            .sanitized()
    }

    /// Record the transform for `label` and bump `modified_at`.
    pub fn set(&mut self, label: impl Into<String>, transform: Transform) {
        self.transforms.insert(label.into(), transform.sanitized());
        self.modified_at = chrono::Utc::now().to_rfc3339();
    }

    /// Load a layout from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LayoutError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| LayoutError::IoError {
            path: path.to_path_buf(),
            source: e,
        })?;
        let layout: Layout = serde_json::from_str(&json).map_err(|e| LayoutError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })?;
        if layout.version != LAYOUT_VERSION {
            return Err(LayoutError::ValidationError {
                message: format!(
                    "unsupported layout version {} (expected {LAYOUT_VERSION})",
                    layout.version
                ),
            });
        }
        Ok(layout)
    }

    /// Load `path` if it exists, otherwise start an empty layout.
    pub fn load_or_new(path: impl AsRef<Path>, media: Option<PathBuf>) -> Result<Self, LayoutError> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::new(media))
        }
    }

    /// Save the layout as pretty JSON, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), LayoutError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| LayoutError::IoError {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|e| LayoutError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })?;
        std::fs::write(path, json).map_err(|e| LayoutError::IoError {
            path: path.to_path_buf(),
            source: e,
        })
    }
}

/// Errors that can occur when reading or writing layouts.
#[derive(Debug, thiserror::Error)]
pub enum LayoutError {
    #[error("I/O error at {path}: {source}")]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Parse error in {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Invalid layout: {message}")]
    ValidationError { message: String },
}
