//! Pointer event types delivered by a preview surface.
//!
//! Events travel as JSONL (one object per line) so a recorded drag can be
//! replayed against the gesture controller. Positions are container
//! pixels relative to the preview container's top-left corner.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// Milliseconds since the surface started delivering events.
pub type TimestampMs = u64;

/// One of the eight resize handles on the bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Handle {
    N,
    S,
    E,
    W,
    Ne,
    Nw,
    Se,
    Sw,
}

impl Handle {
    pub const ALL: [Handle; 8] = [
        Handle::N,
        Handle::S,
        Handle::E,
        Handle::W,
        Handle::Ne,
        Handle::Nw,
        Handle::Se,
        Handle::Sw,
    ];

    /// Handle identifier as used by the surface (`"n"`, `"se"`, ...).
    pub fn id(self) -> &'static str {
        match self {
            Self::N => "n",
            Self::S => "s",
            Self::E => "e",
            Self::W => "w",
            Self::Ne => "ne",
            Self::Nw => "nw",
            Self::Se => "se",
            Self::Sw => "sw",
        }
    }

    pub fn has_north(self) -> bool {
        self.id().contains('n')
    }

    pub fn has_south(self) -> bool {
        self.id().contains('s')
    }

    pub fn has_east(self) -> bool {
        self.id().contains('e')
    }

    pub fn has_west(self) -> bool {
        self.id().contains('w')
    }

    /// Corner handles carry two compass letters and lock aspect ratio.
    pub fn is_corner(self) -> bool {
        self.id().len() == 2
    }
}

impl FromStr for Handle {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let id = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|h| h.id() == id)
            .ok_or(ModelError::InvalidHandle { id })
    }
}

impl std::fmt::Display for Handle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

/// A single pointer input record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointerEvent {
    /// Arrival time; informational only, events apply in arrival order.
    #[serde(rename = "t", default)]
    pub timestamp_ms: TimestampMs,

    /// The event payload.
    #[serde(flatten)]
    pub kind: PointerEventKind,
}

/// Discriminated union of pointer event types.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PointerEventKind {
    /// Button pressed on the box body (`handle` absent) or on a handle.
    Down {
        x: f64,
        y: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        handle: Option<Handle>,
    },

    /// Pointer moved while the container has focus.
    Move { x: f64, y: f64 },

    /// Button released.
    Up,

    /// Pointer left the container.
    Leave,

    /// The container was resized.
    Resize { width: f64, height: f64 },
}

impl PointerEvent {
    pub fn down(timestamp_ms: TimestampMs, x: f64, y: f64, handle: Option<Handle>) -> Self {
        Self {
            timestamp_ms,
            kind: PointerEventKind::Down { x, y, handle },
        }
    }

    pub fn moved(timestamp_ms: TimestampMs, x: f64, y: f64) -> Self {
        Self {
            timestamp_ms,
            kind: PointerEventKind::Move { x, y },
        }
    }

    pub fn up(timestamp_ms: TimestampMs) -> Self {
        Self {
            timestamp_ms,
            kind: PointerEventKind::Up,
        }
    }

    pub fn leave(timestamp_ms: TimestampMs) -> Self {
        Self {
            timestamp_ms,
            kind: PointerEventKind::Leave,
        }
    }

    pub fn resize(timestamp_ms: TimestampMs, width: f64, height: f64) -> Self {
        Self {
            timestamp_ms,
            kind: PointerEventKind::Resize { width, height },
        }
    }

    /// Extract pointer position if this event contains one.
    pub fn position(&self) -> Option<(f64, f64)> {
        match &self.kind {
            PointerEventKind::Down { x, y, .. } | PointerEventKind::Move { x, y } => {
                Some((*x, *y))
            }
            _ => None,
        }
    }
}

/// Parse events from JSONL content (one JSON object per line).
///
/// Blank lines and lines starting with `#` are skipped.
pub fn parse_events(jsonl: &str) -> Result<Vec<PointerEvent>, serde_json::Error> {
    jsonl
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(serde_json::from_str)
        .collect()
}

/// Serialize events to JSONL format.
pub fn serialize_events(events: &[PointerEvent]) -> Result<String, serde_json::Error> {
    let mut output = String::new();
    for event in events {
        output.push_str(&serde_json::to_string(event)?);
        output.push('\n');
    }
    Ok(output)
}
