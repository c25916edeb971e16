//! Reframe Frame Model
//!
//! Defines the data contracts shared by the preview and export sides:
//! - **Transform:** normalized scale/pan of media inside a target frame
//! - **Media & Targets:** probed source dimensions and fixed output frames
//! - **Geometry primitives:** container sizes, pixel rectangles, points
//! - **Color:** validated background fill
//! - **Events:** pointer input records driving the gesture controller
//! - **Layout:** per-target transforms exchanged as a JSON file
//!
//! Pan offsets are fractions of the target frame's width/height so a
//! transform survives any change of preview or export resolution.

pub mod color;
pub mod error;
pub mod event;
pub mod layout;
pub mod media;
pub mod rect;
pub mod target;
pub mod transform;

pub use color::*;
pub use error::*;
pub use event::*;
pub use layout::*;
pub use media::*;
pub use rect::*;
pub use target::*;
pub use transform::*;
