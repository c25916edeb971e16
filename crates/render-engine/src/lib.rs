//! Reframe Render Engine
//!
//! Turns composition plans into files.
//!
//! # Pipeline Architecture
//!
//! ```text
//! source ──▶ probe ──▶ plan_composition(target, transform)
//!                              │
//!               ┌──────────────┴──────────────┐
//!               ▼                             ▼
//!        image: one draw              video: scale → pad → crop → format
//!        (image crate)                (ffmpeg, one job at a time)
//!               │                             │
//!               ▼                             ▼
//!        <stem>_<label>.png|jpg        <stem>_<label>.mp4
//! ```

pub mod engine;
pub mod export;
pub mod probe;
pub mod raster;
pub mod scratch;
pub mod video;

pub use engine::{EngineConfig, EngineHandle, VideoEngine};
pub use export::*;
pub use probe::{DefaultProber, MediaInfo, MediaProber};
pub use raster::{ImageOutput, ImageRasterBackend, RasterBackend};
pub use video::{EncodeOptions, FfmpegVideoBackend, ProgressFn, VideoBackend};
