//! Reframe Processing Core
//!
//! The geometry shared by the interactive preview and the export pipeline:
//! - **Geometry:** contain fitting and pixel-box <-> transform conversion
//! - **Gesture:** drag state machine turning pointer moves into transforms
//! - **Planner:** exact scale/pad/crop geometry for raster and video exports
//! - **Session:** per-target transform lifecycle for the selected media
//!
//! This crate is pure computation: no I/O, no async, no platform code.
//! All inputs are data; all outputs are data.

pub mod geometry;
pub mod gesture;
pub mod planner;
pub mod session;

pub use geometry::{fit_contain, pixel_rect_to_transform, transform_to_pixel_rect};
pub use gesture::{DragKind, GestureConfig, GestureController, GestureState, SnapFlags};
pub use planner::{plan_composition, CompositionPlan, DrawRect, Stage};
pub use session::{EditSession, Generation, SelectedMedia};
