//! Validation errors raised when constructing model values.

/// Errors produced while validating model inputs.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ModelError {
    #[error("Media dimensions must be non-zero (got {width}x{height})")]
    ZeroDimension { width: u32, height: u32 },

    #[error("Invalid target frame: {message}")]
    InvalidTarget { message: String },

    #[error("Invalid colour {input:?}: {message}")]
    InvalidColor { input: String, message: String },

    #[error("Unknown resize handle {id:?} (expected one of n, s, e, w, ne, nw, se, sw)")]
    InvalidHandle { id: String },
}
