//! Error types for the object tracker

use thiserror::Error;

/// Result type alias for the tracker.
pub type Result<T> = std::result::Result<T, TrackerError>;

/// Errors surfaced by tracker construction and the query surface.
///
/// The capture loop never propagates errors outward; transient camera,
/// detector, and classifier failures are logged and the tick is skipped.
#[derive(Error, Debug)]
pub enum TrackerError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("camera name given to method, {given}, is not the same as configured camera {configured}")]
    CameraMismatch { given: String, configured: String },

    #[error("tracker has been closed")]
    Cancelled,

    #[error("assignment solver failed: {0}")]
    Solver(String),

    #[error("unable to parse label {0}")]
    LabelParse(String),

    #[error("camera error: {0}")]
    Camera(String),

    #[error("detector error: {0}")]
    Detector(String),

    #[error("unimplemented")]
    Unimplemented,

    #[error("image processing error: {0}")]
    Image(#[from] image::ImageError),

    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl TrackerError {
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    pub fn solver<S: Into<String>>(msg: S) -> Self {
        Self::Solver(msg.into())
    }

    pub fn camera<S: Into<String>>(msg: S) -> Self {
        Self::Camera(msg.into())
    }

    pub fn detector<S: Into<String>>(msg: S) -> Self {
        Self::Detector(msg.into())
    }

    pub fn camera_mismatch<S: Into<String>>(given: S, configured: S) -> Self {
        Self::CameraMismatch {
            given: given.into(),
            configured: configured.into(),
        }
    }
}
