//! Capability interfaces for the tracker's collaborators
//!
//! Each collaborator is a narrow trait with exactly one method the engine
//! calls. The host wires in concrete implementations; the tracker treats
//! them as opaque.

use crate::types::{Classification, RawDetection};
use image::RgbImage;

/// Produces a lazy sequence of frames.
pub trait Camera: Send {
    /// Fetch the next frame. May block until one is available.
    fn next_frame(&mut self) -> Result<RgbImage, String>;
}

/// Produces per-frame object detections.
pub trait Detector: Send {
    fn detect(&mut self, image: &RgbImage) -> Result<Vec<RawDetection>, String>;
}

/// Classifies a cropped image, returning the top result if any.
pub trait Classifier: Send {
    fn classify(&mut self, image: &RgbImage) -> Result<Option<Classification>, String>;
}
