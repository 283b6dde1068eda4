//! Observation and query types shared across the tracker

use image::RgbImage;
use ioumatch::Rect;
use serde::Serialize;
use std::sync::Arc;

/// A single detector observation in one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct RawDetection {
    /// Axis-aligned bounding box in pixel coordinates.
    pub bbox: Rect,
    /// Detection confidence in [0, 1].
    pub score: f64,
    /// Free-form class label; the tracker rewrites this with a
    /// `class_N_YYYYMMDD_HHMMSS` identity once the detection is tracked.
    pub label: String,
}

impl RawDetection {
    pub fn new(bbox: Rect, score: f64, label: impl Into<String>) -> Self {
        Self {
            bbox,
            score,
            label: label.into(),
        }
    }
}

/// A classifier verdict for one cropped detection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Classification {
    pub label: String,
    pub score: f64,
}

impl Classification {
    pub fn new(label: impl Into<String>, score: f64) -> Self {
        Self {
            label: label.into(),
            score,
        }
    }
}

/// Capabilities advertised by the query surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Properties {
    pub detections_supported: bool,
    pub classifications_supported: bool,
    pub object_point_clouds_supported: bool,
}

/// Selects which parts of the current snapshot `capture_all` returns.
#[derive(Debug, Clone, Copy, Default)]
pub struct CaptureOptions {
    pub return_image: bool,
    pub return_detections: bool,
    pub return_classifications: bool,
}

/// A point-in-time capture of the published tracker state.
#[derive(Debug, Clone, Default)]
pub struct Capture {
    pub image: Option<Arc<RgbImage>>,
    pub detections: Option<Vec<RawDetection>>,
    pub classifications: Option<Vec<Classification>>,
}
