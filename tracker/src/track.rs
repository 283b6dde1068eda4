//! Track records and persistence bookkeeping

use crate::error::{Result, TrackerError};
use crate::types::{Classification, RawDetection};
use ioumatch::Rect;
use serde::Serialize;

/// A tracked detection with its persistence state across frames.
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    /// The current detection, label rewritten with the track's identity.
    pub det: RawDetection,
    /// Most recent classifier verdict for this object, if any.
    pub classification: Option<Classification>,
    persistence_limit: u32,
    persistence_count: u32,
    stable: bool,
}

impl Track {
    /// Wrap a detection as a tentative track with a fresh persistence
    /// counter. A limit of zero makes the track stable at birth.
    pub fn new(det: RawDetection, persistence_limit: u32) -> Self {
        Self {
            det,
            classification: None,
            persistence_limit,
            persistence_count: 0,
            stable: persistence_limit == 0,
        }
    }

    /// Wrap a batch of detections as tentative tracks.
    pub fn from_detections(dets: Vec<RawDetection>, persistence_limit: u32) -> Vec<Self> {
        dets.into_iter()
            .map(|d| Self::new(d, persistence_limit))
            .collect()
    }

    /// Whether this track has persisted long enough to count as stable.
    /// Once set, the flag never clears.
    pub fn is_stable(&self) -> bool {
        self.stable
    }

    pub fn persistence_count(&self) -> u32 {
        self.persistence_count
    }

    /// Record one more tick of continuous matching. Counting stops once the
    /// track is stable.
    pub fn add_persistence(&mut self) {
        if self.stable {
            return;
        }
        self.persistence_count += 1;
        if self.persistence_count >= self.persistence_limit {
            self.stable = true;
        }
    }

    /// An otherwise identical track carrying a new label.
    pub fn with_label(&self, label: impl Into<String>) -> Self {
        let mut out = self.clone();
        out.det.label = label.into();
        out
    }

    /// An otherwise identical track carrying a new bounding box.
    pub fn with_bbox(&self, bbox: Rect) -> Self {
        let mut out = self.clone();
        out.det.bbox = bbox;
        out
    }
}

/// The bounding boxes of stable tracks only; tentative tracks stay hidden
/// from the query surface.
pub fn stable_detections(tracks: &[Track]) -> Vec<RawDetection> {
    tracks
        .iter()
        .filter(|t| t.is_stable())
        .map(|t| t.det.clone())
        .collect()
}

/// Log row recorded when a track becomes stable.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackedObject {
    pub full_label: String,
    pub label: String,
    pub id: u32,
    pub time: String,
}

impl TrackedObject {
    /// Parse a `class_N_YYYYMMDD_HHMMSS[_classification]` label into a log
    /// row.
    pub fn from_label(label: &str) -> Result<Self> {
        let parts: Vec<&str> = label.split('_').collect();
        let id = parts
            .get(1)
            .and_then(|p| p.parse::<u32>().ok())
            .ok_or_else(|| TrackerError::LabelParse(label.to_string()))?;
        Ok(Self {
            full_label: label.to_string(),
            label: parts[0].to_string(),
            id,
            time: parts[2..].join("_"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ioumatch::Rect;

    fn det(label: &str) -> RawDetection {
        RawDetection::new(Rect::new(0, 0, 10, 10), 1.0, label)
    }

    #[test]
    fn persistence_crosses_the_limit_once() {
        let mut tr = Track::new(det("cat"), 2);
        assert!(!tr.is_stable());
        tr.add_persistence();
        assert!(!tr.is_stable());
        assert_eq!(tr.persistence_count(), 1);
        tr.add_persistence();
        assert!(tr.is_stable());
        // Counting clamps once stable.
        tr.add_persistence();
        assert_eq!(tr.persistence_count(), 2);
        assert!(tr.is_stable());
    }

    #[test]
    fn zero_limit_is_stable_at_birth() {
        let tr = Track::new(det("cat"), 0);
        assert!(tr.is_stable());
    }

    #[test]
    fn replacements_keep_other_fields() {
        let mut tr = Track::new(det("cat"), 2);
        tr.classification = Some(Classification::new("partial", 0.9));
        let renamed = tr.with_label("cat_0_20240101_120000");
        assert_eq!(renamed.det.label, "cat_0_20240101_120000");
        assert_eq!(renamed.det.bbox, tr.det.bbox);
        assert_eq!(renamed.classification, tr.classification);

        let moved = renamed.with_bbox(Rect::new(5, 5, 15, 15));
        assert_eq!(moved.det.label, "cat_0_20240101_120000");
        assert_eq!(moved.det.bbox, Rect::new(5, 5, 15, 15));
    }

    #[test]
    fn stable_filter_hides_tentative_tracks() {
        let mut stable = Track::new(det("cat_0_x"), 1);
        stable.add_persistence();
        let tentative = Track::new(det("fish_0_x"), 1);
        let dets = stable_detections(&[stable, tentative]);
        assert_eq!(dets.len(), 1);
        assert_eq!(dets[0].label, "cat_0_x");
    }

    #[test]
    fn tracked_object_parses_labels() {
        let to = TrackedObject::from_label("cat_3_20240101_120000").unwrap();
        assert_eq!(to.label, "cat");
        assert_eq!(to.id, 3);
        assert_eq!(to.time, "20240101_120000");
        assert_eq!(to.full_label, "cat_3_20240101_120000");

        let with_class = TrackedObject::from_label("cat_3_20240101_120000_full").unwrap();
        assert_eq!(with_class.time, "20240101_120000_full");
    }

    #[test]
    fn malformed_labels_fail_to_parse() {
        assert!(TrackedObject::from_label("cat").is_err());
        assert!(TrackedObject::from_label("cat_x_20240101").is_err());
    }
}
