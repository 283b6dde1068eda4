//! Detection filtering by class allow-list and confidence floors

use crate::labels::base_class;
use crate::types::RawDetection;
use std::collections::HashMap;

/// Keep detections that pass both the per-class thresholds and the global
/// confidence floor.
///
/// With an empty `chosen_labels` map every class is allowed and only the
/// global floor applies. Otherwise a detection passes when its base class is
/// in the map, its score is strictly above the per-class threshold, and at
/// or above `min_confidence`.
pub fn filter_detections(
    chosen_labels: &HashMap<String, f64>,
    dets: Vec<RawDetection>,
    min_confidence: f64,
) -> Vec<RawDetection> {
    let mut out = dets;
    if !chosen_labels.is_empty() {
        out.retain(|d| {
            chosen_labels
                .get(&base_class(&d.label))
                .is_some_and(|&min| d.score > min)
        });
    }
    out.retain(|d| d.score >= min_confidence);
    out
}
