//! Frame-to-frame association: cost matrix, match filtering, renaming
//!
//! Identity continuity lives here. A cost matrix of negated IoU is solved
//! by the Hungarian wrapper; accepted matches carry the old identity onto
//! the new bounding box, and everything left over is given a brand-new
//! identity.

use crate::engine::TrackerEngine;
use crate::labels;
use crate::track::Track;
use ioumatch::{iou_matrix, predict_next, Rect};
use ndarray::Array2;
use std::collections::BTreeSet;

/// A stable track classified as a partial view never continues into a
/// full-view detection; the full view gets a fresh identity instead.
pub(crate) const PARTIAL_VIEW_LABEL: &str = "partial";
pub(crate) const FULL_VIEW_LABEL: &str = "full";

impl TrackerEngine {
    /// Cost matrix for matching `pool` (rows) against `new_tracks`
    /// (columns). Cost is negated IoU so the minimizing solver prefers
    /// higher overlap; a zero cell means no overlap and is never accepted
    /// as a match. When a row's identity has at least two history entries,
    /// the comparison uses its predicted next-frame rectangle.
    pub(crate) fn build_matching_matrix(
        &self,
        pool: &[Track],
        new_tracks: &[Track],
    ) -> Array2<f64> {
        let refs: Vec<Rect> = pool
            .iter()
            .map(|tr| {
                let id = labels::track_id(&tr.det.label);
                match self.tracks.get(&id) {
                    Some(history) if history.len() >= 2 => predict_next(
                        &history[history.len() - 2].det.bbox,
                        &history[history.len() - 1].det.bbox,
                    ),
                    _ => tr.det.bbox,
                }
            })
            .collect();
        let candidates: Vec<Rect> = new_tracks.iter().map(|t| t.det.bbox).collect();
        iou_matrix(&refs, &candidates).mapv(|v| -v)
    }

    /// Rewrite the solver's raw assignment so every rejected match reads as
    /// unmatched for all downstream bookkeeping: zero-cost (no overlap)
    /// cells, and stable partial-view tracks paired with full-view
    /// detections when the classifier is enabled.
    pub(crate) fn effective_matches(
        &self,
        raw: &[isize],
        cost: &Array2<f64>,
        pool: &[Track],
        new_tracks: &[Track],
    ) -> Vec<isize> {
        raw.iter()
            .enumerate()
            .map(|(i, &m)| {
                if m < 0 {
                    return -1;
                }
                let j = m as usize;
                if cost[[i, j]] == 0.0 {
                    return -1;
                }
                if self.classifier_enabled && pool[i].is_stable() {
                    if let (Some(old_c), Some(new_c)) =
                        (&pool[i].classification, &new_tracks[j].classification)
                    {
                        if old_c.label == PARTIAL_VIEW_LABEL && new_c.label == FULL_VIEW_LABEL {
                            return -1;
                        }
                    }
                }
                m
            })
            .collect()
    }

    /// Carry identities from matched pool tracks onto the new detections
    /// and mint identities for the rest.
    ///
    /// Returns `(updated, newly_stable, fresh)`; the published set for the
    /// tick is their concatenation in that order.
    pub(crate) fn rename_from_matches(
        &mut self,
        matches: &[isize],
        pool: &[Track],
        new_tracks: &[Track],
    ) -> (Vec<Track>, Vec<Track>, Vec<Track>) {
        let mut unmatched: BTreeSet<usize> = (0..new_tracks.len()).collect();
        let mut updated = Vec::new();
        let mut newly_stable = Vec::new();

        for (i, &m) in matches.iter().enumerate() {
            if m < 0 {
                continue;
            }
            let j = m as usize;
            if i >= pool.len() || j >= new_tracks.len() {
                continue;
            }
            let (track, became_stable) = self.update_track(&new_tracks[j], &pool[i]);
            if became_stable {
                newly_stable.push(track);
            } else {
                updated.push(track);
            }
            unmatched.remove(&j);
        }

        let mut fresh = Vec::with_capacity(unmatched.len());
        for &j in &unmatched {
            fresh.push(self.rename_first_time(&new_tracks[j]));
        }
        (updated, newly_stable, fresh)
    }

    /// Mint a brand-new identity for a first-seen detection and seed its
    /// history. The track stays tentative until its persistence counter
    /// reaches the limit.
    pub(crate) fn rename_first_time(&mut self, det: &Track) -> Track {
        let base = labels::base_class(&det.det.label);
        let index = self.class_counter.next_index(&base);
        let label = labels::format_label(
            &base,
            index,
            &labels::timestamp(),
            det.classification.as_ref().map(|c| c.label.as_str()),
        );
        let out = det.with_label(label);
        self.tracks.insert(format!("{base}_{index}"), vec![out.clone()]);
        out
    }

    /// Continue `old`'s identity onto `next`'s bounding box, bump
    /// persistence, attach any fresh classification, and append to the
    /// identity's history. Also reports whether the track just crossed the
    /// stability threshold.
    fn update_track(&mut self, next: &Track, old: &Track) -> (Track, bool) {
        let was_stable = old.is_stable();
        let mut track = old.with_bbox(next.det.bbox);
        track.add_persistence();
        if let Some(classification) = &next.classification {
            track = track.with_label(labels::with_classification(
                &track.det.label,
                &classification.label,
            ));
            track.classification = Some(classification.clone());
        }
        let id = labels::track_id(&track.det.label);
        if let Some(history) = self.tracks.get_mut(&id) {
            history.push(track.clone());
        }
        let newly_stable = was_stable != track.is_stable();
        (track, newly_stable)
    }
}
