//! Fixed-capacity buffer of recently lost tracks
//!
//! The buffer keeps one slot per tick, each holding the stable tracks lost
//! on that tick. Entries are candidates for re-identification; appending a
//! fresh loss removes any stale copy of the same identity from older slots,
//! so the newest observation always wins.

use crate::labels::track_id;
use crate::track::Track;
use std::collections::VecDeque;

#[derive(Debug)]
pub struct TracksBuffer {
    slots: VecDeque<Vec<Track>>,
    capacity: usize,
}

impl TracksBuffer {
    /// Buffer holding at most `capacity` per-tick slots.
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Push the tracks lost this tick as the newest slot.
    ///
    /// Any identity in `lost` is first de-duplicated out of every existing
    /// slot; then, at capacity, the oldest slot is dropped wholesale.
    pub fn append(&mut self, lost: Vec<Track>) {
        for track in &lost {
            let id = track_id(&track.det.label);
            for slot in self.slots.iter_mut() {
                if let Some(pos) = slot.iter().position(|t| track_id(&t.det.label) == id) {
                    slot.remove(pos);
                }
            }
        }
        if self.slots.len() == self.capacity {
            self.slots.pop_front();
        }
        self.slots.push_back(lost);
    }

    /// Remove every buffered copy of `id`. Returns whether anything was
    /// removed. Used when a buffered identity is matched again.
    pub fn remove_id(&mut self, id: &str) -> bool {
        let mut removed = false;
        for slot in self.slots.iter_mut() {
            let before = slot.len();
            slot.retain(|t| track_id(&t.det.label) != id);
            removed |= slot.len() != before;
        }
        removed
    }

    /// All buffered tracks, oldest slot first.
    pub fn flatten(&self) -> Vec<Track> {
        self.slots.iter().flatten().cloned().collect()
    }

    /// Slot view, oldest first.
    pub fn slots(&self) -> impl Iterator<Item = &[Track]> {
        self.slots.iter().map(|s| s.as_slice())
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RawDetection;
    use ioumatch::Rect;

    fn track(label: &str) -> Track {
        Track::new(
            RawDetection::new(Rect::new(0, 0, 10, 10), 1.0, label),
            3,
        )
    }

    #[test]
    fn append_grows_until_capacity_then_evicts_oldest() {
        let mut buf = TracksBuffer::new(2);
        buf.append(vec![track("cat_0_a")]);
        buf.append(vec![track("fish_0_a")]);
        assert_eq!(buf.len(), 2);

        buf.append(vec![track("dog_0_a")]);
        assert_eq!(buf.len(), 2);
        let ids: Vec<String> = buf.flatten().iter().map(|t| t.det.label.clone()).collect();
        assert_eq!(ids, vec!["fish_0_a", "dog_0_a"]);
    }

    #[test]
    fn append_deduplicates_by_track_id() {
        let mut buf = TracksBuffer::new(4);
        buf.append(vec![track("fish_0_20240101_120000")]);
        buf.append(vec![track("cat_0_20240101_120000")]);
        // Losing fish_0 again replaces the old copy rather than duplicating it.
        buf.append(vec![track("fish_0_20240101_120000")]);

        let fish_count = buf
            .flatten()
            .iter()
            .filter(|t| track_id(&t.det.label) == "fish_0")
            .count();
        assert_eq!(fish_count, 1);
        // The stale slot is left in place, now empty.
        let slot_sizes: Vec<usize> = buf.slots().map(|s| s.len()).collect();
        assert_eq!(slot_sizes, vec![0, 1, 1]);
    }

    #[test]
    fn remove_id_clears_every_copy() {
        let mut buf = TracksBuffer::new(4);
        buf.append(vec![track("cat_0_a"), track("fish_0_a")]);
        buf.append(vec![track("dog_0_a")]);
        assert!(buf.remove_id("cat_0"));
        assert!(!buf.remove_id("cat_0"));
        let ids: Vec<String> = buf.flatten().iter().map(|t| t.det.label.clone()).collect();
        assert_eq!(ids, vec!["fish_0_a", "dog_0_a"]);
    }

    #[test]
    fn flatten_preserves_slot_order() {
        let mut buf = TracksBuffer::new(3);
        buf.append(vec![track("a_0_x")]);
        buf.append(vec![track("b_0_x"), track("c_0_x")]);
        let labels: Vec<String> = buf.flatten().iter().map(|t| t.det.label.clone()).collect();
        assert_eq!(labels, vec!["a_0_x", "b_0_x", "c_0_x"]);
    }
}
