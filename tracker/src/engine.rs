//! The tracking engine: per-tick state and the new-object trigger
//!
//! `TrackerEngine` owns every piece of association state and advances it
//! one frame at a time; the service facade feeds it filtered detections
//! and publishes what it returns. All methods are single-threaded by
//! construction — only the capture loop drives the engine.

use crate::buffer::TracksBuffer;
use crate::error::{Result, TrackerError};
use crate::labels::{self, ClassCounter};
use crate::track::Track;
use crossbeam::channel::{bounded, RecvTimeoutError, Sender};
use ioumatch::HungarianSolver;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Label surfaced by the classification queries while the new-object
/// signal is active.
pub const NEW_OBJECT_DETECTED_LABEL: &str = "new-object-detected";

/// What one engine tick produced.
#[derive(Debug, Clone)]
pub struct TickOutput {
    /// The full published set: updated, then newly stable, then fresh.
    pub published: Vec<Track>,
    /// Tracks that should fire the trigger and enter the stabilized-object
    /// log this tick. With a zero persistence limit every fresh track
    /// stabilizes at birth, so fresh detections land here instead.
    pub stabilized: Vec<Track>,
}

/// Association state for one tracker instance.
pub struct TrackerEngine {
    /// Full per-identity history, keyed by the `class_N` prefix.
    pub(crate) tracks: HashMap<String, Vec<Track>>,
    pub(crate) class_counter: ClassCounter,
    /// Live tracks from the most recent tick, in published order.
    pub(crate) last_detections: Vec<Track>,
    pub(crate) lost_buffer: TracksBuffer,
    pub(crate) persistence_limit: u32,
    pub(crate) classifier_enabled: bool,
}

impl TrackerEngine {
    pub fn new(persistence_limit: u32, buffer_size: usize, classifier_enabled: bool) -> Self {
        Self {
            tracks: HashMap::new(),
            class_counter: ClassCounter::new(),
            last_detections: Vec::new(),
            lost_buffer: TracksBuffer::new(buffer_size),
            persistence_limit,
            classifier_enabled,
        }
    }

    pub fn persistence_limit(&self) -> u32 {
        self.persistence_limit
    }

    /// Live tracks from the most recent tick.
    pub fn last_detections(&self) -> &[Track] {
        &self.last_detections
    }

    /// Mint identities for the very first frame's detections. The next
    /// `tick` matches against these.
    pub fn seed(&mut self, tentative: Vec<Track>) {
        self.last_detections = tentative
            .iter()
            .map(|t| self.rename_first_time(t))
            .collect();
    }

    /// Run one association round over the filtered detections of a frame.
    ///
    /// Fails only when the assignment solver rejects the cost matrix; no
    /// state has been touched at that point, so the caller may degrade via
    /// `tick_unmatched`.
    pub fn tick(&mut self, filtered: Vec<Track>) -> Result<TickOutput> {
        let pool = self.assemble_pool();
        let cost = self.build_matching_matrix(&pool, &filtered);
        let raw = HungarianSolver::solve(cost.view())
            .map_err(|e| TrackerError::solver(e.to_string()))?;
        let matches = self.effective_matches(&raw, &cost, &pool, &filtered);
        Ok(self.apply_matches(&matches, &pool, filtered))
    }

    /// Degradation path when the solver fails mid-run: every pooled track
    /// counts as lost and every detection starts a fresh identity.
    pub fn tick_unmatched(&mut self, filtered: Vec<Track>) -> TickOutput {
        let pool = self.assemble_pool();
        let matches = vec![-1isize; pool.len()];
        self.apply_matches(&matches, &pool, filtered)
    }

    /// Matching pool: live tracks first, then the lost buffer oldest slot
    /// first. The solver observes this order.
    fn assemble_pool(&self) -> Vec<Track> {
        let mut pool = self.last_detections.clone();
        pool.extend(self.lost_buffer.flatten());
        pool
    }

    fn apply_matches(&mut self, matches: &[isize], pool: &[Track], filtered: Vec<Track>) -> TickOutput {
        // Unmatched live tracks are lost: stable ones are buffered as
        // revival candidates, tentative ones are discarded outright.
        let mut lost = Vec::new();
        for (i, track) in self.last_detections.iter().enumerate() {
            if matches[i] == -1 {
                if track.is_stable() {
                    lost.push(track.clone());
                } else {
                    self.tracks.remove(&labels::track_id(&track.det.label));
                }
            }
        }
        self.lost_buffer.append(lost);

        let (updated, newly_stable, fresh) = self.rename_from_matches(matches, pool, &filtered);

        // A buffered identity that matched again is live; drop its buffer
        // copy so it exists in exactly one place.
        for (i, &m) in matches.iter().enumerate().skip(self.last_detections.len()) {
            if m >= 0 {
                self.lost_buffer
                    .remove_id(&labels::track_id(&pool[i].det.label));
            }
        }

        let stabilized = if self.persistence_limit == 0 {
            fresh.clone()
        } else {
            newly_stable.clone()
        };
        let mut published = updated;
        published.extend(newly_stable);
        published.extend(fresh);
        self.last_detections = published.clone();

        TickOutput {
            published,
            stabilized,
        }
    }
}

/// One-shot "something new was just detected" signal with a restartable
/// cooldown.
///
/// `fire` raises the flag and starts a timer; the flag drops when the timer
/// expires. Firing again restarts the dwell from zero. Each timer is a
/// short-lived thread parked on a channel, so a retrigger or shutdown
/// cancels it by closing the channel.
pub struct NewInstanceTrigger {
    flag: Arc<AtomicBool>,
    cooldown: Duration,
    cancel_tx: Option<Sender<()>>,
    worker: Option<JoinHandle<()>>,
}

impl NewInstanceTrigger {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            flag: Arc::new(AtomicBool::new(false)),
            cooldown,
            cancel_tx: None,
            worker: None,
        }
    }

    /// Shared handle to the signal flag, for the query surface.
    pub fn flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.flag)
    }

    pub fn is_active(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Raise the signal and (re)start the cooldown timer.
    pub fn fire(&mut self) {
        self.cancel_current();
        self.flag.store(true, Ordering::SeqCst);

        let (cancel_tx, cancel_rx) = bounded::<()>(0);
        let flag = Arc::clone(&self.flag);
        let cooldown = self.cooldown;
        self.worker = Some(thread::spawn(move || {
            if let Err(RecvTimeoutError::Timeout) = cancel_rx.recv_timeout(cooldown) {
                flag.store(false, Ordering::SeqCst);
            }
        }));
        self.cancel_tx = Some(cancel_tx);
    }

    /// Cancel any running cooldown without touching the flag.
    pub fn shutdown(&mut self) {
        self.cancel_current();
    }

    fn cancel_current(&mut self) {
        if let Some(tx) = self.cancel_tx.take() {
            drop(tx);
        }
        if let Some(handle) = self.worker.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for NewInstanceTrigger {
    fn drop(&mut self) {
        self.cancel_current();
    }
}
