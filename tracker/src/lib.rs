//! Stateful multi-object visual tracker
//!
//! Turns a stream of per-frame object detections into persistent identities
//! over time. Each tick the engine filters the detector's output, matches
//! it against live and recently lost tracks with a Hungarian assignment
//! over negated IoU, carries matched identities onto the new bounding
//! boxes, mints identities for the rest, and publishes an immutable
//! snapshot for the thread-safe query surface.
//!
//! The collaborators are narrow traits: a [`Camera`] producing frames, a
//! [`Detector`] producing `(bbox, score, label)` triples, and optionally a
//! [`Classifier`] for per-crop verdicts. [`TrackerService::new`] wires them
//! to a validated [`TrackerConfig`], seeds the engine from two frames, and
//! runs the capture loop until [`TrackerService::close`].
//!
//! Identity lives in the label: tracked detections carry labels of the form
//! `class_N_YYYYMMDD_HHMMSS[_classification]`, and the `class_N` prefix is
//! the track id for the lifetime of the process.

pub mod buffer;
pub mod classify;
pub mod config;
pub mod engine;
pub mod error;
pub mod filter;
pub mod labels;
pub mod matching;
pub mod service;
pub mod sources;
pub mod track;
pub mod types;

pub use config::TrackerConfig;
pub use engine::{NewInstanceTrigger, TickOutput, TrackerEngine, NEW_OBJECT_DETECTED_LABEL};
pub use error::{Result, TrackerError};
pub use filter::filter_detections;
pub use service::{Benchmark, TrackerService};
pub use sources::{Camera, Classifier, Detector};
pub use track::{stable_detections, Track, TrackedObject};
pub use types::{Capture, CaptureOptions, Classification, Properties, RawDetection};
