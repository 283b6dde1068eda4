//! Thread-safe service facade over the tracking engine
//!
//! Construction validates the configuration, seeds the engine from two
//! frames, and spawns the capture loop. Queries read the published
//! per-tick snapshot and never block the loop beyond that read.

use crate::classify::classify_tracks;
use crate::config::TrackerConfig;
use crate::engine::{NewInstanceTrigger, TickOutput, TrackerEngine, NEW_OBJECT_DETECTED_LABEL};
use crate::error::{Result, TrackerError};
use crate::filter::filter_detections;
use crate::sources::{Camera, Classifier, Detector};
use crate::track::{stable_detections, Track, TrackedObject};
use crate::types::{Capture, CaptureOptions, Classification, Properties, RawDetection};
use crossbeam::channel::{bounded, Receiver, RecvTimeoutError};
use image::RgbImage;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// State shared between the capture loop and the query surface.
#[derive(Debug)]
struct SharedState {
    cancelled: AtomicBool,
    current_detections: RwLock<Vec<Track>>,
    current_image: RwLock<Option<Arc<RgbImage>>>,
    all_fresh_objects: RwLock<Vec<TrackedObject>>,
    time_stats: Mutex<Vec<Duration>>,
}

/// A running tracker: the long-lived capture loop plus its query surface.
#[derive(Debug)]
pub struct TrackerService {
    camera_name: String,
    properties: Properties,
    new_instance: Arc<AtomicBool>,
    shared: Arc<SharedState>,
    shutdown_tx: Mutex<Option<crossbeam::channel::Sender<()>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl TrackerService {
    /// Validate the configuration, seed the tracker from the camera's first
    /// two frames, and start the capture loop.
    ///
    /// The classifier is only consulted when the configuration names one.
    /// Camera, detector, and solver failures during seeding are fatal here;
    /// once the loop runs they merely skip the tick.
    pub fn new(
        config: TrackerConfig,
        mut camera: Box<dyn Camera>,
        mut detector: Box<dyn Detector>,
        classifier: Option<Box<dyn Classifier>>,
    ) -> Result<Self> {
        config.validate()?;
        let mut classifier = if config.pizza_classifier_name.is_some() {
            classifier
        } else {
            None
        };

        let limit = config.min_track_persistence;
        let mut engine = TrackerEngine::new(limit, config.buffer_size, classifier.is_some());
        let mut trigger =
            NewInstanceTrigger::new(Duration::from_secs_f64(config.trigger_cool_down_s));
        let new_instance = trigger.flag();
        let shared = Arc::new(SharedState {
            cancelled: AtomicBool::new(false),
            current_detections: RwLock::new(Vec::new()),
            current_image: RwLock::new(None),
            all_fresh_objects: RwLock::new(Vec::new()),
            time_stats: Mutex::new(Vec::new()),
        });

        // First pass over two frames to seed the matching state.
        let (_, first_tracks) = match classifier.as_mut() {
            Some(c) => Self::observe(
                &config,
                camera.as_mut(),
                detector.as_mut(),
                Some(c.as_mut()),
                limit,
            ),
            None => Self::observe(&config, camera.as_mut(), detector.as_mut(), None, limit),
        }?;
        engine.seed(first_tracks);
        let (frame, tentative) = match classifier.as_mut() {
            Some(c) => Self::observe(
                &config,
                camera.as_mut(),
                detector.as_mut(),
                Some(c.as_mut()),
                limit,
            ),
            None => Self::observe(&config, camera.as_mut(), detector.as_mut(), None, limit),
        }?;
        let out = engine.tick(tentative)?;
        publish_tick(&shared, &mut trigger, &out, Some(frame));

        let (shutdown_tx, shutdown_rx) = bounded::<()>(0);
        let capture_loop = CaptureLoop {
            engine,
            camera,
            detector,
            classifier,
            trigger,
            shared: Arc::clone(&shared),
            chosen_labels: config.chosen_labels.clone(),
            min_confidence: config.min_confidence,
            period: Duration::from_secs_f64(1.0 / config.max_frequency_hz),
        };
        let worker = thread::spawn(move || capture_loop.run(shutdown_rx));

        Ok(Self {
            camera_name: config.camera_name,
            properties: Properties {
                detections_supported: true,
                classifications_supported: true,
                object_point_clouds_supported: false,
            },
            new_instance,
            shared,
            shutdown_tx: Mutex::new(Some(shutdown_tx)),
            worker: Mutex::new(Some(worker)),
        })
    }

    /// One camera/detector/filter/classify pass, used for seeding.
    fn observe(
        config: &TrackerConfig,
        camera: &mut dyn Camera,
        detector: &mut dyn Detector,
        classifier: Option<&mut dyn Classifier>,
        limit: u32,
    ) -> Result<(RgbImage, Vec<Track>)> {
        let frame = camera.next_frame().map_err(TrackerError::Camera)?;
        let raw = detector.detect(&frame).map_err(TrackerError::Detector)?;
        let filtered = filter_detections(&config.chosen_labels, raw, config.min_confidence);
        let mut tentative = Track::from_detections(filtered, limit);
        if let Some(classifier) = classifier {
            classify_tracks(&mut tentative, &frame, classifier);
        }
        Ok((frame, tentative))
    }

    fn ensure_open(&self) -> Result<()> {
        if self.shared.cancelled.load(Ordering::SeqCst) {
            return Err(TrackerError::Cancelled);
        }
        Ok(())
    }

    fn check_camera_name(&self, camera_name: &str) -> Result<()> {
        if camera_name != self.camera_name {
            return Err(TrackerError::camera_mismatch(
                camera_name,
                &self.camera_name,
            ));
        }
        Ok(())
    }

    fn stable_snapshot(&self) -> Vec<RawDetection> {
        let tracks = self.shared.current_detections.read().unwrap();
        stable_detections(&tracks)
    }

    fn classification_signal(&self) -> Vec<Classification> {
        if self.new_instance.load(Ordering::SeqCst) {
            vec![Classification::new(NEW_OBJECT_DETECTED_LABEL, 1.0)]
        } else {
            Vec::new()
        }
    }

    /// Current stable detections, after checking the camera name.
    pub fn detections_from_camera(&self, camera_name: &str) -> Result<Vec<RawDetection>> {
        self.check_camera_name(camera_name)?;
        self.ensure_open()?;
        Ok(self.stable_snapshot())
    }

    /// Current stable detections. The image argument is ignored; the
    /// tracker answers from its own capture loop.
    pub fn detections(&self, _image: &RgbImage) -> Result<Vec<RawDetection>> {
        self.ensure_open()?;
        Ok(self.stable_snapshot())
    }

    /// The new-object signal, after checking the camera name.
    pub fn classifications_from_camera(
        &self,
        camera_name: &str,
        _count: usize,
    ) -> Result<Vec<Classification>> {
        self.check_camera_name(camera_name)?;
        self.ensure_open()?;
        Ok(self.classification_signal())
    }

    /// The new-object signal, independent of any camera name.
    pub fn classifications(
        &self,
        _image: &RgbImage,
        _count: usize,
    ) -> Result<Vec<Classification>> {
        self.ensure_open()?;
        Ok(self.classification_signal())
    }

    pub fn properties(&self) -> Properties {
        self.properties
    }

    /// Point-cloud output is not supported.
    pub fn object_point_clouds(&self, _camera_name: &str) -> Result<()> {
        Err(TrackerError::Unimplemented)
    }

    /// A combined snapshot of image, detections, and the classification
    /// signal, each included per `options`. The camera name is only
    /// checked when the image is requested.
    pub fn capture_all(&self, camera_name: &str, options: CaptureOptions) -> Result<Capture> {
        self.ensure_open()?;
        let mut capture = Capture::default();
        if options.return_image {
            self.check_camera_name(camera_name)?;
            capture.image = self.shared.current_image.read().unwrap().clone();
        }
        if options.return_detections {
            capture.detections = Some(self.stable_snapshot());
        }
        if options.return_classifications {
            capture.classifications = Some(self.classification_signal());
        }
        Ok(capture)
    }

    /// Ad-hoc command surface: `benchmark` returns tick timing statistics,
    /// `logs` returns the append-only stabilized-object log.
    pub fn do_command(&self, cmd: &serde_json::Value) -> Result<serde_json::Value> {
        self.ensure_open()?;
        let mut out = serde_json::Map::new();
        if cmd.get("benchmark").is_some_and(|v| !v.is_null()) {
            let stats = self.shared.time_stats.lock().unwrap();
            out.insert(
                "benchmark".to_string(),
                serde_json::to_value(Benchmark::from_durations(&stats))?,
            );
        }
        if cmd.get("logs").is_some_and(|v| !v.is_null()) {
            let rows = self.shared.all_fresh_objects.read().unwrap();
            out.insert("logs".to_string(), serde_json::to_value(&*rows)?);
        }
        Ok(serde_json::Value::Object(out))
    }

    /// Stop the capture loop and wait for it. Idempotent; any pending
    /// cooldown timer is cancelled along the way.
    pub fn close(&self) -> Result<()> {
        self.shared.cancelled.store(true, Ordering::SeqCst);
        if let Some(tx) = self.shutdown_tx.lock().unwrap().take() {
            drop(tx);
        }
        if let Some(handle) = self.worker.lock().unwrap().take() {
            let _ = handle.join();
        }
        Ok(())
    }
}

impl Drop for TrackerService {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

/// The long-lived producer: capture, detect, filter, classify, match,
/// publish, pace.
struct CaptureLoop {
    engine: TrackerEngine,
    camera: Box<dyn Camera>,
    detector: Box<dyn Detector>,
    classifier: Option<Box<dyn Classifier>>,
    trigger: NewInstanceTrigger,
    shared: Arc<SharedState>,
    chosen_labels: HashMap<String, f64>,
    min_confidence: f64,
    period: Duration,
}

impl CaptureLoop {
    fn run(mut self, shutdown_rx: Receiver<()>) {
        log::info!("capture loop started");
        loop {
            if self.shared.cancelled.load(Ordering::SeqCst) {
                break;
            }
            let start = Instant::now();
            let frame = match self.camera.next_frame() {
                Ok(frame) => frame,
                Err(e) => {
                    log::error!("can't get image: {}", e);
                    continue;
                }
            };
            let raw = match self.detector.detect(&frame) {
                Ok(dets) => dets,
                Err(e) => {
                    log::error!("can't get detections: {}", e);
                    continue;
                }
            };
            let filtered = filter_detections(&self.chosen_labels, raw, self.min_confidence);
            let mut tentative =
                Track::from_detections(filtered, self.engine.persistence_limit());
            if let Some(classifier) = self.classifier.as_mut() {
                classify_tracks(&mut tentative, &frame, classifier.as_mut());
            }

            let out = match self.engine.tick(tentative.clone()) {
                Ok(out) => out,
                Err(e) => {
                    log::error!("{}; treating all detections as fresh", e);
                    self.engine.tick_unmatched(tentative)
                }
            };
            publish_tick(&self.shared, &mut self.trigger, &out, Some(frame));

            let took = start.elapsed();
            self.shared.time_stats.lock().unwrap().push(took);

            // Overruns start the next tick immediately; there is no catch-up.
            if let Some(wait) = self.period.checked_sub(took) {
                match shutdown_rx.recv_timeout(wait) {
                    Err(RecvTimeoutError::Timeout) => {}
                    _ => break,
                }
            }
        }
        self.trigger.shutdown();
        log::info!("capture loop stopped");
    }
}

/// Publish one tick's results: fire the trigger and extend the
/// stabilized-object log when something stabilized, then swap in the new
/// snapshot.
fn publish_tick(
    shared: &SharedState,
    trigger: &mut NewInstanceTrigger,
    out: &TickOutput,
    frame: Option<RgbImage>,
) {
    if !out.stabilized.is_empty() {
        trigger.fire();
        let mut rows = shared.all_fresh_objects.write().unwrap();
        for track in &out.stabilized {
            match TrackedObject::from_label(&track.det.label) {
                Ok(row) => rows.push(row),
                Err(e) => log::error!("{}", e),
            }
        }
    }
    *shared.current_detections.write().unwrap() = out.published.clone();
    if let Some(frame) = frame {
        *shared.current_image.write().unwrap() = Some(Arc::new(frame));
    }
}

/// Timing statistics over the completed ticks.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Benchmark {
    pub slowest_s: f64,
    pub fastest_s: f64,
    pub average_s: f64,
    pub number_of_runs: usize,
}

impl Benchmark {
    /// Summarize recorded tick durations. No completed ticks yields a
    /// zeroed report.
    pub fn from_durations(stats: &[Duration]) -> Self {
        if stats.is_empty() {
            return Self {
                slowest_s: 0.0,
                fastest_s: 0.0,
                average_s: 0.0,
                number_of_runs: 0,
            };
        }
        let mut slowest = Duration::ZERO;
        let mut fastest = Duration::MAX;
        let mut sum = Duration::ZERO;
        for &took in stats {
            slowest = slowest.max(took);
            fastest = fastest.min(took);
            sum += took;
        }
        Self {
            slowest_s: slowest.as_secs_f64(),
            fastest_s: fastest.as_secs_f64(),
            average_s: sum.as_secs_f64() / stats.len() as f64,
            number_of_runs: stats.len(),
        }
    }
}
