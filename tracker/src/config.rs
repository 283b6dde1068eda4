//! Tracker configuration and validation

use crate::error::{Result, TrackerError};
use serde::Deserialize;
use std::collections::HashMap;

pub const DEFAULT_MIN_CONFIDENCE: f64 = 0.2;
pub const DEFAULT_MAX_FREQUENCY_HZ: f64 = 10.0;
pub const DEFAULT_TRIGGER_COOL_DOWN_S: f64 = 5.0;
pub const DEFAULT_BUFFER_SIZE: usize = 30;
pub const DEFAULT_MIN_TRACK_PERSISTENCE: u32 = 3;

/// Configuration for a tracker instance.
///
/// `camera_name` and `detector_name` identify the collaborators the host
/// wires in; everything else tunes the engine. Once the capture loop is
/// running, the configuration is immutable for that lifetime.
#[derive(Debug, Clone, Deserialize)]
pub struct TrackerConfig {
    pub camera_name: String,
    pub detector_name: String,

    /// Per-class score thresholds. Empty means every class passes and only
    /// the global floor applies.
    #[serde(default)]
    pub chosen_labels: HashMap<String, f64>,

    /// Global score floor, inclusive.
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f64,

    /// Target tick rate of the capture loop.
    #[serde(default = "default_max_frequency_hz")]
    pub max_frequency_hz: f64,

    /// How long the new-object signal dwells after the last trigger.
    #[serde(default = "default_trigger_cool_down_s")]
    pub trigger_cool_down_s: f64,

    /// Capacity of the lost-tracks buffer, in frames.
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,

    /// Ticks of continuous matching required before a track counts as
    /// stable. Zero makes every track stable at birth.
    #[serde(default = "default_min_track_persistence")]
    pub min_track_persistence: u32,

    /// Collaborator name of the optional per-crop classifier; absent
    /// disables the classification step.
    #[serde(default)]
    pub pizza_classifier_name: Option<String>,
}

fn default_min_confidence() -> f64 {
    DEFAULT_MIN_CONFIDENCE
}

fn default_max_frequency_hz() -> f64 {
    DEFAULT_MAX_FREQUENCY_HZ
}

fn default_trigger_cool_down_s() -> f64 {
    DEFAULT_TRIGGER_COOL_DOWN_S
}

fn default_buffer_size() -> usize {
    DEFAULT_BUFFER_SIZE
}

fn default_min_track_persistence() -> u32 {
    DEFAULT_MIN_TRACK_PERSISTENCE
}

impl TrackerConfig {
    /// Minimal configuration naming just the required collaborators.
    pub fn new(camera_name: impl Into<String>, detector_name: impl Into<String>) -> Self {
        Self {
            camera_name: camera_name.into(),
            detector_name: detector_name.into(),
            chosen_labels: HashMap::new(),
            min_confidence: DEFAULT_MIN_CONFIDENCE,
            max_frequency_hz: DEFAULT_MAX_FREQUENCY_HZ,
            trigger_cool_down_s: DEFAULT_TRIGGER_COOL_DOWN_S,
            buffer_size: DEFAULT_BUFFER_SIZE,
            min_track_persistence: DEFAULT_MIN_TRACK_PERSISTENCE,
            pizza_classifier_name: None,
        }
    }

    /// Deserialize a configuration from a JSON value, applying defaults for
    /// absent fields. The result still needs `validate()`.
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        Ok(serde_json::from_value(value)?)
    }

    /// Check every field against its allowed range.
    pub fn validate(&self) -> Result<()> {
        if self.camera_name.is_empty() {
            return Err(TrackerError::config(
                "expected \"camera_name\" attribute for object tracker",
            ));
        }
        if self.detector_name.is_empty() {
            return Err(TrackerError::config(
                "expected \"detector_name\" attribute for object tracker",
            ));
        }
        if !(self.max_frequency_hz > 0.0) {
            return Err(TrackerError::config(
                "frequency(Hz) must be a positive number",
            ));
        }
        if !(0.0..=1.0).contains(&self.min_confidence) {
            return Err(TrackerError::config(
                "minimum thresholding confidence must be between 0.0 and 1.0",
            ));
        }
        if self.trigger_cool_down_s < 0.0 {
            return Err(TrackerError::config(
                "trigger_cool_down_s is a duration given in seconds and cannot be negative",
            ));
        }
        if !(1..=256).contains(&self.buffer_size) {
            return Err(TrackerError::config("buffer size must be between 1 and 256"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn minimal_config_is_valid() {
        let cfg = TrackerConfig::new("camera", "detector");
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.min_confidence, DEFAULT_MIN_CONFIDENCE);
        assert_eq!(cfg.buffer_size, DEFAULT_BUFFER_SIZE);
    }

    #[test]
    fn missing_names_are_rejected() {
        let mut cfg = TrackerConfig::new("", "detector");
        assert!(matches!(cfg.validate(), Err(TrackerError::Config(_))));
        cfg = TrackerConfig::new("camera", "");
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("detector_name"));
    }

    #[test]
    fn out_of_range_fields_are_rejected() {
        let mut cfg = TrackerConfig::new("camera", "detector");
        cfg.max_frequency_hz = -1.0;
        assert!(cfg.validate().is_err());

        let mut cfg = TrackerConfig::new("camera", "detector");
        cfg.max_frequency_hz = 0.0;
        assert!(cfg.validate().is_err());

        let mut cfg = TrackerConfig::new("camera", "detector");
        cfg.min_confidence = 1.5;
        assert!(cfg.validate().is_err());

        let mut cfg = TrackerConfig::new("camera", "detector");
        cfg.trigger_cool_down_s = -0.1;
        assert!(cfg.validate().is_err());

        let mut cfg = TrackerConfig::new("camera", "detector");
        cfg.buffer_size = 0;
        assert!(cfg.validate().is_err());
        cfg.buffer_size = 257;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn json_round_trip_with_defaults() {
        let cfg = TrackerConfig::from_value(json!({
            "camera_name": "cam0",
            "detector_name": "det0",
            "chosen_labels": {"cat": 0.5},
            "pizza_classifier_name": "slices"
        }))
        .unwrap();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.chosen_labels["cat"], 0.5);
        assert_eq!(cfg.max_frequency_hz, DEFAULT_MAX_FREQUENCY_HZ);
        assert_eq!(cfg.min_track_persistence, DEFAULT_MIN_TRACK_PERSISTENCE);
        assert_eq!(cfg.pizza_classifier_name.as_deref(), Some("slices"));
    }

    #[test]
    fn negative_persistence_fails_to_deserialize() {
        let res = TrackerConfig::from_value(json!({
            "camera_name": "cam0",
            "detector_name": "det0",
            "min_track_persistence": -1
        }));
        assert!(res.is_err());
    }
}
