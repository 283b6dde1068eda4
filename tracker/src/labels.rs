//! Label grammar for tracked identities
//!
//! Tracked detections carry labels of the form
//! `class_N[_YYYYMMDD_HHMMSS[_classification]]`. Two detections with the
//! same `class_N` prefix are the same object; that prefix is the track id
//! and never changes for the lifetime of the identity. The timestamp is the
//! local wall clock captured at birth. Only the trailing classification
//! component may be rewritten later.

use chrono::Local;
use std::collections::HashMap;

/// Current local time formatted `YYYYMMDD_HHMMSS`.
pub fn timestamp() -> String {
    Local::now().format("%Y%m%d_%H%M%S").to_string()
}

/// The `class_N` identity prefix: the first two underscore-separated
/// components of a label. A label with fewer components is returned whole.
pub fn track_id(label: &str) -> String {
    let parts: Vec<&str> = label.splitn(3, '_').collect();
    match parts.as_slice() {
        [class, index, ..] => format!("{class}_{index}"),
        _ => label.to_string(),
    }
}

/// The lowercased first underscore-separated component of a label.
pub fn base_class(label: &str) -> String {
    label.split('_').next().unwrap_or_default().to_lowercase()
}

/// Compose a fresh identity label.
pub fn format_label(class: &str, index: u32, ts: &str, classification: Option<&str>) -> String {
    match classification {
        Some(c) => format!("{class}_{index}_{ts}_{c}"),
        None => format!("{class}_{index}_{ts}"),
    }
}

/// Rewrite only the trailing classification component, leaving the identity
/// prefix and birth timestamp untouched.
pub fn with_classification(label: &str, classification: &str) -> String {
    let head: Vec<&str> = label.split('_').take(4).collect();
    format!("{}_{}", head.join("_"), classification)
}

/// Per-class instance counter behind fresh identity labels.
///
/// The first sighting of a class is instance 0; each later sighting
/// increments. Indices are monotone for the lifetime of the process.
#[derive(Debug, Default)]
pub struct ClassCounter {
    counts: HashMap<String, u32>,
}

impl ClassCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the next index for `class`.
    pub fn next_index(&mut self, class: &str) -> u32 {
        match self.counts.get(class) {
            None => {
                self.counts.insert(class.to_string(), 0);
                0
            }
            Some(&n) => {
                self.counts.insert(class.to_string(), n + 1);
                n + 1
            }
        }
    }

    /// Highest index handed out for `class`, if any.
    pub fn current(&self, class: &str) -> Option<u32> {
        self.counts.get(class).copied()
    }
}
