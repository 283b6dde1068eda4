//! Pure Rust IoU-based matching primitives
//!
//! This crate provides the geometry and assignment layer used by frame-to-frame
//! object trackers: integer pixel rectangles with intersection-over-union,
//! a constant-velocity one-step motion prediction, and a Hungarian solver
//! over a rectangular cost matrix.
//!
//! ```rust
//! use ioumatch::{iou, HungarianSolver, Rect};
//! use ndarray::array;
//!
//! let a = Rect::new(0, 0, 10, 10);
//! let b = Rect::new(5, 5, 15, 15);
//! assert!(iou(&a, &b) > 0.0);
//!
//! // One previous track (row), two candidate detections (columns).
//! let costs = array![[-0.8, 0.0]];
//! let matches = HungarianSolver::solve(costs.view()).unwrap();
//! assert_eq!(matches, vec![0]);
//! ```

pub mod hungarian;
pub mod rect;

pub use hungarian::HungarianSolver;
pub use rect::{iou, iou_matrix, predict_next, Rect};
