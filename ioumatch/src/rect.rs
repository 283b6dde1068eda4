//! Integer rectangle operations, IoU calculations, and motion prediction

use ndarray::Array2;
use rayon::prelude::*;
use std::fmt;

/// Axis-aligned rectangle in integer pixel coordinates.
///
/// A rectangle is non-empty when `x0 < x1` and `y0 < y1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rect {
    pub x0: i32,
    pub y0: i32,
    pub x1: i32,
    pub y1: i32,
}

impl Rect {
    pub fn new(x0: i32, y0: i32, x1: i32, y1: i32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    pub fn width(&self) -> i32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> i32 {
        self.y1 - self.y0
    }

    pub fn area(&self) -> i64 {
        self.width() as i64 * self.height() as i64
    }

    pub fn is_empty(&self) -> bool {
        self.x0 >= self.x1 || self.y0 >= self.y1
    }

    /// Center point in integer pixel coordinates, truncating toward zero.
    pub fn center(&self) -> (i32, i32) {
        ((self.x0 + self.x1) / 2, (self.y0 + self.y1) / 2)
    }

    /// The largest rectangle contained in both `self` and `other`.
    /// Empty (possibly degenerate) when the two do not overlap.
    pub fn intersect(&self, other: &Rect) -> Rect {
        Rect {
            x0: self.x0.max(other.x0),
            y0: self.y0.max(other.y0),
            x1: self.x1.min(other.x1),
            y1: self.y1.min(other.y1),
        }
    }
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Rect({}, {}, {}, {})", self.x0, self.y0, self.x1, self.y1)
    }
}

/// Intersection over union of two rectangles.
///
/// Returns 0 when the intersection is empty; otherwise the intersection area
/// divided by the union area, both computed in integer pixel arithmetic.
pub fn iou(a: &Rect, b: &Rect) -> f64 {
    let inter = a.intersect(b);
    if inter.is_empty() {
        return 0.0;
    }
    let union = a.area() + b.area() - inter.area();
    inter.area() as f64 / union as f64
}

/// Predict the rectangle on frame n+1 from its positions on frames n-1 and n.
///
/// The center moves by one step of the observed per-frame velocity; the
/// predicted rectangle keeps the width and height of `curr`. Center and
/// half-extent math truncates like the integer pipeline that feeds it.
pub fn predict_next(prev: &Rect, curr: &Rect) -> Rect {
    let (old_cx, old_cy) = prev.center();
    let (curr_cx, curr_cy) = curr.center();
    let new_cx = (curr_cx + (curr_cx - old_cx)) as f64;
    let new_cy = (curr_cy + (curr_cy - old_cy)) as f64;

    let half_w = (curr.width() / 2) as f64;
    let half_h = (curr.height() / 2) as f64;

    Rect::new(
        (new_cx - half_w) as i32,
        (new_cy - half_h) as i32,
        (new_cx + half_w) as i32,
        (new_cy + half_h) as i32,
    )
}

/// Compute the IoU of every (reference, candidate) pair.
/// Returns a `(refs.len(), candidates.len())` matrix.
pub fn iou_matrix(refs: &[Rect], candidates: &[Rect]) -> Array2<f64> {
    let h = refs.len();
    let w = candidates.len();
    if h == 0 || w == 0 {
        return Array2::zeros((h, w));
    }

    let data: Vec<f64> = refs
        .par_iter()
        .flat_map_iter(|r| candidates.iter().map(move |c| iou(r, c)))
        .collect();

    Array2::from_shape_vec((h, w), data).expect("row-major IoU data matches matrix shape")
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn rect_properties() {
        let r = Rect::new(0, 0, 10, 5);
        assert_eq!(r.width(), 10);
        assert_eq!(r.height(), 5);
        assert_eq!(r.area(), 50);
        assert_eq!(r.center(), (5, 2));
        assert!(!r.is_empty());
    }

    #[test]
    fn iou_identity_is_one() {
        let r = Rect::new(3, 4, 20, 30);
        assert_abs_diff_eq!(iou(&r, &r), 1.0);
    }

    #[test]
    fn iou_disjoint_is_zero() {
        let a = Rect::new(0, 0, 10, 10);
        let b = Rect::new(20, 20, 30, 30);
        assert_eq!(iou(&a, &b), 0.0);
        // Rectangles sharing only an edge do not overlap either.
        let c = Rect::new(10, 0, 20, 10);
        assert_eq!(iou(&a, &c), 0.0);
    }

    #[test]
    fn iou_is_symmetric_and_bounded() {
        let a = Rect::new(0, 0, 10, 10);
        let b = Rect::new(5, 5, 15, 15);
        let ab = iou(&a, &b);
        let ba = iou(&b, &a);
        assert_abs_diff_eq!(ab, ba);
        assert!(ab > 0.0 && ab < 1.0);
        assert_abs_diff_eq!(ab, 25.0 / 175.0, epsilon = 1e-9);
    }

    #[test]
    fn predict_continues_linear_motion() {
        // Moving +5 in x per frame, constant size.
        let prev = Rect::new(0, 0, 10, 10);
        let curr = Rect::new(5, 0, 15, 10);
        let pred = predict_next(&prev, &curr);
        assert_eq!(pred, Rect::new(10, 0, 20, 10));
    }

    #[test]
    fn predict_stationary_box_stays_put() {
        let r = Rect::new(2, 2, 12, 12);
        assert_eq!(predict_next(&r, &r), r);
    }

    #[test]
    fn iou_matrix_shape_and_values() {
        let refs = vec![Rect::new(0, 0, 10, 10), Rect::new(100, 100, 110, 110)];
        let cands = vec![Rect::new(0, 0, 10, 10)];
        let m = iou_matrix(&refs, &cands);
        assert_eq!(m.dim(), (2, 1));
        assert_abs_diff_eq!(m[[0, 0]], 1.0);
        assert_eq!(m[[1, 0]], 0.0);

        let empty = iou_matrix(&[], &cands);
        assert_eq!(empty.dim(), (0, 1));
    }
}
