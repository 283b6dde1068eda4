//! Hungarian assignment over a rectangular cost matrix
//!
//! Wraps the Kuhn-Munkres implementation from the `pathfinding` crate behind
//! the row-oriented contract trackers want: for every row, the index of the
//! matched column or `-1`.

use anyhow::{ensure, Result};
use ndarray::ArrayView2;
use pathfinding::matrix::Matrix;
use pathfinding::prelude::kuhn_munkres_min;

/// Resolution used when quantizing float costs for the integer solver.
const COST_SCALE: f64 = 1_000_000.0;

/// Minimum-cost assignment solver for tracker cost matrices.
///
/// Costs are expected to be non-positive (negated overlap scores). A
/// rectangular matrix is padded to square with zero-cost dummy cells; rows
/// assigned to a dummy column come back as `-1`. Since a real zero cell means
/// "no overlap", callers reject zero-cost assignments, which also absorbs any
/// dummy column the solver picks.
pub struct HungarianSolver;

impl HungarianSolver {
    /// Solve the assignment problem for a `(rows, cols)` cost matrix.
    ///
    /// Returns one entry per row: the matched column index, or `-1` when the
    /// row was left unmatched. No column is used twice. Fails when the matrix
    /// contains a non-finite cost.
    pub fn solve(costs: ArrayView2<f64>) -> Result<Vec<isize>> {
        let (rows, cols) = costs.dim();
        if rows == 0 {
            return Ok(Vec::new());
        }
        if cols == 0 {
            return Ok(vec![-1; rows]);
        }
        ensure!(
            costs.iter().all(|c| c.is_finite()),
            "cost matrix contains a non-finite value"
        );

        // Pad to square so every row gets an assignment; dummy cells cost 0.
        let size = rows.max(cols);
        let mut weights = Matrix::new(size, size, 0i64);
        for i in 0..rows {
            for j in 0..cols {
                weights[(i, j)] = (costs[[i, j]] * COST_SCALE).round() as i64;
            }
        }

        let (_total, assignment) = kuhn_munkres_min(&weights);

        Ok((0..rows)
            .map(|i| {
                let j = assignment[i];
                if j < cols {
                    j as isize
                } else {
                    -1
                }
            })
            .collect())
    }
}
