//! Gaussian (RBF) kernel over sparse vectors
//!
//! `K(x, y) = exp(-gamma * ||x - y||²)`. The squared distance is computed
//! directly on the sparse form; absent indices count as zero.

use crate::core::SparseVector;
use crate::kernel::Kernel;
use std::cmp::Ordering;

/// RBF kernel with a fixed width
///
/// Larger `gamma` makes the kernel more local: similarity falls off faster
/// with distance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RBFKernel {
    gamma: f64,
}

impl RBFKernel {
    /// # Panics
    /// Panics if gamma is not positive. Validated configs never reach this.
    pub fn new(gamma: f64) -> Self {
        assert!(gamma > 0.0, "Gamma must be positive, got: {}", gamma);
        Self { gamma }
    }

    pub fn gamma(&self) -> f64 {
        self.gamma
    }
}

impl Default for RBFKernel {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl Kernel for RBFKernel {
    fn compute(&self, x: &SparseVector, y: &SparseVector) -> f64 {
        rbf(x, y, self.gamma)
    }
}

/// `exp(-gamma * ||x - y||²)` without building dense vectors
pub fn rbf(x: &SparseVector, y: &SparseVector, gamma: f64) -> f64 {
    (-gamma * squared_euclidean_distance(x, y)).exp()
}

/// `||x - y||²` by a single merge walk over both sorted index lists
pub fn squared_euclidean_distance(x: &SparseVector, y: &SparseVector) -> f64 {
    let (xi, xv) = (&x.indices, &x.values);
    let (yi, yv) = (&y.indices, &y.values);
    let (mut a, mut b) = (0, 0);
    let mut sum = 0.0;

    while a < xi.len() && b < yi.len() {
        match xi[a].cmp(&yi[b]) {
            Ordering::Equal => {
                let d = xv[a] - yv[b];
                sum += d * d;
                a += 1;
                b += 1;
            }
            Ordering::Less => {
                sum += xv[a] * xv[a];
                a += 1;
            }
            Ordering::Greater => {
                sum += yv[b] * yv[b];
                b += 1;
            }
        }
    }

    // Whatever is left in either vector is paired with implicit zeros
    sum + xv[a..].iter().map(|v| v * v).sum::<f64>() + yv[b..].iter().map(|v| v * v).sum::<f64>()
}
