//! # Regularization Path (`path`)
//!
//! Finds the penalty strength that makes a penalized weight optimization return
//! exactly `M` nonzero weights, caching every solve so that repeated queries for
//! different `M` reuse earlier work.
//!
//! The engine only assumes that the number of nonzeros is non-increasing in the
//! penalty strength. The problem-specific parts (objective, gradient, refinement)
//! come from a [`RegularizedProblem`] implementation supplied by the owning coreset.

use ndarray::{Array1, ArrayView1};

use crate::error::Result;
use crate::TOL;

// --- Submodules ---
pub mod bisection;
pub mod cache;

pub use bisection::RegularizationPath;
pub use cache::{Bracket, PathCache, PathEntry, RegBounds};

// --- Problem Trait ---

/// Problem-specific collaborator driven by [`RegularizationPath`].
pub trait RegularizedProblem {
    /// Number of items `N`, i.e. the length of every weight vector.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The unregularized weighting with every item active (cardinality `N`).
    fn full_weights(&self) -> Array1<f64>;

    /// Smallest penalty strength for which the all-zero vector is optimal.
    ///
    /// Called exactly once, when the path is created and nothing has been solved yet.
    fn max_reg_coeff(&mut self) -> Result<f64>;

    /// Solves the penalized problem at strength `reg`, warm-started from `start`.
    fn proximal_optimize(&mut self, start: ArrayView1<f64>, reg: f64) -> Result<Array1<f64>>;

    /// Re-solves without penalty, restricted to the support of `weights`.
    ///
    /// May zero out items of the support but must not activate items outside it.
    fn refine(&mut self, weights: ArrayView1<f64>) -> Result<Array1<f64>>;
}

/// Snaps every entry below [`TOL`] to exactly zero and returns the number of
/// remaining nonzeros.
pub fn snap_to_zero(weights: &mut Array1<f64>) -> usize {
    let mut nnz = 0;
    for w in weights.iter_mut() {
        if *w < TOL {
            *w = 0.0;
        } else {
            nnz += 1;
        }
    }
    nnz
}

/// Number of entries at or above [`TOL`].
pub fn cardinality(weights: ArrayView1<f64>) -> usize {
    weights.iter().filter(|&&w| w >= TOL).count()
}
