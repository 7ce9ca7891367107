//! # Optimization Algorithms (`optim`)
//!
//! Numerical oracles used by the regularization path: a projected Adam variant for
//! the penalized solves and a nonnegative least squares solver for refinement.

use ndarray::{Array1, ArrayView1};

use crate::error::Result;

// --- Submodules ---
pub mod adam;
pub mod nnls;

// Re-export optimizers
pub use adam::{adam, Adam};
pub use nnls::{nnls, nnls_from};

// --- Optimizer Trait ---

/// Base trait for iterative first-order optimizers over a flat weight vector.
pub trait Optimizer {
    /// Performs a single update of `x` in place given the gradient at `x`.
    ///
    /// # Returns
    /// * `Result<()>`: Ok(()) if the step was successful, Err if `grad` has the wrong length.
    fn step(&mut self, x: &mut Array1<f64>, grad: ArrayView1<f64>) -> Result<()>;

    /// Clears accumulated state so the next `step` behaves like the first.
    fn reset(&mut self);
}

/// Clamps every entry onto the nonnegative orthant. NaN entries map to 0.
pub(crate) fn project_nonnegative(x: &mut Array1<f64>) {
    x.mapv_inplace(|v| v.max(0.0));
}
