//! # Coreset Construction (`coreset`)
//!
//! Owners of a construction session. Each strategy keeps its own weights over the
//! dataset and grows or re-solves them on `build`.

use ndarray::Array1;

use crate::error::Result;

// --- Submodules ---
pub mod l1;
pub mod sampling;
pub mod vector;

// Re-export strategies
pub use l1::VectorL1Coreset;
pub use sampling::{SamplingCoreset, SamplingScheme};
pub use vector::VectorData;

// --- Coreset Trait ---

/// Common lifecycle of a coreset construction strategy.
pub trait Coreset {
    /// Discards all construction state, including cached solves.
    fn reset(&mut self);

    /// Builds a coreset with (up to) `size` nonzero weights and returns the size
    /// actually achieved.
    fn build(&mut self, size: usize) -> Result<usize>;

    /// Weights on the original, unnormalized rows of the dataset.
    fn weights(&self) -> Array1<f64>;

    /// Approximation error of the current coreset.
    fn error(&self) -> f64;

    /// Current number of nonzero weights.
    fn size(&self) -> usize;

    /// Number of rows in the original dataset.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
