//! # L1-Penalized Vector Coreset
//!
//! Finds sparse nonnegative weights `w` minimizing
//! `||sum_n w_n x_n - snorm xs||^2 / 2 + reg * sum_n w_n`
//! and searches `reg` for the requested number of nonzeros through the
//! [`RegularizationPath`].

use ndarray::{Array1, ArrayView1, ArrayView2};
use std::sync::Arc;
use tracing::debug;

use super::{Coreset, VectorData};
use crate::config::OptimizerConfig;
use crate::error::Result;
use crate::optim::adam;
use crate::path::{RegularizationPath, RegularizedProblem};
use crate::utils::parallel::{row_dots_unchecked, weighted_row_sum_unchecked};

/// Penalized least squares fit of the data sum.
#[derive(Debug, Clone)]
pub struct L1Problem {
    data: Arc<VectorData>,
    config: OptimizerConfig,
    target: Array1<f64>,
}

impl L1Problem {
    pub fn new(data: Arc<VectorData>, config: OptimizerConfig) -> Self {
        let target = data.sum_target();
        L1Problem { data, config, target }
    }

    /// Gradient of the penalized objective at `w`: `x (x^T w - target) + reg`.
    pub fn gradient(&self, w: ArrayView1<f64>, reg: f64) -> Array1<f64> {
        let x = self.data.rows();
        let residual = weighted_row_sum_unchecked(x, w) - &self.target;
        row_dots_unchecked(x, residual.view()) + reg
    }
}

impl RegularizedProblem for L1Problem {
    fn len(&self) -> usize {
        self.data.len()
    }

    fn full_weights(&self) -> Array1<f64> {
        self.data.norms().to_owned()
    }

    fn max_reg_coeff(&mut self) -> Result<f64> {
        // At w = 0 the gradient is reg - x target, so zero stays optimal once reg
        // covers the largest correlation.
        let correlations = self.data.project(self.target.view())?;
        Ok(correlations.fold(0.0_f64, |acc, &c| acc.max(c)))
    }

    fn proximal_optimize(&mut self, start: ArrayView1<f64>, reg: f64) -> Result<Array1<f64>> {
        adam(start, |w| self.gradient(w, reg), &self.config)
    }

    fn refine(&mut self, weights: ArrayView1<f64>) -> Result<Array1<f64>> {
        self.data.refine(weights, &self.config)
    }
}

/// Sparse vector coreset built by cardinality search over an L1 penalty.
///
/// The regularization path (and its cache) is created on the first `build` after
/// construction or `reset`, and reused by every later `build` in between.
#[derive(Debug)]
pub struct VectorL1Coreset {
    data: Arc<VectorData>,
    config: OptimizerConfig,
    path: Option<RegularizationPath<L1Problem>>,
}

impl VectorL1Coreset {
    /// Prepares a coreset of the rows of `data`.
    ///
    /// # Arguments
    /// * `data`: One item per row. Must be finite.
    /// * `config`: Oracle and refinement settings. Validated here.
    pub fn new(data: ArrayView2<f64>, config: OptimizerConfig) -> Result<Self> {
        config.validate()?;
        let data = Arc::new(VectorData::new(data)?);
        Ok(VectorL1Coreset { data, config, path: None })
    }

    pub fn data(&self) -> &VectorData {
        &self.data
    }

    /// The active regularization path, if a build has happened since the last reset.
    pub fn path(&self) -> Option<&RegularizationPath<L1Problem>> {
        self.path.as_ref()
    }

    /// Weights in the normalized space of [`VectorData`].
    pub fn normalized_weights(&self) -> Array1<f64> {
        match &self.path {
            Some(path) => path.weights().to_owned(),
            None => Array1::zeros(self.data.len()),
        }
    }

    /// Error after optimally rescaling the weighted sum.
    pub fn scaled_error(&self) -> f64 {
        self.data
            .residual_error(self.normalized_weights().view(), true)
            .unwrap_or(f64::NAN)
    }

    fn path_mut(&mut self) -> Result<&mut RegularizationPath<L1Problem>> {
        let path = match self.path.take() {
            Some(path) => path,
            None => {
                let problem = L1Problem::new(Arc::clone(&self.data), self.config.clone());
                RegularizationPath::new(problem)?
            }
        };
        Ok(self.path.insert(path))
    }
}

impl Coreset for VectorL1Coreset {
    fn reset(&mut self) {
        debug!("discarding regularization path");
        self.path = None;
    }

    fn build(&mut self, size: usize) -> Result<usize> {
        let path = self.path_mut()?;
        let achieved = path.solve_for_cardinality(size)?;
        debug!(requested = size, achieved, oracle_calls = path.oracle_calls(), "built L1 coreset");
        Ok(achieved)
    }

    fn weights(&self) -> Array1<f64> {
        let w = self.normalized_weights();
        // Installed weights always have the data's length.
        self.data.full_weights(w.view(), 1.0).unwrap_or_else(|_| Array1::zeros(self.data.full_len()))
    }

    fn error(&self) -> f64 {
        self.data
            .residual_error(self.normalized_weights().view(), false)
            .unwrap_or(f64::NAN)
    }

    fn size(&self) -> usize {
        self.path.as_ref().map_or(0, |p| p.cardinality())
    }

    fn len(&self) -> usize {
        self.data.full_len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array2};

    fn orthogonal_data() -> Array2<f64> {
        // Target sum is (3, 2, 1); each row owns one coordinate.
        array![[3.0, 0.0, 0.0], [0.0, 2.0, 0.0], [0.0, 0.0, 1.0]]
    }

    #[test]
    fn max_reg_coeff_is_largest_correlation() {
        let data = Arc::new(VectorData::new(orthogonal_data().view()).unwrap());
        let mut problem = L1Problem::new(data, OptimizerConfig::default());
        let lambda_max = problem.max_reg_coeff().unwrap();
        assert!((lambda_max - 3.0).abs() < 1e-12);
    }

    #[test]
    fn gradient_is_zero_at_full_weights_without_penalty() {
        let data = Arc::new(VectorData::new(orthogonal_data().view()).unwrap());
        let problem = L1Problem::new(data, OptimizerConfig::default());
        let g = problem.gradient(problem.full_weights().view(), 0.0);
        assert!(g.iter().all(|v| v.abs() < 1e-12));
        let g = problem.gradient(problem.full_weights().view(), 0.5);
        assert!(g.iter().all(|v| (v - 0.5).abs() < 1e-12));
    }

    #[test]
    fn soft_thresholds_orthogonal_rows() {
        // With orthonormal rows the penalized optimum is max(0, c_n - reg).
        let data = Arc::new(VectorData::new(orthogonal_data().view()).unwrap());
        let mut problem = L1Problem::new(
            data,
            OptimizerConfig { opt_itrs: 4000, ..OptimizerConfig::default() },
        );
        let w = problem.proximal_optimize(array![3.0, 2.0, 1.0].view(), 1.5).unwrap();
        assert!((w[0] - 1.5).abs() < 1e-2);
        assert!((w[1] - 0.5).abs() < 1e-2);
        assert_eq!(w[2], 0.0);
    }

    #[test]
    fn sentinel_builds_need_no_penalized_solve() {
        let mut coreset = VectorL1Coreset::new(orthogonal_data().view(), OptimizerConfig::default()).unwrap();
        assert_eq!(coreset.build(0).unwrap(), 0);
        assert_eq!(coreset.weights(), Array1::<f64>::zeros(3));
        assert_eq!(coreset.build(3).unwrap(), 3);
        assert!(coreset.error() < 1e-6);
        let full = coreset.weights();
        assert!(full.iter().all(|&w| (w - 1.0).abs() < 1e-6));
        assert_eq!(coreset.path().unwrap().oracle_calls(), 0);
    }

    #[test]
    fn builds_each_size_on_orthogonal_rows() {
        let mut coreset = VectorL1Coreset::new(
            orthogonal_data().view(),
            OptimizerConfig { opt_itrs: 2000, ..OptimizerConfig::default() },
        )
        .unwrap();
        assert_eq!(coreset.build(1).unwrap(), 1);
        assert_eq!(coreset.size(), 1);
        // The largest row is the first to enter the path.
        assert!(coreset.weights()[0] > 0.0);
        assert_eq!(coreset.build(2).unwrap(), 2);
        assert_eq!(coreset.weights()[2], 0.0);
        let err_two = coreset.error();
        assert!((err_two - 1.0).abs() < 1e-6, "error {err_two}");
    }

    #[test]
    fn reset_discards_the_path() {
        let mut coreset = VectorL1Coreset::new(orthogonal_data().view(), OptimizerConfig::default()).unwrap();
        coreset.build(3).unwrap();
        coreset.reset();
        assert!(coreset.path().is_none());
        assert_eq!(coreset.size(), 0);
        assert_eq!(coreset.len(), 3);
    }

    #[test]
    fn invalid_config_is_rejected_at_construction() {
        let config = OptimizerConfig { adam_eps: -1.0, ..OptimizerConfig::default() };
        assert!(VectorL1Coreset::new(orthogonal_data().view(), config).is_err());
    }
}
