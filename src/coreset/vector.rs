//! # Vector Data
//!
//! Data model shared by the vector coreset strategies. The target is the sum of all
//! rows of a dataset; coreset weights live in a normalized space where every row has
//! unit norm.

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use tracing::warn;

use crate::config::OptimizerConfig;
use crate::error::{CoresetError, Result};
use crate::optim::nnls_from;
use crate::utils::parallel::{row_dots_unchecked, weighted_row_sum_unchecked};
use crate::TOL;

/// Normalized view of a dataset whose rows are to be summed.
///
/// Rows with norm below [`TOL`] cannot carry a nonzero weight and are dropped; their positions are
/// remembered so weights can be mapped back onto the original rows. With `norms` as
/// weights the normalized rows sum exactly to the target.
#[derive(Debug, Clone)]
pub struct VectorData {
    full_n: usize,
    /// Original row index of every kept row.
    kept: Vec<usize>,
    x: Array2<f64>,
    norms: Array1<f64>,
    xs: Array1<f64>,
    snorm: f64,
}

impl VectorData {
    /// Normalizes `data` (one item per row).
    ///
    /// Data without any row of norm at least [`TOL`] is accepted with a warning;
    /// coresets built on it stay empty.
    pub fn new(data: ArrayView2<f64>) -> Result<Self> {
        if let Some(((i, j), v)) = data.indexed_iter().find(|(_, v)| !v.is_finite()) {
            return Err(CoresetError::InvalidInput(format!(
                "data must be finite, entry ({i}, {j}) is {v}"
            )));
        }

        let full_n = data.nrows();
        let all_norms = data.map_axis(Axis(1), |row| row.dot(&row).sqrt());
        let kept: Vec<usize> = (0..full_n).filter(|&i| all_norms[i] >= TOL).collect();
        let negligible = (0..full_n).filter(|&i| all_norms[i] > 0.0 && all_norms[i] < TOL).count();
        if negligible > 0 {
            warn!(rows = negligible, "dropping nonzero rows with negligible norm");
        }
        let norms = all_norms.select(Axis(0), &kept);
        let mut x = if kept.is_empty() {
            Array2::zeros((0, data.ncols()))
        } else {
            data.select(Axis(0), &kept)
        };
        for (mut row, &nrm) in x.rows_mut().into_iter().zip(norms.iter()) {
            row /= nrm;
        }

        let mut xs = weighted_row_sum_unchecked(x.view(), norms.view());
        let snorm = xs.dot(&xs).sqrt();
        // A zero sum is left alone; strategies then keep all weights at zero.
        if snorm > 0.0 {
            xs /= snorm;
        }
        if kept.is_empty() {
            warn!(rows = full_n, "data has no nonzero vectors; coresets will stay empty");
        }

        Ok(VectorData { full_n, kept, x, norms, xs, snorm })
    }

    /// Number of kept (nonzero) rows, the length of normalized weight vectors.
    pub fn len(&self) -> usize {
        self.x.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.x.nrows() == 0
    }

    /// Number of rows in the original data.
    pub fn full_len(&self) -> usize {
        self.full_n
    }

    /// Original indices of the kept rows, in order.
    pub fn kept_rows(&self) -> &[usize] {
        &self.kept
    }

    /// Dimension of every row.
    pub fn dim(&self) -> usize {
        self.x.ncols()
    }

    /// Unit-norm rows.
    pub fn rows(&self) -> ArrayView2<'_, f64> {
        self.x.view()
    }

    /// Norms of the kept rows; also the full-data weighting.
    pub fn norms(&self) -> ArrayView1<'_, f64> {
        self.norms.view()
    }

    /// Unit direction of the target sum.
    pub fn sum_direction(&self) -> ArrayView1<'_, f64> {
        self.xs.view()
    }

    /// Norm of the target sum.
    pub fn sum_norm(&self) -> f64 {
        self.snorm
    }

    /// The target sum `snorm * xs`.
    pub fn sum_target(&self) -> Array1<f64> {
        &self.xs * self.snorm
    }

    /// `sum_n w_n x_n` over the normalized rows.
    pub fn combine(&self, weights: ArrayView1<f64>) -> Result<Array1<f64>> {
        self.check_len(weights)?;
        Ok(weighted_row_sum_unchecked(self.x.view(), weights))
    }

    /// `x v` for every normalized row.
    pub fn project(&self, v: ArrayView1<f64>) -> Result<Array1<f64>> {
        if v.len() != self.dim() {
            return Err(CoresetError::DimensionMismatch { expected: self.dim(), got: v.len() });
        }
        Ok(row_dots_unchecked(self.x.view(), v))
    }

    /// Scale `a >= 0` minimizing `||a y - snorm xs||`. Zero when `y` is zero.
    pub fn optimal_scaling(&self, y: ArrayView1<f64>) -> f64 {
        let yn = y.dot(&y).sqrt();
        if yn > 0.0 {
            if yn < 1e-9 {
                warn!(norm = yn, "norm of y is small; optimal scaling might be unstable");
            }
            return self.snorm / yn * (y.dot(&self.xs) / yn).max(0.0);
        }
        0.0
    }

    /// `||sum_n w_n x_n - snorm xs||`, optionally after optimally rescaling the sum.
    pub fn residual_error(&self, weights: ArrayView1<f64>, optimal_scaling: bool) -> Result<f64> {
        let mut yw = self.combine(weights)?;
        if optimal_scaling {
            let scale = self.optimal_scaling(yw.view());
            yw *= scale;
        }
        let diff = yw - self.sum_target();
        Ok(diff.dot(&diff).sqrt())
    }

    /// Maps normalized-space weights back onto the original rows, multiplied by `scale`.
    /// Dropped rows get weight zero.
    pub fn full_weights(&self, weights: ArrayView1<f64>, scale: f64) -> Result<Array1<f64>> {
        self.check_len(weights)?;
        let mut full = Array1::zeros(self.full_n);
        for ((&idx, &w), &nrm) in self.kept.iter().zip(weights.iter()).zip(self.norms.iter()) {
            full[idx] = w / nrm * scale;
        }
        Ok(full)
    }

    /// Least squares fit of the target restricted to the support of `weights`,
    /// with nonnegative weights and no penalty.
    ///
    /// Started from `weights`, so the residual never ends above that of `weights`.
    pub fn refine(&self, weights: ArrayView1<f64>, config: &OptimizerConfig) -> Result<Array1<f64>> {
        self.check_len(weights)?;
        let active: Vec<usize> = (0..weights.len()).filter(|&i| weights[i] > 0.0).collect();
        let mut refined = Array1::zeros(weights.len());
        if active.is_empty() {
            return Ok(refined);
        }

        let x_active = self.x.select(Axis(0), &active);
        let target = self.sum_target();
        let start = weights.select(Axis(0), &active);
        let solution = nnls_from(
            x_active.view(),
            target.view(),
            start.view(),
            config.nnls_budget(self.dim()),
            config.nnls_tol,
        )?;
        for (&i, &w) in active.iter().zip(solution.iter()) {
            refined[i] = w;
        }
        Ok(refined)
    }

    fn check_len(&self, weights: ArrayView1<f64>) -> Result<()> {
        if weights.len() != self.len() {
            return Err(CoresetError::DimensionMismatch { expected: self.len(), got: weights.len() });
        }
        Ok(())
    }
}
