//! # Nonnegative Least Squares
//!
//! Cyclic projected coordinate descent on the Gram matrix. Used to refine a coreset
//! on a fixed support once the penalty is no longer needed.

use ndarray::{Array1, ArrayView1, ArrayView2};

use crate::error::{CoresetError, Result};

/// Solves `min ||a^T w - b||^2 / 2` subject to `w >= 0`.
///
/// `a` holds one item per row (`k x d`), `b` has length `d`, the result has length `k`.
/// Each sweep minimizes exactly along every coordinate in turn and clamps at zero.
/// Iteration stops after `max_iter` sweeps or once the largest coordinate change of a
/// sweep is at most `tol * (1 + max_i w_i)`.
pub fn nnls(a: ArrayView2<f64>, b: ArrayView1<f64>, max_iter: usize, tol: f64) -> Result<Array1<f64>> {
    nnls_from(a, b, Array1::zeros(a.nrows()).view(), max_iter, tol)
}

/// [`nnls`] started from `w0` (clamped at zero).
///
/// Every coordinate step is an exact line minimization, so the objective at the
/// result is never above the objective at the clamped start.
pub fn nnls_from(
    a: ArrayView2<f64>,
    b: ArrayView1<f64>,
    w0: ArrayView1<f64>,
    max_iter: usize,
    tol: f64,
) -> Result<Array1<f64>> {
    let (k, d) = a.dim();
    if b.len() != d {
        return Err(CoresetError::DimensionMismatch { expected: d, got: b.len() });
    }
    if w0.len() != k {
        return Err(CoresetError::DimensionMismatch { expected: k, got: w0.len() });
    }

    let gram = a.dot(&a.t());
    let c = a.dot(&b);
    let mut w = w0.mapv(|v| v.max(0.0));
    // g = gram * w, kept current as coordinates move
    let mut g = gram.dot(&w);

    for sweep in 0..max_iter {
        let mut max_delta = 0.0_f64;
        for i in 0..k {
            let gii = gram[[i, i]];
            if gii <= 0.0 {
                continue;
            }
            let updated = (w[i] - (g[i] - c[i]) / gii).max(0.0);
            let delta = updated - w[i];
            if delta != 0.0 {
                w[i] = updated;
                g.scaled_add(delta, &gram.column(i));
                max_delta = max_delta.max(delta.abs());
            }
        }
        let scale = 1.0 + w.fold(0.0_f64, |acc, &v| acc.max(v));
        if max_delta <= tol * scale {
            tracing::trace!(sweeps = sweep + 1, "nnls converged");
            break;
        }
    }

    if w.iter().any(|v| !v.is_finite()) {
        return Err(CoresetError::NumericalFailure("nnls produced non-finite weights".into()));
    }
    Ok(w)
}
