//! # Parallelism Utilities (CPU Threading)
//!
//! Row-parallel products over a dataset matrix using `rayon`. Each item of the
//! dataset is one row; large matrices are scattered into row chunks, processed on
//! the rayon pool and gathered back. Small matrices take the serial path.

use ndarray::{s, Array1, ArrayView1, ArrayView2, Zip};
use rayon::prelude::*;

use crate::error::{CoresetError, Result};

/// Matrices with fewer entries than this are processed on the calling thread.
pub const PARALLEL_THRESHOLD: usize = 1 << 15;

// Rows per scattered chunk in `weighted_row_sum`.
const CHUNK_ROWS: usize = 256;

/// `x v`: the dot product of every row of `x` with `v`.
pub fn row_dots(x: ArrayView2<f64>, v: ArrayView1<f64>) -> Result<Array1<f64>> {
    if x.ncols() != v.len() {
        return Err(CoresetError::DimensionMismatch { expected: x.ncols(), got: v.len() });
    }
    Ok(row_dots_unchecked(x, v))
}

/// `row_dots` for callers that have already matched the dimensions.
pub(crate) fn row_dots_unchecked(x: ArrayView2<f64>, v: ArrayView1<f64>) -> Array1<f64> {
    if x.len() < PARALLEL_THRESHOLD {
        return x.dot(&v);
    }

    let mut out = Array1::zeros(x.nrows());
    Zip::from(&mut out)
        .and(x.rows())
        .par_for_each(|o, row| *o = row.dot(&v));
    out
}

/// `x^T w`: the sum of the rows of `x` weighted by `w`.
pub fn weighted_row_sum(x: ArrayView2<f64>, w: ArrayView1<f64>) -> Result<Array1<f64>> {
    if x.nrows() != w.len() {
        return Err(CoresetError::DimensionMismatch { expected: x.nrows(), got: w.len() });
    }
    Ok(weighted_row_sum_unchecked(x, w))
}

/// `weighted_row_sum` for callers that have already matched the dimensions.
pub(crate) fn weighted_row_sum_unchecked(x: ArrayView2<f64>, w: ArrayView1<f64>) -> Array1<f64> {
    if x.len() < PARALLEL_THRESHOLD {
        return x.t().dot(&w);
    }

    // Scatter row chunks, reduce partial sums.
    let n = x.nrows();
    let d = x.ncols();
    let n_chunks = n.div_ceil(CHUNK_ROWS);
    (0..n_chunks)
        .into_par_iter()
        .map(|c| {
            let start = c * CHUNK_ROWS;
            let end = (start + CHUNK_ROWS).min(n);
            x.slice(s![start..end, ..]).t().dot(&w.slice(s![start..end]))
        })
        .reduce(|| Array1::zeros(d), |acc, part| acc + part)
}
