//! # Regularization Bisection
//!
//! Drives penalized solves at successively refined penalty strengths until the
//! requested cardinality is hit or the search bracket collapses.

use ndarray::{Array1, ArrayView1};
use tracing::debug;

use super::cache::PathCache;
use super::{snap_to_zero, RegularizedProblem};
use crate::error::{CoresetError, Result};
use crate::TOL;

/// Cardinality search over the regularization path of one problem.
///
/// Owns the problem, the [`PathCache`] of the session and the currently installed
/// weights. Dropping the path (or calling [`RegularizationPath::into_parts`]) ends the
/// session.
#[derive(Debug)]
pub struct RegularizationPath<P: RegularizedProblem> {
    problem: P,
    cache: PathCache,
    weights: Array1<f64>,
    cardinality: usize,
    source: usize,
    oracle_calls: usize,
    last_rounds: usize,
}

impl<P: RegularizedProblem> RegularizationPath<P> {
    /// Starts a session: evaluates `max_reg_coeff` once and seeds the cache with the
    /// `0` and `N` sentinels. The installed weights start all-zero.
    ///
    /// Every entry of the problem's full weighting must be at least [`TOL`], so that
    /// the `N` sentinel really has cardinality `N`.
    pub fn new(mut problem: P) -> Result<Self> {
        let n = problem.len();
        let lambda_max = problem.max_reg_coeff()?;
        if !lambda_max.is_finite() || lambda_max < 0.0 {
            return Err(CoresetError::InvalidInput(format!(
                "max regularization coefficient must be finite and >= 0, got {lambda_max}"
            )));
        }
        let mut full = problem.full_weights();
        if full.len() != n {
            return Err(CoresetError::DimensionMismatch { expected: n, got: full.len() });
        }
        if full.iter().any(|v| !v.is_finite()) {
            return Err(CoresetError::NumericalFailure("full weighting is not finite".into()));
        }
        let active = snap_to_zero(&mut full);
        if active != n {
            return Err(CoresetError::InvalidInput(format!(
                "full weighting must have all {n} entries at or above {TOL}, found {active}"
            )));
        }
        debug!(n, lambda_max, "regularization path initialized");

        Ok(RegularizationPath {
            problem,
            cache: PathCache::new(lambda_max, full),
            weights: Array1::zeros(n),
            cardinality: 0,
            source: 0,
            oracle_calls: 0,
            last_rounds: 0,
        })
    }

    /// Searches for penalized weights with exactly `m` nonzeros, falling back to the
    /// largest reachable cardinality below `m`, then installs them refined on their
    /// support. Returns the cardinality of the installed weights, which never exceeds `m`.
    ///
    /// Requests above `N` are clamped to `N`. Cached cardinalities are installed
    /// without any penalized solve.
    pub fn solve_for_cardinality(&mut self, m: usize) -> Result<usize> {
        let n = self.cache.dim();
        let m = m.min(n);
        self.last_rounds = 0;

        if self.cache.contains(m) {
            debug!(target_nnz = m, "regularization path cache hit");
            return self.install(m);
        }

        let bracket = self.cache.bracket_for(m);
        // Smallest penalty seen to give a cardinality below m, largest seen to give one above.
        let mut reg_hi = self.bounds_of(bracket.lower)?.lo;
        let mut reg_lo = self.bounds_of(bracket.upper)?.hi;
        let mut w = self.cache.nearest_weight(m, bracket).to_owned();
        let mut nnz = None;

        while nnz != Some(m) && (reg_hi - reg_lo) / reg_hi > TOL && (reg_hi > TOL || reg_lo > 0.0) {
            let reg = (reg_hi + reg_lo) / 2.0;

            let mut next = self.problem.proximal_optimize(w.view(), reg)?;
            self.oracle_calls += 1;
            self.last_rounds += 1;
            if next.len() != n {
                return Err(CoresetError::DimensionMismatch { expected: n, got: next.len() });
            }
            if next.iter().any(|v| !v.is_finite()) {
                return Err(CoresetError::NumericalFailure(format!(
                    "penalized solve at strength {reg} returned non-finite weights"
                )));
            }

            let found = snap_to_zero(&mut next);
            self.cache.record(found, reg, next.clone())?;
            w = next;

            debug!(
                round = self.last_rounds,
                reg,
                reg_lo,
                reg_hi,
                found,
                target_nnz = m,
                "bisection round"
            );

            if found < m {
                reg_hi = reg;
            } else {
                reg_lo = reg;
            }
            nnz = Some(found);
        }

        let (achieved, _) = self.cache.lower_fallback(m);
        if achieved != m {
            debug!(target_nnz = m, achieved, rounds = self.last_rounds, "cardinality unreachable, falling back");
        }
        self.install(achieved)
    }

    /// Installs the cached weights for `m` refined on their support without penalty.
    ///
    /// Returns the cardinality of the installed weights. Refinement may drop items
    /// from the support, so this can be below `m`; a refinement that activates items
    /// outside the support is discarded in favour of the cached weights.
    fn install(&mut self, m: usize) -> Result<usize> {
        let cached = self
            .cache
            .weights(m)
            .map(|w| w.to_owned())
            .ok_or_else(|| CoresetError::InvalidInput(format!("cardinality {m} is not cached")))?;

        let mut refined = self.problem.refine(cached.view())?;
        if refined.len() != cached.len() {
            return Err(CoresetError::DimensionMismatch { expected: cached.len(), got: refined.len() });
        }
        if refined.iter().any(|v| !v.is_finite()) {
            return Err(CoresetError::NumericalFailure(format!(
                "refinement of cardinality {m} returned non-finite weights"
            )));
        }

        let achieved = snap_to_zero(&mut refined);
        if achieved > m {
            debug!(target_nnz = m, achieved, "refinement left the support; keeping cached weights");
            self.weights = cached;
            self.cardinality = m;
        } else {
            if achieved < m {
                debug!(target_nnz = m, achieved, "refinement dropped items from the support");
            }
            self.weights = refined;
            self.cardinality = achieved;
        }
        self.source = m;
        Ok(self.cardinality)
    }

    fn bounds_of(&self, m: usize) -> Result<super::RegBounds> {
        self.cache
            .bounds(m)
            .ok_or_else(|| CoresetError::InvalidInput(format!("cardinality {m} is not cached")))
    }

    /// Currently installed weights.
    pub fn weights(&self) -> ArrayView1<'_, f64> {
        self.weights.view()
    }

    /// Cardinality of the installed weights.
    pub fn cardinality(&self) -> usize {
        self.cardinality
    }

    /// Cached cardinality the installed weights were refined from.
    pub fn source_cardinality(&self) -> usize {
        self.source
    }

    pub fn cache(&self) -> &PathCache {
        &self.cache
    }

    pub fn problem(&self) -> &P {
        &self.problem
    }

    pub fn problem_mut(&mut self) -> &mut P {
        &mut self.problem
    }

    /// Total penalized solves performed in this session.
    pub fn oracle_calls(&self) -> usize {
        self.oracle_calls
    }

    /// Bisection rounds performed by the most recent query (0 on a cache hit).
    pub fn last_rounds(&self) -> usize {
        self.last_rounds
    }

    /// Ends the session, returning the problem and the installed weights.
    pub fn into_parts(self) -> (P, Array1<f64>) {
        (self.problem, self.weights)
    }
}
