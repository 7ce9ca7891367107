//! # Path Cache
//!
//! Every `(cardinality, weights, penalty bounds)` triple discovered during one
//! coreset-construction session, keyed and ordered by cardinality.
//!
//! The cache only grows: entries are added or their bounds widened, never removed.
//! It keeps one full-length weight vector per distinct cardinality, so memory is
//! `O(|cardinalities| * N)`, at most `(N + 1) * N` values.

use ndarray::{Array1, ArrayView1};
use std::collections::BTreeMap;

use crate::error::{CoresetError, Result};

/// Range of penalty strengths observed to produce one cardinality.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegBounds {
    pub lo: f64,
    pub hi: f64,
}

impl RegBounds {
    pub fn point(reg: f64) -> Self {
        RegBounds { lo: reg, hi: reg }
    }

    /// Widens the range to include `reg`. Never narrows.
    pub fn widen(&mut self, reg: f64) {
        self.lo = self.lo.min(reg);
        self.hi = self.hi.max(reg);
    }
}

/// Cached solution for one cardinality.
#[derive(Debug, Clone)]
pub struct PathEntry {
    /// Most recently observed weights with this cardinality.
    pub weights: Array1<f64>,
    pub bounds: RegBounds,
}

/// Nearest cached cardinalities around a requested one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bracket {
    /// Largest cached cardinality strictly below the request.
    pub lower: usize,
    /// Smallest cached cardinality at or above the request.
    pub upper: usize,
}

/// Ordered cache of regularization path solutions.
///
/// Always holds the sentinels `0` (all-zero weights, bounds `[lambda_max, lambda_max]`)
/// and `N` (full weights, bounds `[0, 0]`), so every bracket lookup succeeds.
#[derive(Debug, Clone)]
pub struct PathCache {
    n: usize,
    lambda_max: f64,
    entries: BTreeMap<usize, PathEntry>,
}

impl PathCache {
    /// Creates the cache for a session with `full_weights.len()` items.
    ///
    /// # Arguments
    /// * `lambda_max`: Penalty at and above which the optimum is all-zero.
    /// * `full_weights`: Unregularized weighting with every item active.
    pub fn new(lambda_max: f64, full_weights: Array1<f64>) -> Self {
        let n = full_weights.len();
        let mut entries = BTreeMap::new();
        entries.insert(
            0,
            PathEntry { weights: Array1::zeros(n), bounds: RegBounds::point(lambda_max) },
        );
        entries.insert(n, PathEntry { weights: full_weights, bounds: RegBounds::point(0.0) });
        PathCache { n, lambda_max, entries }
    }

    /// Records that penalty `reg` produced `weights` with cardinality `m`.
    pub fn record(&mut self, m: usize, reg: f64, weights: Array1<f64>) -> Result<()> {
        if weights.len() != self.n {
            return Err(CoresetError::DimensionMismatch { expected: self.n, got: weights.len() });
        }
        if m > self.n {
            return Err(CoresetError::InvalidInput(format!(
                "cardinality {m} exceeds dataset size {}",
                self.n
            )));
        }
        match self.entries.get_mut(&m) {
            Some(entry) => {
                entry.weights = weights;
                entry.bounds.widen(reg);
            }
            None => {
                self.entries.insert(m, PathEntry { weights, bounds: RegBounds::point(reg) });
            }
        }
        Ok(())
    }

    /// Nearest cached cardinalities on either side of `m`.
    pub fn bracket_for(&self, m: usize) -> Bracket {
        let upper = self.entries.range(m..).next().map_or(self.n, |(&k, _)| k);
        let lower = self.entries.range(..m).next_back().map_or(0, |(&k, _)| k);
        Bracket { lower, upper }
    }

    /// Best warm start for a search towards `m`: the weights of whichever bracket
    /// end is closer, preferring the lower end on ties.
    pub fn nearest_weight(&self, m: usize, bracket: Bracket) -> ArrayView1<'_, f64> {
        let key = if bracket.upper.abs_diff(m) < bracket.lower.abs_diff(m) {
            bracket.upper
        } else {
            bracket.lower
        };
        self.entry(key).weights.view()
    }

    /// Largest cached cardinality at or below `m`, with its weights.
    pub fn lower_fallback(&self, m: usize) -> (usize, ArrayView1<'_, f64>) {
        match self.entries.range(..=m).next_back() {
            Some((&k, entry)) => (k, entry.weights.view()),
            // Unreachable while the 0 sentinel is present.
            None => (0, self.entry(0).weights.view()),
        }
    }

    pub fn contains(&self, m: usize) -> bool {
        self.entries.contains_key(&m)
    }

    pub fn weights(&self, m: usize) -> Option<ArrayView1<'_, f64>> {
        self.entries.get(&m).map(|e| e.weights.view())
    }

    pub fn bounds(&self, m: usize) -> Option<RegBounds> {
        self.entries.get(&m).map(|e| e.bounds)
    }

    /// Cached cardinalities in increasing order.
    pub fn cardinalities(&self) -> impl Iterator<Item = usize> + '_ {
        self.entries.keys().copied()
    }

    /// Number of distinct cached cardinalities.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always false: the sentinels are never removed.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Dataset size `N`.
    pub fn dim(&self) -> usize {
        self.n
    }

    pub fn lambda_max(&self) -> f64 {
        self.lambda_max
    }

    fn entry(&self, m: usize) -> &PathEntry {
        // Both sentinels are inserted at construction and never removed, and
        // brackets only ever name cached keys.
        &self.entries[&m]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn cache() -> PathCache {
        PathCache::new(2.0, array![1.0, 1.0, 1.0, 1.0, 1.0, 1.0])
    }

    #[test]
    fn starts_with_sentinels() {
        let c = cache();
        assert_eq!(c.cardinalities().collect::<Vec<_>>(), vec![0, 6]);
        assert_eq!(c.bounds(0), Some(RegBounds::point(2.0)));
        assert_eq!(c.bounds(6), Some(RegBounds::point(0.0)));
        assert_eq!(c.weights(0).unwrap(), Array1::<f64>::zeros(6));
        assert_eq!(c.weights(6).unwrap(), Array1::<f64>::ones(6));
        assert_eq!(c.dim(), 6);
        assert_eq!(c.lambda_max(), 2.0);
    }

    #[test]
    fn record_keeps_cardinalities_sorted_and_widens_bounds() {
        let mut c = cache();
        c.record(4, 0.5, array![1.0, 1.0, 1.0, 1.0, 0.0, 0.0]).unwrap();
        c.record(2, 1.0, array![1.0, 1.0, 0.0, 0.0, 0.0, 0.0]).unwrap();
        c.record(4, 0.7, array![0.0, 1.0, 1.0, 1.0, 1.0, 0.0]).unwrap();
        c.record(4, 0.6, array![2.0, 1.0, 1.0, 1.0, 0.0, 0.0]).unwrap();

        assert_eq!(c.cardinalities().collect::<Vec<_>>(), vec![0, 2, 4, 6]);
        assert_eq!(c.bounds(4), Some(RegBounds { lo: 0.5, hi: 0.7 }));
        assert_eq!(c.weights(4).unwrap(), array![2.0, 1.0, 1.0, 1.0, 0.0, 0.0]);
        assert_eq!(c.len(), 4);
    }

    #[test]
    fn record_rejects_wrong_length() {
        let mut c = cache();
        let err = c.record(1, 1.0, array![1.0]).unwrap_err();
        assert!(matches!(err, CoresetError::DimensionMismatch { expected: 6, got: 1 }));
    }

    #[test]
    fn bracket_uses_nearest_cached_neighbours() {
        let mut c = cache();
        c.record(2, 1.0, array![1.0, 1.0, 0.0, 0.0, 0.0, 0.0]).unwrap();
        c.record(5, 0.2, array![1.0, 1.0, 1.0, 1.0, 1.0, 0.0]).unwrap();

        assert_eq!(c.bracket_for(3), Bracket { lower: 2, upper: 5 });
        assert_eq!(c.bracket_for(1), Bracket { lower: 0, upper: 2 });
        assert_eq!(c.bracket_for(6), Bracket { lower: 5, upper: 6 });
    }

    #[test]
    fn nearest_weight_prefers_closer_end_and_lower_on_ties() {
        let mut c = cache();
        c.record(2, 1.0, array![1.0, 1.0, 0.0, 0.0, 0.0, 0.0]).unwrap();

        let b = c.bracket_for(5);
        assert_eq!(c.nearest_weight(5, b), Array1::<f64>::ones(6));
        let b = c.bracket_for(3);
        assert_eq!(c.nearest_weight(3, b), array![1.0, 1.0, 0.0, 0.0, 0.0, 0.0]);
        // 4 is equidistant from 2 and 6
        let b = c.bracket_for(4);
        assert_eq!(c.nearest_weight(4, b), array![1.0, 1.0, 0.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn lower_fallback_picks_largest_at_or_below() {
        let mut c = cache();
        c.record(3, 0.8, array![1.0, 1.0, 1.0, 0.0, 0.0, 0.0]).unwrap();
        assert_eq!(c.lower_fallback(4).0, 3);
        assert_eq!(c.lower_fallback(3).0, 3);
        assert_eq!(c.lower_fallback(2).0, 0);
        assert_eq!(c.lower_fallback(2).1, Array1::<f64>::zeros(6));
    }
}
