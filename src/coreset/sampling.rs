//! # Importance-Sampling Coresets
//!
//! Draws rows with replacement from a fixed distribution and weights every drawn
//! row by its inverse inclusion probability, giving an unbiased estimate of the sum.

use ndarray::{Array1, ArrayView1, ArrayView2, Axis};
use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::debug;

use super::{Coreset, VectorData};
use crate::error::{CoresetError, Result};

/// How sampling probabilities are chosen.
#[derive(Debug, Clone, PartialEq)]
pub enum SamplingScheme {
    /// Proportional to row norms; uniform if every norm is zero.
    Norms,
    /// Every nonzero row equally likely.
    Uniform,
    /// Caller-supplied probabilities, one per original row (normalized internally).
    Custom(Array1<f64>),
}

/// Coreset grown by multinomial sampling.
#[derive(Debug, Clone)]
pub struct SamplingCoreset {
    data: VectorData,
    probs: Array1<f64>,
    counts: Array1<u64>,
    wts: Array1<f64>,
    seed: u64,
    rng: StdRng,
}

impl SamplingCoreset {
    /// Prepares a sampling coreset of the rows of `data`.
    ///
    /// # Arguments
    /// * `data`: One item per row. Must be finite.
    /// * `scheme`: Sampling distribution. Negative probabilities are rejected.
    /// * `seed`: Seed of the sampler; `reset` restarts the same random stream.
    pub fn new(data: ArrayView2<f64>, scheme: SamplingScheme, seed: u64) -> Result<Self> {
        let full_n = data.nrows();
        let data = VectorData::new(data)?;
        let n = data.len();

        let probs = match scheme {
            SamplingScheme::Norms => {
                if data.norms().sum() > 0.0 {
                    data.norms().to_owned()
                } else {
                    Array1::ones(n)
                }
            }
            SamplingScheme::Uniform => Array1::ones(n),
            SamplingScheme::Custom(ps) => {
                if ps.len() != full_n {
                    return Err(CoresetError::DimensionMismatch { expected: full_n, got: ps.len() });
                }
                if let Some((index, &value)) = ps.iter().enumerate().find(|(_, p)| !p.is_finite()) {
                    return Err(CoresetError::InvalidInput(format!(
                        "sampling probability {index} is {value}"
                    )));
                }
                if let Some((index, &value)) = ps.iter().enumerate().find(|(_, &p)| p < 0.0) {
                    return Err(CoresetError::NegativeProbability { index, value });
                }
                ps.select(Axis(0), data.kept_rows())
            }
        };

        let total = probs.sum();
        if n > 0 && total <= 0.0 {
            return Err(CoresetError::InvalidInput(
                "sampling probabilities of the nonzero rows sum to zero".into(),
            ));
        }
        let probs = if n > 0 { probs / total } else { probs };

        Ok(SamplingCoreset {
            data,
            probs,
            counts: Array1::zeros(n),
            wts: Array1::zeros(n),
            seed,
            rng: StdRng::seed_from_u64(seed),
        })
    }

    /// Normalized sampling probabilities over the nonzero rows.
    pub fn probabilities(&self) -> ArrayView1<'_, f64> {
        self.probs.view()
    }

    /// Draw counts per nonzero row.
    pub fn counts(&self) -> ArrayView1<'_, u64> {
        self.counts.view()
    }

    /// Total draws so far.
    pub fn draws(&self) -> u64 {
        self.counts.sum()
    }

    pub fn data(&self) -> &VectorData {
        &self.data
    }

    /// Grows the sample towards `size` draws, taking at most `budget` new draws.
    /// Returns the number of distinct rows in the coreset.
    pub fn build_with_budget(&mut self, size: usize, budget: usize) -> Result<usize> {
        if self.probs.is_empty() {
            return Ok(0);
        }
        let drawn = self.draws();
        let wanted = (size as u64).saturating_sub(drawn).min(budget as u64);
        if wanted > 0 {
            let dist = WeightedIndex::new(self.probs.iter())
                .map_err(|e| CoresetError::InvalidInput(format!("invalid sampling distribution: {e}")))?;
            for _ in 0..wanted {
                self.counts[dist.sample(&mut self.rng)] += 1;
            }
        }

        // Each draw of row n estimates norms_n x_n / p_n.
        let total = self.draws();
        if total > 0 {
            let scale = total as f64;
            let norms = self.data.norms();
            for i in 0..self.wts.len() {
                self.wts[i] = self.counts[i] as f64 * norms[i] / (self.probs[i] * scale);
            }
        }
        let distinct = self.size();
        debug!(requested = size, draws = total, distinct, "built sampling coreset");
        Ok(distinct)
    }
}

impl Coreset for SamplingCoreset {
    fn reset(&mut self) {
        self.counts.fill(0);
        self.wts.fill(0.0);
        self.rng = StdRng::seed_from_u64(self.seed);
    }

    fn build(&mut self, size: usize) -> Result<usize> {
        self.build_with_budget(size, usize::MAX)
    }

    fn weights(&self) -> Array1<f64> {
        self.data
            .full_weights(self.wts.view(), 1.0)
            .unwrap_or_else(|_| Array1::zeros(self.data.full_len()))
    }

    fn error(&self) -> f64 {
        self.data.residual_error(self.wts.view(), false).unwrap_or(f64::NAN)
    }

    fn size(&self) -> usize {
        self.counts.iter().filter(|&&c| c > 0).count()
    }

    fn len(&self) -> usize {
        self.data.full_len()
    }
}
