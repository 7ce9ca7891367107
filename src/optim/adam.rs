//! # Projected Adam Optimizer

use ndarray::{Array1, ArrayView1, Zip};

use super::{project_nonnegative, Optimizer};
use crate::config::OptimizerConfig;
use crate::error::{CoresetError, Result};

/// Implements Adam with a diminishing step size and a nonnegativity projection.
///
/// Iteration `t` (1-based) moves by `a1 / (t + a2) * m1_hat / (eps + sqrt(m2_hat))`
/// where `m1_hat`, `m2_hat` are the bias-corrected moment estimates, then clamps the
/// iterate to `x >= 0`.
/// Reference: Adam: A Method for Stochastic Optimization - https://arxiv.org/abs/1412.6980
#[derive(Clone, Debug)]
pub struct Adam {
    a1: f64,
    a2: f64,
    betas: (f64, f64), // (beta1, beta2)
    eps: f64,

    exp_avg: Array1<f64>,    // 1st moment estimate - m_t
    exp_avg_sq: Array1<f64>, // 2nd moment estimate - v_t
    t: usize,
}

impl Adam {
    /// Creates a new Adam optimizer for vectors of length `dim`.
    ///
    /// # Arguments
    /// * `dim`: Length of the optimized vector.
    /// * `config`: Step-size schedule, decay rates and epsilon. Validated here.
    pub fn new(dim: usize, config: &OptimizerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Adam {
            a1: config.adam_a1,
            a2: config.adam_a2,
            betas: (config.adam_b1, config.adam_b2),
            eps: config.adam_eps,
            exp_avg: Array1::zeros(dim),
            exp_avg_sq: Array1::zeros(dim),
            t: 0,
        })
    }

    /// Number of steps taken since construction or the last reset.
    pub fn iterations(&self) -> usize {
        self.t
    }
}

impl Optimizer for Adam {
    fn step(&mut self, x: &mut Array1<f64>, grad: ArrayView1<f64>) -> Result<()> {
        let dim = self.exp_avg.len();
        if x.len() != dim {
            return Err(CoresetError::DimensionMismatch { expected: dim, got: x.len() });
        }
        if grad.len() != dim {
            return Err(CoresetError::DimensionMismatch { expected: dim, got: grad.len() });
        }

        self.t += 1;
        let (beta1, beta2) = self.betas;
        let bias_correction1 = 1.0 - beta1.powi(self.t as i32);
        let bias_correction2 = 1.0 - beta2.powi(self.t as i32);
        let step_size = self.a1 / (self.t as f64 + self.a2);
        let eps = self.eps;

        // m_t = beta1 * m_{t-1} + (1 - beta1) * g_t
        // v_t = beta2 * v_{t-1} + (1 - beta2) * g_t^2
        // x -= step_size * (m_t / bc1) / (eps + sqrt(v_t / bc2))
        Zip::from(x.view_mut())
            .and(&mut self.exp_avg)
            .and(&mut self.exp_avg_sq)
            .and(grad)
            .for_each(|xi, m1, m2, &g| {
                *m1 = beta1 * *m1 + (1.0 - beta1) * g;
                *m2 = beta2 * *m2 + (1.0 - beta2) * g * g;
                let m1_hat = *m1 / bias_correction1;
                let m2_hat = *m2 / bias_correction2;
                *xi -= step_size * m1_hat / (eps + m2_hat.sqrt());
            });

        project_nonnegative(x);
        Ok(())
    }

    fn reset(&mut self) {
        self.exp_avg.fill(0.0);
        self.exp_avg_sq.fill(0.0);
        self.t = 0;
    }
}

/// Minimizes a function over `x >= 0` given only its gradient.
///
/// Runs exactly `config.opt_itrs` projected Adam steps from a copy of `x0`; there is
/// no convergence-based early exit. The result never has negative entries, even for
/// ill-behaved gradients.
///
/// # Arguments
/// * `x0`: Starting point. Negative entries are clamped to zero before the first step,
///   so with zero iterations the result is `x0` projected onto `x >= 0`.
/// * `grad`: Gradient of the objective; must return a vector of the same length.
/// * `config`: Iteration budget and Adam hyperparameters.
pub fn adam<G>(x0: ArrayView1<f64>, mut grad: G, config: &OptimizerConfig) -> Result<Array1<f64>>
where
    G: FnMut(ArrayView1<f64>) -> Array1<f64>,
{
    let mut optimizer = Adam::new(x0.len(), config)?;
    let mut x = x0.to_owned();
    project_nonnegative(&mut x);

    for itr in 0..config.opt_itrs {
        let g = grad(x.view());
        if g.len() == x.len() && tracing::enabled!(tracing::Level::TRACE) {
            // Gradient norm over the currently active coordinates.
            let active_norm = Zip::from(&x)
                .and(&g)
                .fold(0.0, |acc, &xi, &gi| if xi > 0.0 { acc + gi * gi } else { acc })
                .sqrt();
            tracing::trace!(itr = itr + 1, total = config.opt_itrs, active_grad_norm = active_norm, "adam step");
        }
        optimizer.step(&mut x, g.view())?;
    }

    Ok(x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn config(opt_itrs: usize) -> OptimizerConfig {
        OptimizerConfig { opt_itrs, ..OptimizerConfig::default() }
    }

    #[test]
    fn first_step_moves_by_step_size_against_gradient_sign() {
        let cfg = OptimizerConfig::default();
        let mut opt = Adam::new(2, &cfg).unwrap();
        let mut x = array![5.0, 5.0];
        opt.step(&mut x, array![2.0, -3.0].view()).unwrap();
        // With bias correction the first step is a1 / (1 + a2) * sign(g), up to eps.
        assert!((x[0] - 4.5).abs() < 1e-6);
        assert!((x[1] - 5.5).abs() < 1e-6);
        assert_eq!(opt.iterations(), 1);
    }

    #[test]
    fn step_projects_onto_nonnegative_orthant() {
        let mut opt = Adam::new(1, &OptimizerConfig::default()).unwrap();
        let mut x = array![0.1];
        opt.step(&mut x, array![10.0].view()).unwrap();
        assert_eq!(x[0], 0.0);
    }

    #[test]
    fn step_rejects_wrong_gradient_length() {
        let mut opt = Adam::new(3, &OptimizerConfig::default()).unwrap();
        let mut x = Array1::zeros(3);
        let err = opt.step(&mut x, array![1.0].view()).unwrap_err();
        assert!(matches!(err, CoresetError::DimensionMismatch { expected: 3, got: 1 }));
    }

    #[test]
    fn reset_restores_first_step_behaviour() {
        let cfg = OptimizerConfig::default();
        let mut opt = Adam::new(1, &cfg).unwrap();
        let mut x = array![3.0];
        for _ in 0..5 {
            opt.step(&mut x, array![1.0].view()).unwrap();
        }
        opt.reset();
        assert_eq!(opt.iterations(), 0);
        let mut y = array![3.0];
        opt.step(&mut y, array![1.0].view()).unwrap();
        assert!((y[0] - 2.5).abs() < 1e-6);
    }

    #[test]
    fn invalid_config_is_rejected_eagerly() {
        let cfg = OptimizerConfig { adam_b2: 1.5, ..OptimizerConfig::default() };
        assert!(matches!(Adam::new(2, &cfg), Err(CoresetError::InvalidConfig(_))));
    }

    #[test]
    fn converges_to_interior_minimum_of_quadratic() {
        // f(x) = 0.5 * ||x - c||^2 with c >= 0
        let c = array![1.0, 2.0, 0.5];
        let x = adam(Array1::zeros(3).view(), |x| &x - &c, &config(3000)).unwrap();
        for (xi, ci) in x.iter().zip(c.iter()) {
            assert!((xi - ci).abs() < 1e-2, "{xi} vs {ci}");
        }
    }

    #[test]
    fn converges_to_boundary_when_minimum_is_negative() {
        let c = array![-1.0, 2.0];
        let x = adam(array![1.0, 1.0].view(), |x| &x - &c, &config(3000)).unwrap();
        assert_eq!(x[0], 0.0);
        assert!((x[1] - 2.0).abs() < 1e-2);
    }

    #[test]
    fn zero_iterations_returns_projected_start() {
        let x = adam(array![1.0, -2.0].view(), |x| x.to_owned(), &config(0)).unwrap();
        assert_eq!(x, array![1.0, 0.0]);
    }

    #[test]
    fn output_is_nonnegative_for_hostile_gradients() {
        let gradients: Vec<Box<dyn Fn(ArrayView1<f64>) -> Array1<f64>>> = vec![
            Box::new(|x| Array1::from_elem(x.len(), 1e6)),
            Box::new(|x| Array1::from_elem(x.len(), f64::NAN)),
            Box::new(|x| x.mapv(|v| if v > 1.0 { 1.0 } else { -1.0 })),
            Box::new(|x| Array1::from_elem(x.len(), f64::INFINITY)),
        ];
        for itrs in [0, 1, 7, 100] {
            for g in &gradients {
                let x = adam(array![0.0, 0.3, 4.0].view(), |x| g(x), &config(itrs)).unwrap();
                assert!(x.iter().all(|&v| v >= 0.0), "negative entry in {x}");
            }
        }
    }

    #[test]
    fn wrong_gradient_length_surfaces_as_error() {
        let err = adam(array![1.0, 1.0].view(), |_| array![1.0], &config(3)).unwrap_err();
        assert!(matches!(err, CoresetError::DimensionMismatch { .. }));
    }
}
