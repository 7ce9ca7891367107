//! # Configuration
//!
//! Optimizer hyperparameters and logging settings. Everything can be built in code
//! through `Default` or loaded from TOML, where every field is optional:
//!
//! ```toml
//! [optimizer]
//! opt_itrs = 500
//! adam_a1 = 0.5
//!
//! [logging]
//! level = "debug"
//! format = "json"
//! ```

use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing_subscriber::{fmt, EnvFilter};

use crate::error::{CoresetError, Result};

/// Hyperparameters of the projected Adam oracle and of the NNLS refinement.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    /// Fixed iteration budget of every proximal solve.
    pub opt_itrs: usize,
    /// Step-size numerator: iteration `t` uses `adam_a1 / (t + adam_a2)`.
    pub adam_a1: f64,
    /// Step-size offset.
    pub adam_a2: f64,
    /// Decay rate of the first-moment estimate.
    pub adam_b1: f64,
    /// Decay rate of the second-moment estimate.
    pub adam_b2: f64,
    /// Added to the RMS denominator for numerical stability.
    pub adam_eps: f64,
    /// Sweep budget of the refinement solver. `0` means `max(1000, 10 * dim)`.
    pub nnls_max_iter: usize,
    /// Refinement stops once no coordinate moves by more than this.
    pub nnls_tol: f64,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            opt_itrs: 1000,
            adam_a1: 1.0,
            adam_a2: 1.0,
            adam_b1: 0.9,
            adam_b2: 0.99,
            adam_eps: 1e-8,
            nnls_max_iter: 0,
            nnls_tol: 1e-12,
        }
    }
}

impl OptimizerConfig {
    /// Rejects hyperparameters that would make the oracle diverge or divide by zero.
    pub fn validate(&self) -> Result<()> {
        let finite = [
            ("adam_a1", self.adam_a1),
            ("adam_a2", self.adam_a2),
            ("adam_b1", self.adam_b1),
            ("adam_b2", self.adam_b2),
            ("adam_eps", self.adam_eps),
            ("nnls_tol", self.nnls_tol),
        ];
        for (name, value) in finite {
            if !value.is_finite() {
                return Err(CoresetError::InvalidConfig(format!("{name} must be finite, got {value}")));
            }
        }
        if self.adam_a1 < 0.0 {
            return Err(CoresetError::InvalidConfig("adam_a1 must be >= 0".into()));
        }
        if self.adam_a2 < 0.0 {
            return Err(CoresetError::InvalidConfig("adam_a2 must be >= 0".into()));
        }
        if !(0.0..1.0).contains(&self.adam_b1) {
            return Err(CoresetError::InvalidConfig("adam_b1 must lie in [0, 1)".into()));
        }
        if !(0.0..1.0).contains(&self.adam_b2) {
            return Err(CoresetError::InvalidConfig("adam_b2 must lie in [0, 1)".into()));
        }
        if self.adam_eps < 0.0 {
            return Err(CoresetError::InvalidConfig("adam_eps must be >= 0".into()));
        }
        if self.nnls_tol < 0.0 {
            return Err(CoresetError::InvalidConfig("nnls_tol must be >= 0".into()));
        }
        Ok(())
    }

    /// Refinement sweep budget for a problem with `dim` output coordinates.
    pub fn nnls_budget(&self, dim: usize) -> usize {
        if self.nnls_max_iter > 0 {
            self.nnls_max_iter
        } else {
            1000.max(10 * dim)
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "pretty".into(),
        }
    }
}

impl LoggingConfig {
    /// Installs a global `tracing` subscriber. `RUST_LOG` takes precedence over
    /// `level`. Does nothing if a subscriber is already installed.
    pub fn init(&self) {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.level));

        let installed = match self.format.as_str() {
            "json" => fmt().json().with_env_filter(filter).try_init(),
            _ => fmt().with_env_filter(filter).try_init(),
        };
        if installed.is_err() {
            tracing::debug!("tracing subscriber already installed; keeping it");
        }
    }
}

/// Top-level configuration file.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub optimizer: OptimizerConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Parses and validates a TOML document.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.optimizer.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }
}
