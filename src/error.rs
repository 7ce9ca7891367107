//! # Error Types
//!
//! A single error enum shared by the optimizers, the regularization path and the
//! coreset owners.

/// Errors raised while configuring or running coreset construction.
///
/// Unreachable cardinalities are *not* errors: the regularization path falls back
/// to the nearest reachable cardinality below the request and reports it.
#[derive(thiserror::Error, Debug)]
pub enum CoresetError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Sampling probabilities must be nonnegative: index {index} has value {value}")]
    NegativeProbability { index: usize, value: f64 },
    #[error("Dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Numerical failure: {0}")]
    NumericalFailure(String),
    #[error("Could not parse configuration: {0}")]
    Config(#[from] toml::de::Error),
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CoresetError>;
