//! # RCoreset Core Library
//!
//! This crate builds sparse weighted coresets: small reweighted subsets of a
//! dataset whose weighted aggregate stays close to that of the full data.
//!
//! The centerpiece is the regularization path search in [`path`]: an L1-style
//! penalty strength is bisected until the optimized weight vector has exactly the
//! requested number of nonzeros, and every solve is cached so that a sweep over
//! many coreset sizes reuses earlier work. The numerical oracle used inside the
//! search is the projected Adam optimizer in [`optim`].
//!
//! ```rust,no_run
//! use ndarray::Array2;
//! use rcoreset_lib::coreset::{Coreset, VectorL1Coreset};
//! use rcoreset_lib::config::OptimizerConfig;
//!
//! let data = Array2::from_shape_fn((100, 5), |(i, j)| ((i * 7 + j * 3) % 11) as f64);
//! let mut coreset = VectorL1Coreset::new(data.view(), OptimizerConfig::default()).unwrap();
//! for m in [1, 2, 4, 8, 16] {
//!     let achieved = coreset.build(m).unwrap();
//!     println!("requested {m}, got {achieved}, error {:.3e}", coreset.error());
//! }
//! ```

pub mod config;
pub mod coreset;
pub mod error;
pub mod optim;
pub mod path;
pub mod utils;

pub use error::{CoresetError, Result};

/// Numeric tolerance shared by weight thresholding, bracket-collapse detection and
/// cardinality counting. Every use must go through this one value so that cached
/// cardinalities stay self-consistent.
pub const TOL: f64 = 1e-12;
