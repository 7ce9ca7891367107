//! # Utility Functions (`utils`)
//!
//! Helpers shared by the coreset owners.

pub mod parallel;

pub use parallel::{row_dots, weighted_row_sum};
