//! TOPSIS Profile Selection Library
//!
//! Ranks profiles against activity skill requirements with TOPSIS and
//! computes an optimal one-to-one profile/activity assignment.

pub mod benchmark;
pub mod core;
pub mod error;
pub mod model;
pub mod optimization;
pub mod stats;
pub mod ui;
pub mod utils;

pub use crate::core::config::SelectionConfig;
pub use crate::core::processor::{ActivityRanking, ProfileProcessor};
pub use crate::core::{
    compare_formulas, run_assignment, run_benchmark, run_formula_comparison, run_generate,
    run_selection,
};
pub use error::{Result, SelectionError};

/// Library version
pub const VERSION: &str = "0.3.2";
