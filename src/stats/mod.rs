//! Statistics helpers for the performance benchmark.

pub mod timing;

pub use timing::{format_seconds, TimingSummary};
