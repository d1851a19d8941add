//! Summary statistics over repeated timing samples
//!
//! Used by the benchmark to condense `repeats` runs of each phase into a
//! single row.

use serde::Serialize;

/// Statistics for one timed phase, in seconds
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimingSummary {
    pub samples: usize,
    pub mean: f64,
    pub median: f64,
    /// Sample standard deviation (n - 1); 0 for a single sample
    pub stdev: f64,
    pub min: f64,
    pub max: f64,
    pub p95: f64,
}

impl TimingSummary {
    /// `None` when there are no samples
    pub fn from_samples(samples: &[f64]) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }
        let mut sorted = samples.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));

        let n = sorted.len();
        let mean = sorted.iter().sum::<f64>() / n as f64;
        let median = if n % 2 == 1 {
            sorted[n / 2]
        } else {
            (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
        };
        let stdev = if n > 1 {
            let variance = sorted.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
            variance.sqrt()
        } else {
            0.0
        };

        Some(Self {
            samples: n,
            mean,
            median,
            stdev,
            min: sorted[0],
            max: sorted[n - 1],
            p95: Self::percentile(&sorted, 95.0),
        })
    }

    /// Nearest-rank percentile of sorted data
    fn percentile(sorted_data: &[f64], p: f64) -> f64 {
        let idx = (p / 100.0 * (sorted_data.len() - 1) as f64).round() as usize;
        sorted_data[idx.min(sorted_data.len() - 1)]
    }

    /// Mean formatted in the most readable unit
    pub fn display_mean(&self) -> String {
        format_seconds(self.mean)
    }
}

/// `1.234s`, `12.3ms` or `45.6µs`
pub fn format_seconds(seconds: f64) -> String {
    if seconds >= 1.0 {
        format!("{:.3}s", seconds)
    } else if seconds >= 1e-3 {
        format!("{:.1}ms", seconds * 1e3)
    } else {
        format!("{:.1}µs", seconds * 1e6)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_samples_give_none() {
        assert!(TimingSummary::from_samples(&[]).is_none());
    }

    #[test]
    fn single_sample_has_zero_spread() {
        let s = TimingSummary::from_samples(&[0.5]).unwrap();
        assert_eq!(s.mean, 0.5);
        assert_eq!(s.median, 0.5);
        assert_eq!(s.stdev, 0.0);
        assert_eq!(s.min, s.max);
    }

    #[test]
    fn summary_of_unsorted_samples() {
        let s = TimingSummary::from_samples(&[4.0, 1.0, 3.0, 2.0]).unwrap();
        assert_eq!(s.samples, 4);
        assert_eq!(s.mean, 2.5);
        assert_eq!(s.median, 2.5);
        assert_eq!(s.min, 1.0);
        assert_eq!(s.max, 4.0);
        assert!((s.stdev - (5.0f64 / 3.0).sqrt()).abs() < 1e-12);
        assert_eq!(s.p95, 4.0);
    }

    #[test]
    fn seconds_pick_readable_unit() {
        assert_eq!(format_seconds(2.0), "2.000s");
        assert_eq!(format_seconds(0.0125), "12.5ms");
        assert_eq!(format_seconds(0.000_002), "2.0µs");
    }
}
