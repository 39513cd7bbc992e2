//! Statistical primitives for adaptive thresholds
//!
//! Quartiles use the (n + 1)p position estimator with linear interpolation
//! between order statistics (Hyndman-Fan type 6, the default estimator of
//! Apache Commons Math's `Percentile`). Positions before the first
//! or past the last order statistic clamp to the minimum or maximum. The
//! method is fixed so thresholds are reproducible across dimensions and runs.

use std::cmp::Ordering;

/// Estimate the `p`-th percentile (0 < p <= 100) of `values`
///
/// Returns 0.0 for an empty slice.
pub fn percentile(values: &[f64], p: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted: Vec<f64> = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    percentile_sorted(&sorted, p)
}

fn percentile_sorted(sorted: &[f64], p: f64) -> f64 {
    let n = sorted.len();
    if n == 1 {
        return sorted[0];
    }

    let pos = p * (n + 1) as f64 / 100.0;
    if pos < 1.0 {
        return sorted[0];
    }
    if pos >= n as f64 {
        return sorted[n - 1];
    }

    let floor = pos.floor();
    let idx = floor as usize;
    let lower = sorted[idx - 1];
    let upper = sorted[idx];
    lower + (pos - floor) * (upper - lower)
}

/// Interquartile range: Q3 - Q1
pub fn interquartile_range(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted: Vec<f64> = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    percentile_sorted(&sorted, 75.0) - percentile_sorted(&sorted, 25.0)
}

/// Whether `value` is a usable utilization ratio: finite and within [0, 1]
pub fn is_utilization_ratio(value: f64) -> bool {
    value.is_finite() && (0.0..=1.0).contains(&value)
}

/// Number of non-zero samples at the start of the series, up to the first zero
pub fn count_non_zero_beginning(values: &[f64]) -> usize {
    values.iter().take_while(|v| **v != 0.0).count()
}
