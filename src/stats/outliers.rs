//! Outlier detection, returning index positions of flagged points.

use crate::stats::descriptive::{mean, percentile, std_dev};

/// Conventional Tukey fence multiplier.
pub const DEFAULT_IQR_K: f64 = 1.5;

/// Conventional z-score cutoff.
pub const DEFAULT_Z_THRESHOLD: f64 = 3.0;

/// Flag values outside `[Q1 - k·IQR, Q3 + k·IQR]`.
///
/// Needs at least 4 values for quartiles to mean anything; fewer yields no flags.
pub fn iqr_outliers(values: &[f64], k: f64) -> Vec<usize> {
    if values.len() < 4 {
        return Vec::new();
    }
    let q1 = percentile(values, 25.0);
    let q3 = percentile(values, 75.0);
    let iqr = q3 - q1;
    let lower = q1 - k * iqr;
    let upper = q3 + k * iqr;

    values
        .iter()
        .enumerate()
        .filter(|&(_, &v)| v < lower || v > upper)
        .map(|(i, _)| i)
        .collect()
}

/// Flag values whose population z-score exceeds `threshold` in absolute value.
///
/// A constant series has no spread and therefore no outliers.
pub fn zscore_outliers(values: &[f64], threshold: f64) -> Vec<usize> {
    if values.len() < 2 {
        return Vec::new();
    }
    let m = mean(values);
    let sd = std_dev(values);
    if sd == 0.0 {
        return Vec::new();
    }

    values
        .iter()
        .enumerate()
        .filter(|&(_, &v)| ((v - m) / sd).abs() > threshold)
        .map(|(i, _)| i)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iqr_flags_extreme_point() {
        let values = [10.0, 11.0, 12.0, 11.5, 10.5, 95.0, 11.2];
        assert_eq!(iqr_outliers(&values, DEFAULT_IQR_K), vec![5]);
    }

    #[test]
    fn iqr_needs_four_values() {
        assert!(iqr_outliers(&[1.0, 100.0, 1.0], DEFAULT_IQR_K).is_empty());
    }

    #[test]
    fn zscore_threshold_is_configurable() {
        let mut values = vec![100.0; 20];
        values.push(160.0);
        assert_eq!(zscore_outliers(&values, DEFAULT_Z_THRESHOLD), vec![20]);
        assert!(zscore_outliers(&values, 10.0).is_empty());
    }

    #[test]
    fn constant_series_has_no_outliers() {
        assert!(zscore_outliers(&[4.0, 4.0, 4.0], 1.0).is_empty());
        assert!(iqr_outliers(&[4.0, 4.0, 4.0, 4.0], 1.5).is_empty());
    }
}
