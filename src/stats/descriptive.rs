//! Descriptive statistics over plain `f64` slices.
//!
//! Every function here is total: empty or degenerate input yields a neutral
//! `0.0` instead of an error or `NaN`, so report code can render "no data"
//! without special-casing.

use std::cmp::Ordering;

/// Arithmetic mean; `0` for empty input.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population variance (divide by N); `0` for fewer than 2 values.
pub fn variance(values: &[f64]) -> f64 {
    variance_with(values, true)
}

/// Sample variance (divide by N-1); `0` for fewer than 2 values.
pub fn sample_variance(values: &[f64]) -> f64 {
    variance_with(values, false)
}

/// Variance with an explicit denominator convention.
pub fn variance_with(values: &[f64], population: bool) -> f64 {
    let n = values.len();
    if n < 2 {
        return 0.0;
    }
    let m = mean(values);
    let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    let denom = if population { n as f64 } else { (n - 1) as f64 };
    ss / denom
}

/// Population standard deviation.
pub fn std_dev(values: &[f64]) -> f64 {
    variance(values).sqrt()
}

/// Coefficient of variation in percent: `stddev / |mean| * 100`.
///
/// Returns `0` when the mean is zero or there are fewer than 2 values.
pub fn coefficient_of_variation(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    if m == 0.0 {
        return 0.0;
    }
    std_dev(values) / m.abs() * 100.0
}

/// Compound annual growth rate in percent.
///
/// - `0` if `start <= 0` or `years < 1` (growth is undefined)
/// - `-100` if `end <= 0` while `start > 0`: a terminal zero is complete decline
pub fn cagr(start: f64, end: f64, years: f64) -> f64 {
    if !(start > 0.0) || !(years >= 1.0) {
        return 0.0;
    }
    if end <= 0.0 {
        return -100.0;
    }
    ((end / start).powf(1.0 / years) - 1.0) * 100.0
}

/// CAGR between the positional first and last values over `len - 1` years.
///
/// Leading or trailing zeros are not skipped.
pub fn cagr_from_series(values: &[f64]) -> f64 {
    match (values.first(), values.last()) {
        (Some(&first), Some(&last)) if values.len() >= 2 => {
            cagr(first, last, (values.len() - 1) as f64)
        }
        _ => 0.0,
    }
}

/// Median; `0` for empty input.
pub fn median(values: &[f64]) -> f64 {
    percentile(values, 50.0)
}

/// Percentile `p` in `[0, 100]` with linear interpolation between closest ranks.
///
/// `p` outside the range is clamped. Returns `0` for empty input.
pub fn percentile(values: &[f64], p: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    percentile_sorted(&sorted, p)
}

/// Same as [`percentile`] but for a slice that is already sorted ascending.
pub fn percentile_sorted(sorted: &[f64], p: f64) -> f64 {
    let n = sorted.len();
    if n == 0 {
        return 0.0;
    }
    if n == 1 {
        return sorted[0];
    }

    let p = if p.is_nan() { 50.0 } else { p.clamp(0.0, 100.0) };
    let rank = p / 100.0 * (n - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    if lo == hi {
        return sorted[lo];
    }
    let frac = rank - lo as f64;
    sorted[lo] + frac * (sorted[hi] - sorted[lo])
}

/// Percentile rank of `value` within `values`, in percent.
///
/// Uses the mean-rank convention: values strictly below count fully and ties
/// count half. Returns `0` for empty input.
pub fn percentile_rank(value: f64, values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let below = values.iter().filter(|&&v| v < value).count() as f64;
    let equal = values.iter().filter(|&&v| v == value).count() as f64;
    (below + 0.5 * equal) / values.len() as f64 * 100.0
}
