//! Linear trend estimation.
//!
//! A trend is an OLS line through `(x, y)` plus two qualitative labels:
//!
//! - `direction`: `|slope / mean| > 1%` per step decides increasing/decreasing
//! - `significant`: two-sided t-test on the slope (`p < 0.05`) **and** `r² >= 0.5`

use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, StudentsT};

use crate::error::AppError;
use crate::math::fit_line;
use crate::stats::descriptive::mean;

/// Relative slope (per step, as a fraction of the mean) above which a series trends.
pub const DIRECTION_THRESHOLD: f64 = 0.01;

/// Significance level of the slope t-test.
pub const SIGNIFICANCE_ALPHA: f64 = 0.05;

/// Minimum r² for a trend to count as significant.
pub const MIN_R_SQUARED: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Increasing,
    Decreasing,
    Stable,
}

impl TrendDirection {
    pub fn label(self) -> &'static str {
        match self {
            TrendDirection::Increasing => "increasing",
            TrendDirection::Decreasing => "decreasing",
            TrendDirection::Stable => "stable",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearTrend {
    pub slope: f64,
    pub intercept: f64,
    pub r_squared: f64,
    pub p_value: f64,
    pub direction: TrendDirection,
    pub significant: bool,
    pub n: usize,
}

impl LinearTrend {
    /// A flat, non-significant trend used for degenerate input.
    pub fn flat(level: f64, n: usize) -> Self {
        Self {
            slope: 0.0,
            intercept: level,
            r_squared: 0.0,
            p_value: 1.0,
            direction: TrendDirection::Stable,
            significant: false,
            n,
        }
    }

    /// Fitted value at `x`.
    pub fn predict(&self, x: f64) -> f64 {
        self.intercept + self.slope * x
    }
}

/// Fit a trend against index positions `0..n-1`.
pub fn linear_trend(values: &[f64]) -> LinearTrend {
    let xs: Vec<f64> = (0..values.len()).map(|i| i as f64).collect();
    trend_from_points(&xs, values)
}

/// Fit a trend against explicit x values (typically years).
///
/// Mismatched lengths are a caller bug and return an error.
pub fn linear_trend_xy(xs: &[f64], ys: &[f64]) -> Result<LinearTrend, AppError> {
    if xs.len() != ys.len() {
        return Err(AppError::length_mismatch("linear_trend_xy", xs.len(), ys.len()));
    }
    Ok(trend_from_points(xs, ys))
}

/// Fit a trend over `(x, y)` pairs.
pub fn linear_trend_pairs(points: &[(f64, f64)]) -> LinearTrend {
    let (xs, ys): (Vec<f64>, Vec<f64>) = points.iter().copied().unzip();
    trend_from_points(&xs, &ys)
}

fn trend_from_points(xs: &[f64], ys: &[f64]) -> LinearTrend {
    let n = ys.len();
    let level = mean(ys);
    let Some(fit) = fit_line(xs, ys) else {
        return LinearTrend::flat(level, n);
    };

    let r_squared = fit.r_squared();
    let p_value = slope_p_value(fit.slope, fit.slope_std_err(), n);
    let significant = p_value < SIGNIFICANCE_ALPHA && r_squared >= MIN_R_SQUARED;

    LinearTrend {
        slope: fit.slope,
        intercept: fit.intercept,
        r_squared,
        p_value,
        direction: classify_direction(fit.slope, level),
        significant,
        n,
    }
}

fn slope_p_value(slope: f64, std_err: Option<f64>, n: usize) -> f64 {
    let Some(se) = std_err else {
        return 1.0;
    };
    if se == 0.0 {
        // Perfect fit: any non-zero slope is infinitely significant.
        return if slope == 0.0 { 1.0 } else { 0.0 };
    }
    let Ok(dist) = StudentsT::new(0.0, 1.0, (n - 2) as f64) else {
        return 1.0;
    };
    let t = (slope / se).abs();
    (2.0 * (1.0 - dist.cdf(t))).clamp(0.0, 1.0)
}

/// Classify a slope relative to the series level.
///
/// With a zero mean there is no scale to compare against, so only the sign of a
/// non-zero slope is used.
pub fn classify_direction(slope: f64, level: f64) -> TrendDirection {
    let relative = if level != 0.0 {
        slope / level.abs()
    } else {
        slope
    };
    if relative > DIRECTION_THRESHOLD {
        TrendDirection::Increasing
    } else if relative < -DIRECTION_THRESHOLD {
        TrendDirection::Decreasing
    } else {
        TrendDirection::Stable
    }
}
