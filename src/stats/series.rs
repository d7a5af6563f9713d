//! Ad-hoc analysis of a flat `(years, values)` series outside any split context.

use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::stats::descriptive::{cagr_from_series, coefficient_of_variation, mean, percentile};
use crate::stats::outliers::{DEFAULT_IQR_K, DEFAULT_Z_THRESHOLD, iqr_outliers, zscore_outliers};
use crate::stats::trend::{LinearTrend, linear_trend_xy};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesSummary {
    pub n_observations: usize,
    pub first_year: Option<i32>,
    pub last_year: Option<i32>,
    pub mean: f64,
    pub median: f64,
    pub cv: f64,
    pub cagr: f64,
    pub trend: LinearTrend,
    /// Years flagged by the IQR fence.
    pub iqr_outlier_years: Vec<i32>,
    /// Years flagged by the z-score rule.
    pub zscore_outlier_years: Vec<i32>,
}

/// Summarize a series given as parallel year/value lists.
///
/// Pairs are sorted by year first so CAGR and trend read in time order.
pub fn summarize_series(years: &[i32], values: &[f64]) -> Result<SeriesSummary, AppError> {
    if years.len() != values.len() {
        return Err(AppError::length_mismatch("summarize_series", years.len(), values.len()));
    }

    let mut pairs: Vec<(i32, f64)> = years.iter().copied().zip(values.iter().copied()).collect();
    pairs.sort_by_key(|&(year, _)| year);

    let sorted_years: Vec<i32> = pairs.iter().map(|&(y, _)| y).collect();
    let sorted_values: Vec<f64> = pairs.iter().map(|&(_, v)| v).collect();
    let xs: Vec<f64> = sorted_years.iter().map(|&y| f64::from(y)).collect();

    let trend = linear_trend_xy(&xs, &sorted_values)?;
    let to_years = |idx: Vec<usize>| idx.into_iter().map(|i| sorted_years[i]).collect::<Vec<_>>();

    Ok(SeriesSummary {
        n_observations: sorted_values.len(),
        first_year: sorted_years.first().copied(),
        last_year: sorted_years.last().copied(),
        mean: mean(&sorted_values),
        median: percentile(&sorted_values, 50.0),
        cv: coefficient_of_variation(&sorted_values),
        cagr: cagr_from_series(&sorted_values),
        trend,
        iqr_outlier_years: to_years(iqr_outliers(&sorted_values, DEFAULT_IQR_K)),
        zscore_outlier_years: to_years(zscore_outliers(&sorted_values, DEFAULT_Z_THRESHOLD)),
    })
}
