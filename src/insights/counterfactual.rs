//! "What would have happened without the split": extrapolate the pre-split
//! trend and attribute the gap to the boundary change.

use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::insights::InsightStatus;
use crate::stats::{LinearTrend, linear_trend_xy, mean};

pub const MIN_COUNTERFACTUAL_PRE: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectionMethod {
    /// Last pre-split value extended along a significant trend.
    LinearTrend,
    /// No significant trend; the pre-split mean stands in.
    PreMean,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Counterfactual {
    pub status: InsightStatus,
    pub method: ProjectionMethod,
    pub projection_year: i32,
    pub projected_value: f64,
    /// Mean of the post-split values.
    pub actual_value: f64,
    pub pre_mean: f64,
    pub pre_trend: LinearTrend,
    /// `actual_value - projected_value`.
    pub attributable_change: f64,
    /// Attributable change as a percentage of the pre-split mean.
    pub attribution_pct: f64,
    pub interpretation: String,
}

/// Project the pre-split series to `projection_year` and compare with the
/// observed post-split mean.
///
/// `pre_years` and `pre_values` are parallel; unequal lengths are an error.
/// Too little data yields an `InsufficientData` result, never an error.
pub fn counterfactual_projection(
    pre_years: &[i32],
    pre_values: &[f64],
    post_values: &[f64],
    projection_year: i32,
) -> Result<Counterfactual, AppError> {
    if pre_years.len() != pre_values.len() {
        return Err(AppError::length_mismatch(
            "counterfactual_projection",
            pre_years.len(),
            pre_values.len(),
        ));
    }

    let mut pairs: Vec<(i32, f64)> = pre_years.iter().copied().zip(pre_values.iter().copied()).collect();
    pairs.sort_by_key(|&(year, _)| year);

    let pre_mean = mean(pre_values);
    let xs: Vec<f64> = pairs.iter().map(|&(y, _)| f64::from(y)).collect();
    let ys: Vec<f64> = pairs.iter().map(|&(_, v)| v).collect();
    let pre_trend = linear_trend_xy(&xs, &ys)?;

    let Some(&(last_year, last_value)) = pairs.last().filter(|_| {
        pairs.len() >= MIN_COUNTERFACTUAL_PRE && !post_values.is_empty()
    }) else {
        return Ok(Counterfactual {
            status: InsightStatus::InsufficientData,
            method: ProjectionMethod::PreMean,
            projection_year,
            projected_value: pre_mean,
            actual_value: mean(post_values),
            pre_mean,
            pre_trend,
            attributable_change: 0.0,
            attribution_pct: 0.0,
            interpretation: format!(
                "Insufficient data: projection needs at least {MIN_COUNTERFACTUAL_PRE} pre-split and 1 post-split observation (pre={}, post={}).",
                pairs.len(),
                post_values.len()
            ),
        });
    };

    let (method, projected_value) = if pre_trend.significant {
        let steps = f64::from(projection_year - last_year);
        (ProjectionMethod::LinearTrend, last_value + pre_trend.slope * steps)
    } else {
        (ProjectionMethod::PreMean, pre_mean)
    };

    let actual_value = mean(post_values);
    let attributable_change = actual_value - projected_value;
    let attribution_pct = if pre_mean != 0.0 {
        attributable_change / pre_mean.abs() * 100.0
    } else {
        0.0
    };

    let basis = match method {
        ProjectionMethod::LinearTrend => format!("pre-split trend ({:+.2}/year)", pre_trend.slope),
        ProjectionMethod::PreMean => "pre-split mean (no significant trend)".to_string(),
    };

    Ok(Counterfactual {
        status: InsightStatus::Ok,
        method,
        projection_year,
        projected_value,
        actual_value,
        pre_mean,
        pre_trend,
        attributable_change,
        attribution_pct,
        interpretation: format!(
            "Projected {projected_value:.2} for {projection_year} from the {basis}; observed {actual_value:.2}, \
             so {attribution_pct:+.1}% of the pre-split level is attributable to the split."
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const PRE_YEARS: [i32; 5] = [2007, 2008, 2009, 2010, 2011];
    const PRE_YIELD: [f64; 5] = [1200.0, 1250.0, 1230.0, 1270.0, 1300.0];

    #[test]
    fn significant_trend_is_extrapolated() {
        let c = counterfactual_projection(&PRE_YEARS, &PRE_YIELD, &[1250.0; 5], 2014).unwrap();
        assert_eq!(c.status, InsightStatus::Ok);
        assert_eq!(c.method, ProjectionMethod::LinearTrend);
        assert!((c.projected_value - 1366.0).abs() < 1e-6, "{}", c.projected_value);
        assert!((c.attributable_change + 116.0).abs() < 1e-6);
        assert!((c.attribution_pct + 9.28).abs() < 1e-6);
    }

    #[test]
    fn flat_history_uses_pre_mean() {
        let c = counterfactual_projection(&[2001, 2002, 2003, 2004], &[10.0, 14.0, 9.0, 13.0], &[15.0], 2006).unwrap();
        assert_eq!(c.method, ProjectionMethod::PreMean);
        assert!((c.projected_value - 11.5).abs() < 1e-12);
        assert!((c.attribution_pct - 3.5 / 11.5 * 100.0).abs() < 1e-9);
    }

    #[test]
    fn unordered_years_are_sorted() {
        let years = [2011, 2007, 2009, 2008, 2010];
        let values = [1300.0, 1200.0, 1230.0, 1250.0, 1270.0];
        let c = counterfactual_projection(&years, &values, &[1250.0], 2012).unwrap();
        assert!((c.projected_value - 1322.0).abs() < 1e-6);
    }

    #[test]
    fn insufficient_history_is_marked() {
        let c = counterfactual_projection(&[2010, 2011], &[1.0, 2.0], &[3.0], 2013).unwrap();
        assert_eq!(c.status, InsightStatus::InsufficientData);
        let c = counterfactual_projection(&PRE_YEARS, &PRE_YIELD, &[], 2013).unwrap();
        assert_eq!(c.status, InsightStatus::InsufficientData);
    }

    #[test]
    fn mismatched_inputs_are_rejected() {
        assert!(counterfactual_projection(&[2010], &[1.0, 2.0], &[3.0], 2013).is_err());
    }
}
