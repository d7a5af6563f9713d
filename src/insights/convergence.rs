//! Convergence: are children becoming more alike after the split?
//!
//! For each post-split year we take the CV across children with a positive value
//! (years with fewer than 2 such children are skipped), then fit a trend of CV
//! against year. A significant slope below `-0.5` CV points/year is converging,
//! above `+0.5` diverging, anything else stable.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::insights::InsightStatus;
use crate::stats::{coefficient_of_variation, linear_trend_pairs};

pub const CONVERGENCE_SLOPE_THRESHOLD: f64 = 0.5;
pub const MIN_CONVERGENCE_YEARS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConvergenceTrend {
    Converging,
    Diverging,
    Stable,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct YearlyCv {
    pub year: i32,
    pub cv: f64,
    pub n_children: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Convergence {
    pub status: InsightStatus,
    pub trend: ConvergenceTrend,
    /// Change in CV (percentage points) per year.
    pub slope: f64,
    pub r_squared: f64,
    pub p_value: f64,
    pub significant: bool,
    pub yearly_cv: Vec<YearlyCv>,
    pub interpretation: String,
}

/// Classify convergence from `year → child → value` for post-split years.
pub fn convergence_trend(post_values: &BTreeMap<i32, BTreeMap<String, f64>>) -> Convergence {
    let yearly_cv: Vec<YearlyCv> = post_values
        .iter()
        .filter_map(|(&year, children)| {
            let positive: Vec<f64> = children.values().copied().filter(|v| v.is_finite() && *v > 0.0).collect();
            if positive.len() < 2 {
                return None;
            }
            Some(YearlyCv {
                year,
                cv: coefficient_of_variation(&positive),
                n_children: positive.len(),
            })
        })
        .collect();

    if yearly_cv.len() < MIN_CONVERGENCE_YEARS {
        return Convergence {
            status: InsightStatus::InsufficientData,
            trend: ConvergenceTrend::Stable,
            slope: 0.0,
            r_squared: 0.0,
            p_value: 1.0,
            significant: false,
            interpretation: format!(
                "Insufficient data: {} qualifying year(s), at least {MIN_CONVERGENCE_YEARS} needed.",
                yearly_cv.len()
            ),
            yearly_cv,
        };
    }

    let points: Vec<(f64, f64)> = yearly_cv.iter().map(|y| (f64::from(y.year), y.cv)).collect();
    let trend = linear_trend_pairs(&points);

    let classified = if trend.significant && trend.slope < -CONVERGENCE_SLOPE_THRESHOLD {
        ConvergenceTrend::Converging
    } else if trend.significant && trend.slope > CONVERGENCE_SLOPE_THRESHOLD {
        ConvergenceTrend::Diverging
    } else {
        ConvergenceTrend::Stable
    };

    let interpretation = match classified {
        ConvergenceTrend::Converging => format!(
            "Children are converging: CV falls {:.2} points/year.",
            -trend.slope
        ),
        ConvergenceTrend::Diverging => format!(
            "Children are diverging: CV rises {:.2} points/year.",
            trend.slope
        ),
        ConvergenceTrend::Stable => format!(
            "No clear convergence or divergence (slope {:+.2} points/year, p={:.3}).",
            trend.slope, trend.p_value
        ),
    };

    Convergence {
        status: InsightStatus::Ok,
        trend: classified,
        slope: trend.slope,
        r_squared: trend.r_squared,
        p_value: trend.p_value,
        significant: trend.significant,
        yearly_cv,
        interpretation,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn panel(rows: &[(i32, &[(&str, f64)])]) -> BTreeMap<i32, BTreeMap<String, f64>> {
        rows.iter()
            .map(|(year, kids)| (*year, kids.iter().map(|(k, v)| (k.to_string(), *v)).collect()))
            .collect()
    }

    #[test]
    fn narrowing_gap_converges() {
        let data = panel(&[
            (2012, &[("A", 100.0), ("B", 200.0)]),
            (2013, &[("A", 110.0), ("B", 190.0)]),
            (2014, &[("A", 120.0), ("B", 180.0)]),
            (2015, &[("A", 130.0), ("B", 170.0)]),
            (2016, &[("A", 140.0), ("B", 160.0)]),
        ]);
        let c = convergence_trend(&data);
        assert_eq!(c.status, InsightStatus::Ok);
        assert_eq!(c.trend, ConvergenceTrend::Converging, "{c:?}");
        assert!(c.slope < -CONVERGENCE_SLOPE_THRESHOLD);
    }

    #[test]
    fn widening_gap_diverges() {
        let data = panel(&[
            (2012, &[("A", 150.0), ("B", 150.0)]),
            (2013, &[("A", 140.0), ("B", 160.0)]),
            (2014, &[("A", 130.0), ("B", 170.0)]),
            (2015, &[("A", 120.0), ("B", 180.0)]),
        ]);
        assert_eq!(convergence_trend(&data).trend, ConvergenceTrend::Diverging);
    }

    #[test]
    fn skips_years_with_one_positive_child() {
        let data = panel(&[
            (2012, &[("A", 100.0), ("B", 0.0)]),
            (2013, &[("A", 100.0), ("B", 120.0)]),
            (2014, &[("A", 100.0), ("B", 120.0)]),
        ]);
        let c = convergence_trend(&data);
        assert_eq!(c.status, InsightStatus::InsufficientData);
        assert_eq!(c.yearly_cv.len(), 2);
    }

    #[test]
    fn constant_gap_is_stable() {
        let data = panel(&[
            (2012, &[("A", 100.0), ("B", 120.0)]),
            (2013, &[("A", 100.0), ("B", 120.0)]),
            (2014, &[("A", 100.0), ("B", 120.0)]),
        ]);
        let c = convergence_trend(&data);
        assert_eq!(c.status, InsightStatus::Ok);
        assert_eq!(c.trend, ConvergenceTrend::Stable);
    }
}
