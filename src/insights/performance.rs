//! Per-child performance after a split, and comparison against a benchmark
//! population (e.g. the state-level distribution of the same metric).

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::domain::{LineageEvent, MetricKind, YearData};
use crate::insights::{InsightStatus, child_post_series};
use crate::stats::{TrendDirection, cagr_from_series, linear_trend_pairs, mean, percentile_rank};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Efficiency {
    Ratio {
        /// `value / benchmark_mean`.
        ratio: f64,
        benchmark_mean: f64,
        percentile_rank: f64,
    },
    NotApplicable {
        reason: String,
    },
}

impl Efficiency {
    pub fn not_applicable(reason: impl Into<String>) -> Self {
        Self::NotApplicable { reason: reason.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChildPerformance {
    pub region_id: String,
    pub status: InsightStatus,
    pub n_observations: usize,
    pub mean: f64,
    pub cagr: f64,
    pub trend: TrendDirection,
    /// 1 = highest mean; `None` for children without post-split data.
    pub rank: Option<usize>,
    /// Deviation of this child's mean from the mean of child means, in percent.
    pub relative_to_average_pct: f64,
    pub efficiency: Efficiency,
}

/// Rank every child of `event` by its post-split mean of `metric`.
///
/// Output follows the order of `event.child_ids`.
pub fn children_performance(data: &YearData, event: &LineageEvent, metric: MetricKind) -> Vec<ChildPerformance> {
    let series = child_post_series(data, event, metric);

    let mut rows: Vec<ChildPerformance> = event
        .child_ids
        .iter()
        .map(|child| {
            let points = series.get(child).map(Vec::as_slice).unwrap_or_default();
            let values: Vec<f64> = points.iter().map(|&(_, v)| v).collect();
            if values.is_empty() {
                return ChildPerformance {
                    region_id: child.clone(),
                    status: InsightStatus::InsufficientData,
                    n_observations: 0,
                    mean: 0.0,
                    cagr: 0.0,
                    trend: TrendDirection::Stable,
                    rank: None,
                    relative_to_average_pct: 0.0,
                    efficiency: Efficiency::not_applicable("no post-split data"),
                };
            }
            let xy: Vec<(f64, f64)> = points.iter().map(|&(y, v)| (f64::from(y), v)).collect();
            ChildPerformance {
                region_id: child.clone(),
                status: InsightStatus::Ok,
                n_observations: values.len(),
                mean: mean(&values),
                cagr: cagr_from_series(&values),
                trend: linear_trend_pairs(&xy).direction,
                rank: None,
                relative_to_average_pct: 0.0,
                efficiency: Efficiency::not_applicable("no benchmark supplied"),
            }
        })
        .collect();

    let mut ranked: Vec<usize> = (0..rows.len()).filter(|&i| rows[i].n_observations > 0).collect();
    ranked.sort_by(|&a, &b| rows[b].mean.partial_cmp(&rows[a].mean).unwrap_or(Ordering::Equal));

    let means: Vec<f64> = ranked.iter().map(|&i| rows[i].mean).collect();
    let average = mean(&means);
    for (position, &i) in ranked.iter().enumerate() {
        let row = &mut rows[i];
        row.rank = Some(position + 1);
        if average != 0.0 {
            row.relative_to_average_pct = (row.mean - average) / average.abs() * 100.0;
        }
    }

    rows
}

/// Compare `value` against a benchmark population.
pub fn benchmark_efficiency(value: f64, benchmark_values: &[f64]) -> Efficiency {
    let values: Vec<f64> = benchmark_values.iter().copied().filter(|v| v.is_finite()).collect();
    if values.is_empty() {
        return Efficiency::not_applicable("benchmark is empty");
    }
    let benchmark_mean = mean(&values);
    if benchmark_mean == 0.0 {
        return Efficiency::not_applicable("benchmark mean is zero");
    }
    Efficiency::Ratio {
        ratio: value / benchmark_mean,
        benchmark_mean,
        percentile_rank: percentile_rank(value, &values),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{EventKind, MetricValues};

    fn yields(rows: &[(i32, &str, f64)]) -> YearData {
        let mut data = YearData::new();
        for &(year, id, y) in rows {
            data.entry(year).or_default().insert(
                id.to_string(),
                MetricValues {
                    yield_: Some(y),
                    ..MetricValues::default()
                },
            );
        }
        data
    }

    fn event() -> LineageEvent {
        LineageEvent {
            parent_id: "P".into(),
            child_ids: vec!["A".into(), "B".into(), "C".into()],
            event_year: 2012,
            kind: EventKind::Split,
            coverage_ratios: None,
        }
    }

    #[test]
    fn ranks_children_by_post_split_mean() {
        let data = yields(&[
            (2011, "A", 9999.0),
            (2012, "A", 100.0),
            (2013, "A", 110.0),
            (2012, "B", 200.0),
            (2013, "B", 200.0),
        ]);
        let rows = children_performance(&data, &event(), MetricKind::Yield);
        assert_eq!(rows.len(), 3);

        assert_eq!(rows[0].region_id, "A");
        assert_eq!(rows[0].rank, Some(2));
        assert!((rows[0].mean - 105.0).abs() < 1e-12);
        assert!((rows[0].cagr - 10.0).abs() < 1e-9);
        assert_eq!(rows[0].trend, TrendDirection::Increasing);

        assert_eq!(rows[1].rank, Some(1));
        assert_eq!(rows[1].trend, TrendDirection::Stable);
        // average of means = 152.5
        assert!((rows[1].relative_to_average_pct - 47.5 / 152.5 * 100.0).abs() < 1e-9);

        assert_eq!(rows[2].status, InsightStatus::InsufficientData);
        assert_eq!(rows[2].rank, None);
    }

    #[test]
    fn empty_benchmark_is_not_applicable() {
        assert!(matches!(benchmark_efficiency(1.0, &[]), Efficiency::NotApplicable { .. }));
        assert!(matches!(benchmark_efficiency(1.0, &[0.0, 0.0]), Efficiency::NotApplicable { .. }));
    }

    #[test]
    fn benchmark_ratio_and_rank() {
        let Efficiency::Ratio { ratio, benchmark_mean, percentile_rank } = benchmark_efficiency(150.0, &[100.0, 150.0, 200.0])
        else {
            panic!("expected a ratio");
        };
        assert!((benchmark_mean - 150.0).abs() < 1e-12);
        assert!((ratio - 1.0).abs() < 1e-12);
        assert!((percentile_rank - 50.0).abs() < 1e-12);
    }
}
