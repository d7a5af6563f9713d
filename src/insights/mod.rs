//! Split diagnostics built on top of a harmonized timeline and its impact:
//! how fragmented the split was, how far the children drifted apart, whether
//! they are converging, the standardized effect size, and a trend-based
//! counterfactual.
//!
//! Every diagnostic reports an [`InsightStatus`] instead of failing, so a thin
//! dataset still produces a complete (if mostly degraded) [`SplitInsights`].

pub mod convergence;
pub mod counterfactual;
pub mod divergence;
pub mod effect_size;
pub mod fragmentation;
pub mod performance;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::{HarmonizedPoint, ImpactResult, LineageEvent, MetricKind, YearData};
use crate::error::AppError;
use crate::impact::partition;

pub use convergence::*;
pub use counterfactual::*;
pub use divergence::*;
pub use effect_size::*;
pub use fragmentation::*;
pub use performance::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightStatus {
    Ok,
    InsufficientData,
    NoChildren,
}

/// Everything the analyzer needs besides the timeline and impact.
#[derive(Debug, Clone, Copy)]
pub struct SplitInput<'a> {
    pub data: &'a YearData,
    pub event: &'a LineageEvent,
    pub metric: MetricKind,
    /// Optional reference population for [`benchmark_efficiency`]; may be empty.
    pub benchmark: &'a [f64],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitInsights {
    pub parent_id: String,
    pub event_year: i32,
    pub metric: MetricKind,
    pub fragmentation: Fragmentation,
    pub divergence: Divergence,
    pub convergence: Convergence,
    pub effect_size: EffectSize,
    pub counterfactual: Counterfactual,
    pub children: Vec<ChildPerformance>,
    pub warnings: Vec<String>,
}

/// Post-split `(year, value)` pairs per child, keeping only finite positive
/// values. Children with no such values are absent from the map.
pub fn child_post_series(
    data: &YearData,
    event: &LineageEvent,
    metric: MetricKind,
) -> BTreeMap<String, Vec<(i32, f64)>> {
    let mut out: BTreeMap<String, Vec<(i32, f64)>> = BTreeMap::new();
    for (&year, regions) in data.range(event.event_year..) {
        for child in &event.child_ids {
            let Some(value) = regions.get(child).and_then(|m| m.get(metric)) else {
                continue;
            };
            if value.is_finite() && value > 0.0 {
                out.entry(child.clone()).or_default().push((year, value));
            }
        }
    }
    out
}

pub fn analyze_split(
    input: &SplitInput<'_>,
    timeline: &[HarmonizedPoint],
    impact: &ImpactResult,
) -> Result<SplitInsights, AppError> {
    let event = input.event;
    let series = child_post_series(input.data, event, input.metric);

    let fragmentation = fragmentation_index(event.child_ids.len());

    let child_values: BTreeMap<String, Vec<f64>> = event
        .child_ids
        .iter()
        .map(|id| {
            let values = series.get(id).map(|s| s.iter().map(|&(_, v)| v).collect()).unwrap_or_default();
            (id.clone(), values)
        })
        .collect();
    let divergence = divergence_score(&child_values);

    let mut by_year: BTreeMap<i32, BTreeMap<String, f64>> = BTreeMap::new();
    for (id, points) in &series {
        for &(year, value) in points {
            by_year.entry(year).or_default().insert(id.clone(), value);
        }
    }
    let convergence = convergence_trend(&by_year);

    let (pre, post) = partition(timeline, event.event_year);
    let effect_size = effect_size(&pre, &post);

    let pre_years: Vec<i32> = timeline.iter().filter(|p| p.year < event.event_year).map(|p| p.year).collect();
    let counterfactual = counterfactual_projection(&pre_years, &pre, &post, projection_year(timeline, event.event_year))?;

    let mut children = children_performance(input.data, event, input.metric);
    for child in children.iter_mut().filter(|c| c.status == InsightStatus::Ok) {
        child.efficiency = benchmark_efficiency(child.mean, input.benchmark);
    }

    let mut warnings = impact.warnings.clone();
    let degraded = [
        ("fragmentation", fragmentation.status, &fragmentation.interpretation),
        ("divergence", divergence.status, &divergence.interpretation),
        ("convergence", convergence.status, &convergence.interpretation),
        ("effect size", effect_size.status, &effect_size.interpretation),
        ("counterfactual", counterfactual.status, &counterfactual.interpretation),
    ];
    for (name, status, interpretation) in degraded {
        if status != InsightStatus::Ok {
            tracing::debug!(diagnostic = name, ?status, "degraded split diagnostic");
            warnings.push(format!("{name}: {interpretation}"));
        }
    }

    Ok(SplitInsights {
        parent_id: event.parent_id.clone(),
        event_year: event.event_year,
        metric: input.metric,
        fragmentation,
        divergence,
        convergence,
        effect_size,
        counterfactual,
        children,
        warnings,
    })
}

/// Midpoint of the post-split years (rounded), or the event year without any.
fn projection_year(timeline: &[HarmonizedPoint], event_year: i32) -> i32 {
    let post: Vec<f64> = timeline.iter().filter(|p| p.year >= event_year).map(|p| f64::from(p.year)).collect();
    if post.is_empty() {
        return event_year;
    }
    (post.iter().sum::<f64>() / post.len() as f64).round() as i32
}
