//! Per-year reconstruction of a parent region from its children.
//!
//! Rules per metric kind:
//!
//! - extensive (`area`, `production`): sum over children that report a positive
//!   area and the metric that year → [`HarmonizationMethod::Sum`]
//! - intensive (`yield`): `Σ(yield_i · w_i) / Σ(w_i)` over children with a yield
//!   and a positive weight → [`HarmonizationMethod::AreaWeighted`]; if no child
//!   carries a usable weight, an unweighted mean → [`HarmonizationMethod::EqualSplit`]
//!
//! Years in which no child contributes are skipped, never zero-filled.

use std::collections::BTreeMap;

use crate::domain::{
    HarmonizationMethod, HarmonizedPoint, MetricKind, MetricValues, ReconstructionMethod, YearData,
};

/// Reconstruct the parent series from child observations.
///
/// - `coverage_ratios` is only consulted for [`ReconstructionMethod::CoverageWeighted`]
///   and must already be validated; when absent the intensive rule falls back to
///   an equal split.
/// - `participation` on each point is `contributing children / child_ids.len()`.
pub fn reconstruct_parent_from_children(
    children_data: &YearData,
    child_ids: &[String],
    metric: MetricKind,
    coverage_ratios: Option<&BTreeMap<String, f64>>,
    method: ReconstructionMethod,
) -> Vec<HarmonizedPoint> {
    let mut out = Vec::new();
    if child_ids.is_empty() {
        return out;
    }

    for (&year, regions) in children_data {
        let point = if metric.is_extensive() {
            reconstruct_extensive(year, regions, child_ids, metric)
        } else {
            reconstruct_intensive(year, regions, child_ids, metric, coverage_ratios, method)
        };
        if let Some(point) = point {
            out.push(point);
        }
    }

    out
}

fn reconstruct_extensive(
    year: i32,
    regions: &BTreeMap<String, MetricValues>,
    child_ids: &[String],
    metric: MetricKind,
) -> Option<HarmonizedPoint> {
    let mut total = 0.0;
    let mut contributing = Vec::new();

    for id in child_ids {
        let Some(values) = regions.get(id) else {
            continue;
        };
        if values.positive_area().is_none() {
            continue;
        }
        let Some(v) = values.get(metric).filter(|v| v.is_finite()) else {
            continue;
        };
        total += v;
        contributing.push(id.clone());
    }

    if contributing.is_empty() {
        return None;
    }

    Some(HarmonizedPoint {
        year,
        value: total,
        method: HarmonizationMethod::Sum,
        participation: participation(contributing.len(), child_ids.len()),
        contributing_regions: contributing,
    })
}

fn reconstruct_intensive(
    year: i32,
    regions: &BTreeMap<String, MetricValues>,
    child_ids: &[String],
    metric: MetricKind,
    coverage_ratios: Option<&BTreeMap<String, f64>>,
    method: ReconstructionMethod,
) -> Option<HarmonizedPoint> {
    // (child id, value, weight if usable)
    let mut observed: Vec<(&String, f64, Option<f64>)> = Vec::new();

    for id in child_ids {
        let Some(values) = regions.get(id) else {
            continue;
        };
        let Some(v) = values.get(metric).filter(|v| v.is_finite()) else {
            continue;
        };
        let weight = match method {
            ReconstructionMethod::AreaWeighted => values.positive_area(),
            ReconstructionMethod::CoverageWeighted => coverage_ratios
                .and_then(|r| r.get(id).copied())
                .filter(|w| w.is_finite() && *w > 0.0),
            ReconstructionMethod::EqualSplit => None,
        };
        observed.push((id, v, weight));
    }

    if observed.is_empty() {
        return None;
    }

    let weighted: Vec<(&String, f64, f64)> = observed
        .iter()
        .filter_map(|&(id, v, w)| w.map(|w| (id, v, w)))
        .collect();
    let total_weight: f64 = weighted.iter().map(|&(_, _, w)| w).sum();

    let (value, method_tag, contributing): (f64, HarmonizationMethod, Vec<String>) = if total_weight > 0.0 {
        let numer: f64 = weighted.iter().map(|&(_, v, w)| v * w).sum();
        (
            numer / total_weight,
            HarmonizationMethod::AreaWeighted,
            weighted.iter().map(|&(id, _, _)| id.clone()).collect(),
        )
    } else {
        let sum: f64 = observed.iter().map(|&(_, v, _)| v).sum();
        (
            sum / observed.len() as f64,
            HarmonizationMethod::EqualSplit,
            observed.iter().map(|&(id, _, _)| id.clone()).collect(),
        )
    };

    Some(HarmonizedPoint {
        year,
        value,
        method: method_tag,
        participation: participation(contributing.len(), child_ids.len()),
        contributing_regions: contributing,
    })
}

fn participation(with_data: usize, expected: usize) -> f64 {
    if expected == 0 {
        return 0.0;
    }
    with_data as f64 / expected as f64
}

/// Extract the parent's own series.
///
/// Missing and exactly-zero values are skipped; every point is tagged `raw`
/// with participation `1.0`.
pub fn get_parent_series(parent_data: &YearData, parent_id: &str, metric: MetricKind) -> Vec<HarmonizedPoint> {
    parent_data
        .iter()
        .filter_map(|(&year, regions)| {
            let value = regions.get(parent_id)?.get(metric)?;
            if value == 0.0 || !value.is_finite() {
                return None;
            }
            Some(HarmonizedPoint {
                year,
                value,
                method: HarmonizationMethod::Raw,
                contributing_regions: vec![parent_id.to_string()],
                participation: 1.0,
            })
        })
        .collect()
}
