//! Boundary harmonization.
//!
//! Responsibilities:
//!
//! - gate lineage descriptions on their coverage ratios (`coverage`, `lineage`)
//! - rebuild a parent-equivalent series from children (`reconstruct`)
//! - join parent and reconstructed series at the event year (`merge`)

pub mod coverage;
pub mod lineage;
pub mod merge;
pub mod reconstruct;

pub use coverage::*;
pub use lineage::*;
pub use merge::*;
pub use reconstruct::*;

use crate::domain::{EventKind, HarmonizedPoint, LineageEvent, MetricKind, ReconstructionMethod, YearData};
use crate::error::AppError;

/// Run the full harmonization for one lineage event.
///
/// validate → parent series → child reconstruction → merge at `event_year`.
/// A rename carries the successor's own values through untransformed.
pub fn harmonize_event(
    data: &YearData,
    event: &LineageEvent,
    metric: MetricKind,
    method: ReconstructionMethod,
    tolerance: f64,
) -> Result<Vec<HarmonizedPoint>, AppError> {
    validate_lineage(event, tolerance)?;

    let pre = get_parent_series(data, &event.parent_id, metric);
    let post = match event.kind {
        EventKind::Rename => get_parent_series(data, &event.child_ids[0], metric),
        EventKind::Split | EventKind::Merge => reconstruct_parent_from_children(
            data,
            &event.child_ids,
            metric,
            event.coverage_ratios.as_ref(),
            method,
        ),
    };

    let timeline = merge_series(&pre, &post, event.event_year);
    tracing::debug!(
        parent = %event.parent_id,
        metric = metric.label(),
        pre_points = pre.len(),
        post_points = post.len(),
        merged = timeline.len(),
        "harmonized lineage event"
    );

    Ok(timeline)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{HarmonizationMethod, MetricValues};

    fn yield_only(area: f64, y: f64) -> MetricValues {
        MetricValues {
            area: Some(area),
            production: Some(area * y),
            yield_: Some(y),
        }
    }

    #[test]
    fn harmonize_split_joins_raw_and_reconstructed() {
        let mut data = YearData::new();
        for (year, y) in [(2010, 1000.0), (2011, 1100.0)] {
            data.entry(year).or_default().insert("P".to_string(), yield_only(30.0, y));
        }
        for year in [2012, 2013] {
            let row = data.entry(year).or_default();
            row.insert("P".to_string(), yield_only(10.0, 900.0));
            row.insert("C".to_string(), yield_only(20.0, 1200.0));
        }
        let event = LineageEvent {
            parent_id: "P".to_string(),
            child_ids: vec!["P".to_string(), "C".to_string()],
            event_year: 2012,
            kind: EventKind::Split,
            coverage_ratios: None,
        };

        let timeline =
            harmonize_event(&data, &event, MetricKind::Yield, ReconstructionMethod::AreaWeighted, 0.05).unwrap();
        assert_eq!(timeline.len(), 4);
        assert!(timeline[..2].iter().all(|p| p.method == HarmonizationMethod::Raw));
        assert!(timeline[2..].iter().all(|p| p.method == HarmonizationMethod::AreaWeighted));
        assert!((timeline[2].value - 1100.0).abs() < 1e-9);
    }

    #[test]
    fn harmonize_rename_keeps_raw_values() {
        let mut data = YearData::new();
        data.entry(2000).or_default().insert("Old".to_string(), yield_only(5.0, 10.0));
        data.entry(2001).or_default().insert("New".to_string(), yield_only(5.0, 12.0));
        let event = LineageEvent {
            parent_id: "Old".to_string(),
            child_ids: vec!["New".to_string()],
            event_year: 2001,
            kind: EventKind::Rename,
            coverage_ratios: None,
        };
        let timeline =
            harmonize_event(&data, &event, MetricKind::Area, ReconstructionMethod::AreaWeighted, 0.05).unwrap();
        assert_eq!(timeline.len(), 2);
        assert!(timeline.iter().all(|p| p.method == HarmonizationMethod::Raw));
    }

    #[test]
    fn harmonize_rejects_invalid_ratios() {
        let event = LineageEvent {
            parent_id: "P".to_string(),
            child_ids: vec!["A".to_string(), "B".to_string()],
            event_year: 2012,
            kind: EventKind::Split,
            coverage_ratios: Some([("A".to_string(), 0.2), ("B".to_string(), 0.2)].into()),
        };
        let err = harmonize_event(&YearData::new(), &event, MetricKind::Area, ReconstructionMethod::AreaWeighted, 0.05)
            .unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}
