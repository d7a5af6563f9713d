//! Lineage description checks.

use std::collections::BTreeSet;

use crate::domain::{EventKind, LineageEvent, Region};
use crate::error::AppError;
use crate::harmonize::coverage::check_coverage_ratios;

/// Reject lineage descriptions that cannot be harmonized.
///
/// A split whose coverage ratios omit a child or fail the sum check is
/// rejected, never normalized. Ratios are optional; absent ratios pass.
pub fn validate_lineage(event: &LineageEvent, tolerance: f64) -> Result<(), AppError> {
    if event.parent_id.trim().is_empty() {
        return Err(AppError::invalid_input("Lineage event has an empty parent id."));
    }
    if event.child_ids.is_empty() {
        return Err(AppError::invalid_input(format!(
            "Lineage event for '{}' has no child regions.",
            event.parent_id
        )));
    }

    let unique: BTreeSet<&str> = event.child_ids.iter().map(String::as_str).collect();
    if unique.len() != event.child_ids.len() {
        return Err(AppError::invalid_input(format!(
            "Lineage event for '{}' lists a child region more than once.",
            event.parent_id
        )));
    }

    if event.kind == EventKind::Rename && event.child_ids.len() != 1 {
        return Err(AppError::invalid_input(format!(
            "Rename of '{}' must have exactly one successor, got {}.",
            event.parent_id,
            event.child_ids.len()
        )));
    }

    let Some(ratios) = &event.coverage_ratios else {
        return Ok(());
    };

    if let Some(unknown) = ratios.keys().find(|id| !unique.contains(id.as_str())) {
        return Err(AppError::invalid_input(format!(
            "Coverage ratio given for '{unknown}', which is not a child of '{}'.",
            event.parent_id
        )));
    }

    if event.kind == EventKind::Split {
        if let Some(missing) = event.child_ids.iter().find(|id| !ratios.contains_key(id.as_str())) {
            tracing::warn!(parent = %event.parent_id, child = %missing, "rejecting lineage: partial coverage map");
            return Err(AppError::invalid_input(format!(
                "Coverage ratios for split of '{}' omit child '{missing}'.",
                event.parent_id
            )));
        }
        let check = check_coverage_ratios(ratios, tolerance);
        if !check.valid {
            let reason = check.reason.unwrap_or_default();
            tracing::warn!(parent = %event.parent_id, sum = check.sum, "rejecting lineage: {reason}");
            return Err(AppError::invalid_input(format!(
                "Invalid coverage ratios for split of '{}': {reason}",
                event.parent_id
            )));
        }
    }

    Ok(())
}

/// Non-fatal warnings about region validity around the event year.
pub fn region_validity_warnings(event: &LineageEvent, regions: &[Region]) -> Vec<String> {
    let mut warnings = Vec::new();
    let year = event.event_year;

    let find = |id: &str| regions.iter().find(|r| r.id == id);

    if let Some(parent) = find(&event.parent_id) {
        if !parent.is_active(year - 1) {
            warnings.push(format!(
                "Parent '{}' was not active in {} (the year before the event).",
                parent.id,
                year - 1
            ));
        }
    }

    for child_id in &event.child_ids {
        match find(child_id) {
            Some(child) if !child.is_active(year) => warnings.push(format!(
                "Child '{}' is not active in event year {year}.",
                child.id
            )),
            Some(_) => {}
            None if !regions.is_empty() => {
                warnings.push(format!("Child '{child_id}' is missing from the region registry."))
            }
            None => {}
        }
    }

    warnings
}
