//! Coverage ratio validation.
//!
//! This is the only gate that can reject a lineage description. Ratios that
//! do not sum to ~1.0 are reported as invalid; they are never rescaled.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Detailed result of a coverage ratio check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverageCheck {
    pub sum: f64,
    pub tolerance: f64,
    pub valid: bool,
    /// Why the check failed (`None` when valid).
    pub reason: Option<String>,
}

/// Check that ratios are non-empty, finite, non-negative and sum to `1 ± tolerance`.
pub fn check_coverage_ratios(ratios: &BTreeMap<String, f64>, tolerance: f64) -> CoverageCheck {
    let sum: f64 = ratios.values().sum();
    let reject = |reason: String| CoverageCheck {
        sum,
        tolerance,
        valid: false,
        reason: Some(reason),
    };

    if ratios.is_empty() {
        return reject("no coverage ratios supplied".to_string());
    }
    if let Some((id, r)) = ratios.iter().find(|(_, r)| !r.is_finite() || **r < 0.0) {
        return reject(format!("ratio for '{id}' is not a non-negative number ({r})"));
    }
    if (sum - 1.0).abs() > tolerance {
        return reject(format!(
            "ratios sum to {sum:.4}, outside 1.0 ± {tolerance:.4}"
        ));
    }

    CoverageCheck {
        sum,
        tolerance,
        valid: true,
        reason: None,
    }
}

/// `true` iff the ratios are non-empty and sum to 1.0 within `tolerance`.
pub fn validate_coverage_ratios(ratios: &BTreeMap<String, f64>, tolerance: f64) -> bool {
    check_coverage_ratios(ratios, tolerance).valid
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DEFAULT_COVERAGE_TOLERANCE;

    fn ratios(pairs: &[(&str, f64)]) -> BTreeMap<String, f64> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn accepts_sum_within_tolerance() {
        let r = ratios(&[("A", 0.5), ("B", 0.3), ("C", 0.22)]);
        assert!(validate_coverage_ratios(&r, DEFAULT_COVERAGE_TOLERANCE));
        let r = ratios(&[("A", 0.48), ("B", 0.48)]);
        assert!(validate_coverage_ratios(&r, DEFAULT_COVERAGE_TOLERANCE));
    }

    #[test]
    fn rejects_sum_outside_tolerance() {
        let r = ratios(&[("A", 0.5), ("B", 0.3)]);
        let check = check_coverage_ratios(&r, DEFAULT_COVERAGE_TOLERANCE);
        assert!(!check.valid);
        assert!((check.sum - 0.8).abs() < 1e-12);
        assert!(check.reason.unwrap().contains("0.8000"));
    }

    #[test]
    fn rejects_empty_and_negative() {
        assert!(!validate_coverage_ratios(&BTreeMap::new(), 0.05));
        let r = ratios(&[("A", 1.2), ("B", -0.2)]);
        assert!(!validate_coverage_ratios(&r, 0.05));
    }

    #[test]
    fn tolerance_is_configurable() {
        let r = ratios(&[("A", 0.6), ("B", 0.5)]);
        assert!(!validate_coverage_ratios(&r, 0.05));
        assert!(validate_coverage_ratios(&r, 0.15));
    }
}
