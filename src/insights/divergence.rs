//! Divergence of child regions after a split.
//!
//! Measured as the coefficient of variation across each child's mean value,
//! together with the best/worst performer and their spread. Higher metric
//! values are treated as better performance.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::insights::InsightStatus;
use crate::stats::{coefficient_of_variation, mean};

/// CV (percent) at or above which divergence reads as moderate / high.
const MODERATE_CV: f64 = 10.0;
const HIGH_CV: f64 = 25.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Performer {
    pub region_id: String,
    pub mean: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Divergence {
    pub status: InsightStatus,
    pub n_children: usize,
    /// CV of child means, in percent.
    pub cv: f64,
    pub best: Option<Performer>,
    pub worst: Option<Performer>,
    /// `best.mean - worst.mean`.
    pub spread: f64,
    /// Spread as a percentage of the mean of child means.
    pub spread_pct: f64,
    pub interpretation: String,
}

/// Compute divergence from per-child value series.
///
/// Children without any values are ignored; at least two must remain.
pub fn divergence_score(child_values: &BTreeMap<String, Vec<f64>>) -> Divergence {
    let means: Vec<(&String, f64)> = child_values
        .iter()
        .filter(|(_, v)| !v.is_empty())
        .map(|(id, v)| (id, mean(v)))
        .collect();

    if means.len() < 2 {
        let status = if child_values.is_empty() {
            InsightStatus::NoChildren
        } else {
            InsightStatus::InsufficientData
        };
        return Divergence {
            status,
            n_children: means.len(),
            cv: 0.0,
            best: None,
            worst: None,
            spread: 0.0,
            spread_pct: 0.0,
            interpretation: "Insufficient data: divergence needs at least two children with data.".to_string(),
        };
    }

    let values: Vec<f64> = means.iter().map(|&(_, m)| m).collect();
    let cv = coefficient_of_variation(&values);
    let overall = mean(&values);

    // Strict comparisons keep the first child (by id) on ties.
    let mut best = means[0];
    let mut worst = means[0];
    for &(id, m) in &means[1..] {
        if m > best.1 {
            best = (id, m);
        }
        if m < worst.1 {
            worst = (id, m);
        }
    }

    let spread = best.1 - worst.1;
    let spread_pct = if overall != 0.0 { spread / overall.abs() * 100.0 } else { 0.0 };

    let band = if cv >= HIGH_CV {
        "High divergence"
    } else if cv >= MODERATE_CV {
        "Moderate divergence"
    } else {
        "Low divergence"
    };

    Divergence {
        status: InsightStatus::Ok,
        n_children: means.len(),
        cv,
        interpretation: format!(
            "{band} across {} children (CV {cv:.1}%); best '{}' leads worst '{}' by {spread:.2} ({spread_pct:.1}%).",
            means.len(),
            best.0,
            worst.0
        ),
        best: Some(Performer {
            region_id: best.0.clone(),
            mean: best.1,
        }),
        worst: Some(Performer {
            region_id: worst.0.clone(),
            mean: worst.1,
        }),
        spread,
        spread_pct,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(pairs: &[(&str, &[f64])]) -> BTreeMap<String, Vec<f64>> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_vec())).collect()
    }

    #[test]
    fn identifies_best_and_worst() {
        let data = series(&[
            ("Bastar", &[1100.0, 1100.0]),
            ("Kanker", &[1400.0, 1400.0]),
            ("Dantewada", &[1250.0]),
        ]);
        let d = divergence_score(&data);
        assert_eq!(d.status, InsightStatus::Ok);
        assert!(d.cv > 0.0);
        assert_eq!(d.best.as_ref().unwrap().region_id, "Kanker");
        assert_eq!(d.worst.as_ref().unwrap().region_id, "Bastar");
        assert!((d.spread - 300.0).abs() < 1e-9);
        assert!((d.spread_pct - 24.0).abs() < 1e-9);
    }

    #[test]
    fn needs_two_children_with_data() {
        let data = series(&[("A", &[1.0]), ("B", &[])]);
        let d = divergence_score(&data);
        assert_eq!(d.status, InsightStatus::InsufficientData);
        assert!(d.interpretation.starts_with("Insufficient data"));
        assert_eq!(divergence_score(&BTreeMap::new()).status, InsightStatus::NoChildren);
    }

    #[test]
    fn identical_children_do_not_diverge() {
        let data = series(&[("A", &[5.0]), ("B", &[5.0])]);
        let d = divergence_score(&data);
        assert_eq!(d.cv, 0.0);
        assert_eq!(d.spread, 0.0);
        assert!(d.interpretation.starts_with("Low divergence"));
    }
}
