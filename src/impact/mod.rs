//! Pre/post comparison of a harmonized series.
//!
//! The analyzer is a single-shot pure computation: it partitions a timeline at
//! the event year, summarizes each side, and compares the means. It never draws
//! random numbers; uncertainty is attached afterwards by the caller.

use std::collections::BTreeSet;

use crate::domain::{HarmonizationMethod, HarmonizedPoint, ImpactResult, ImpactStats, PeriodStats};
use crate::stats::{cagr_from_series, coefficient_of_variation, mean, variance};

/// Split timeline values into `(pre, post)` at `split_year` (post is inclusive).
pub fn partition(timeline: &[HarmonizedPoint], split_year: i32) -> (Vec<f64>, Vec<f64>) {
    let pre = timeline.iter().filter(|p| p.year < split_year).map(|p| p.value).collect();
    let post = timeline.iter().filter(|p| p.year >= split_year).map(|p| p.value).collect();
    (pre, post)
}

/// Summarize one segment; an empty segment gives all-zero stats.
pub fn period_stats(values: &[f64]) -> PeriodStats {
    if values.is_empty() {
        return PeriodStats::empty();
    }
    PeriodStats {
        mean: mean(values),
        variance: variance(values),
        cv: coefficient_of_variation(values),
        cagr: cagr_from_series(values),
        n_observations: values.len(),
    }
}

/// Compare two periods' means.
///
/// When the pre-period mean is zero the percentage saturates: `0` if the post
/// mean is also zero, otherwise `100`.
pub fn compute_impact(pre: &PeriodStats, post: &PeriodStats) -> ImpactStats {
    let absolute_change = post.mean - pre.mean;
    let pct_change = if pre.mean != 0.0 {
        absolute_change / pre.mean * 100.0
    } else if post.mean == 0.0 {
        0.0
    } else {
        100.0
    };

    ImpactStats {
        absolute_change,
        pct_change,
        uncertainty: None,
    }
}

/// Analyze a timeline around `split_year`.
///
/// Short partitions and a post segment mixing raw with reconstructed points are
/// reported as warnings, never as errors.
pub fn analyze(timeline: &[HarmonizedPoint], split_year: i32, min_observations: usize) -> ImpactResult {
    let (pre, post) = partition(timeline, split_year);
    let pre_stats = period_stats(&pre);
    let post_stats = period_stats(&post);

    let mut warnings = Vec::new();
    if pre.len() < min_observations {
        warnings.push(format!(
            "Pre-split period has {} observation(s); at least {min_observations} recommended.",
            pre.len()
        ));
    }
    if post.len() < min_observations {
        warnings.push(format!(
            "Post-split period has {} observation(s); at least {min_observations} recommended.",
            post.len()
        ));
    }

    let post_methods: BTreeSet<&'static str> = timeline
        .iter()
        .filter(|p| p.year >= split_year)
        .map(|p| p.method.label())
        .collect();
    let has_raw = post_methods.contains(HarmonizationMethod::Raw.label());
    if has_raw && post_methods.len() > 1 {
        let listed: Vec<&str> = post_methods.into_iter().collect();
        warnings.push(format!(
            "Post-split period mixes raw and reconstructed values ({}); reconstruction quality is inconsistent.",
            listed.join(", ")
        ));
    }

    for w in &warnings {
        tracing::warn!(split_year, "{w}");
    }

    ImpactResult {
        impact: compute_impact(&pre_stats, &post_stats),
        pre_stats,
        post_stats,
        warnings,
    }
}
