//! Formatted terminal output.
//!
//! Formatting lives here so the analytical modules stay free of presentation
//! concerns and output changes are localized.

use crate::domain::{HarmonizedPoint, ImpactResult, MetricKind, Provenance};
use crate::insights::{Efficiency, SplitInsights};
use crate::io::ingest::RowError;
use crate::stats::SeriesSummary;

pub fn format_header(parent_id: &str, event_year: i32, metric: MetricKind, provenance: &Provenance) -> String {
    let mut out = String::new();
    out.push_str("=== bimpact - boundary harmonization ===\n");
    out.push_str(&format!("Parent: {parent_id} | event year: {event_year} | metric: {}\n", metric.label()));
    out.push_str(&format!(
        "Dataset: {} | method: {} ({}) | query: {}\n",
        provenance.dataset_version,
        provenance.harmonization_method.label(),
        provenance
            .harmonization_methods
            .iter()
            .map(|m| m.label())
            .collect::<Vec<_>>()
            .join(", "),
        provenance.query_hash
    ));
    if provenance.requested_method.label() != provenance.harmonization_method.label() {
        out.push_str(&format!("Requested weighting: {}\n", provenance.requested_method.label()));
    }
    out.push_str(&format!("Generated: {}\n", provenance.generated_at.format("%Y-%m-%d %H:%M:%S UTC")));
    out
}

/// Timeline table: one row per year.
pub fn format_timeline(timeline: &[HarmonizedPoint]) -> String {
    let mut out = String::new();
    out.push_str("Timeline:\n");
    push_line(
        &mut out,
        format!("{:<6} {:>14} {:<14} {:>8} {:<30}", "year", "value", "method", "part.", "regions"),
    );
    push_line(&mut out, format!("{:-<6} {:-<14} {:-<14} {:-<8} {:-<30}", "", "", "", "", ""));
    for p in timeline {
        push_line(
            &mut out,
            format!(
                "{:<6} {:>14.2} {:<14} {:>8.3} {:<30}",
                p.year,
                p.value,
                p.method.label(),
                p.participation,
                truncate(&p.contributing_regions.join(","), 30)
            ),
        );
    }
    out
}

pub fn format_impact(result: &ImpactResult) -> String {
    let mut out = String::new();
    out.push_str("\nImpact:\n");
    for (label, stats) in [("pre ", &result.pre_stats), ("post", &result.post_stats)] {
        out.push_str(&format!(
            "- {label}: n={:<3} mean={:.2} cv={:.2}% cagr={:.2}%\n",
            stats.n_observations, stats.mean, stats.cv, stats.cagr
        ));
    }
    out.push_str(&format!(
        "- change: {:+.2} ({:+.2}%)\n",
        result.impact.absolute_change, result.impact.pct_change
    ));
    if let Some(ci) = &result.impact.uncertainty {
        out.push_str(&format!(
            "- {:.0}% CI of change: [{:.2}, {:.2}] ({:?})\n",
            ci.confidence * 100.0,
            ci.lower,
            ci.upper,
            ci.method
        ));
    }
    out.push_str(&format_warnings(&result.warnings));
    out
}

pub fn format_insights(insights: &SplitInsights) -> String {
    let mut out = String::new();
    out.push_str("\nSplit insights:\n");
    out.push_str(&format!(
        "- fragmentation: {:.3} | {}\n",
        insights.fragmentation.index, insights.fragmentation.interpretation
    ));
    out.push_str(&format!("- divergence: {}\n", insights.divergence.interpretation));
    out.push_str(&format!("- convergence: {}\n", insights.convergence.interpretation));
    out.push_str(&format!("- effect size: {}\n", insights.effect_size.interpretation));
    out.push_str(&format!("- counterfactual: {}\n", insights.counterfactual.interpretation));

    if !insights.children.is_empty() {
        out.push_str("\nChildren (post-split):\n");
        push_line(
            &mut out,
            format!(
                "{:<4} {:<20} {:>4} {:>12} {:>8} {:<10} {:>8} {:>8}",
                "rank", "region", "n", "mean", "cagr%", "trend", "vs avg%", "vs bench"
            ),
        );
        push_line(
            &mut out,
            format!("{:-<4} {:-<20} {:-<4} {:-<12} {:-<8} {:-<10} {:-<8} {:-<8}", "", "", "", "", "", "", "", ""),
        );
        for c in &insights.children {
            let rank = c.rank.map(|r| r.to_string()).unwrap_or_else(|| "-".to_string());
            let bench = match &c.efficiency {
                Efficiency::Ratio { ratio, .. } => format!("{ratio:.3}"),
                Efficiency::NotApplicable { .. } => "n/a".to_string(),
            };
            push_line(
                &mut out,
                format!(
                    "{:<4} {:<20} {:>4} {:>12.2} {:>8.2} {:<10} {:>8.1} {:>8}",
                    rank,
                    truncate(&c.region_id, 20),
                    c.n_observations,
                    c.mean,
                    c.cagr,
                    c.trend.label(),
                    c.relative_to_average_pct,
                    bench
                ),
            );
        }
    }

    out.push_str(&format_warnings(&insights.warnings));
    out
}

pub fn format_series_summary(summary: &SeriesSummary) -> String {
    let mut out = String::new();
    let span = match (summary.first_year, summary.last_year) {
        (Some(a), Some(b)) => format!("{a}-{b}"),
        _ => "-".to_string(),
    };
    out.push_str(&format!("Series: n={} | years {span}\n", summary.n_observations));
    out.push_str(&format!(
        "- mean={:.2} median={:.2} cv={:.2}% cagr={:.2}%\n",
        summary.mean, summary.median, summary.cv, summary.cagr
    ));
    out.push_str(&format!(
        "- trend: {} (slope {:+.4}/yr, r2={:.3}, p={:.4}{})\n",
        summary.trend.direction.label(),
        summary.trend.slope,
        summary.trend.r_squared,
        summary.trend.p_value,
        if summary.trend.significant { ", significant" } else { "" }
    ));
    out.push_str(&format!("- IQR outliers: {}\n", fmt_years(&summary.iqr_outlier_years)));
    out.push_str(&format!("- z-score outliers: {}\n", fmt_years(&summary.zscore_outlier_years)));
    out
}

/// Skipped-row summary; empty when nothing was skipped.
pub fn format_row_errors(errors: &[RowError], max_rows: usize) -> String {
    if errors.is_empty() {
        return String::new();
    }
    let mut out = format!("Skipped {} row(s):\n", errors.len());
    for e in errors.iter().take(max_rows) {
        let region = e.region_id.as_deref().unwrap_or("?");
        out.push_str(&format!("  line {} ({region}): {}\n", e.line, e.message));
    }
    if errors.len() > max_rows {
        out.push_str(&format!("  ... and {} more\n", errors.len() - max_rows));
    }
    out
}

fn format_warnings(warnings: &[String]) -> String {
    let mut out = String::new();
    for w in warnings {
        out.push_str(&format!("  ! {w}\n"));
    }
    out
}

fn push_line(out: &mut String, line: String) {
    out.push_str(line.trim_end());
    out.push('\n');
}

fn fmt_years(years: &[i32]) -> String {
    if years.is_empty() {
        return "none".to_string();
    }
    let parts: Vec<String> = years.iter().map(i32::to_string).collect();
    parts.join(", ")
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('.');
    out
}
