//! Shared analysis pipeline used by every front-end command.
//!
//! lineage checks -> harmonize -> impact -> bootstrap -> insights -> provenance
//!
//! Commands differ only in how far down this chain they go and how they
//! present the resulting [`AnalysisReport`].

use std::collections::BTreeMap;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use chrono::Utc;
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::domain::{AnalysisConfig, HarmonizationMethod, HarmonizedPoint, LineageEvent, Provenance, Region, YearData};
use crate::error::AppError;
use crate::harmonize::{harmonize_event, region_validity_warnings};
use crate::impact::{analyze, partition};
use crate::insights::{SplitInput, analyze_split};
use crate::report::AnalysisReport;
use crate::uncertainty::bootstrap_impact_uncertainty;

/// How far a run goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Harmonize,
    Impact,
    Insights,
}

/// Everything loaded before analysis starts.
#[derive(Debug, Clone)]
pub struct PipelineInput {
    pub data: YearData,
    pub event: LineageEvent,
    pub regions: Vec<Region>,
    pub benchmark: Vec<f64>,
    /// Notes from loading (e.g. skipped CSV rows) carried into the report.
    pub notes: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    pub stage: Stage,
    pub bootstrap: bool,
}

pub fn run_analysis(input: &PipelineInput, config: &AnalysisConfig, options: RunOptions) -> Result<AnalysisReport, AppError> {
    validate_config(config)?;
    let event = &input.event;

    let mut notes = input.notes.clone();
    for warning in region_validity_warnings(event, &input.regions) {
        tracing::warn!("{warning}");
        notes.push(warning);
    }

    let timeline = harmonize_event(
        &input.data,
        event,
        config.metric,
        config.reconstruction,
        config.coverage_tolerance,
    )?;
    if timeline.is_empty() {
        return Err(AppError::new(
            3,
            format!(
                "No {} values found for '{}' or its successors.",
                config.metric.label(),
                event.parent_id
            ),
        ));
    }
    tracing::info!(points = timeline.len(), "built harmonized timeline");

    let mut impact = None;
    let mut insights = None;

    if options.stage >= Stage::Impact {
        let mut result = analyze(&timeline, event.event_year, config.min_observations);
        if options.bootstrap {
            let (pre, post) = partition(&timeline, event.event_year);
            let mut rng = StdRng::seed_from_u64(config.seed);
            let bounds = bootstrap_impact_uncertainty(&pre, &post, &config.bootstrap, &mut rng);
            tracing::info!(
                lower = bounds.lower,
                upper = bounds.upper,
                iterations = config.bootstrap.iterations,
                "bootstrap interval"
            );
            result.impact.uncertainty = Some(bounds);
        }

        if options.stage >= Stage::Insights {
            let split_input = SplitInput {
                data: &input.data,
                event,
                metric: config.metric,
                benchmark: &input.benchmark,
            };
            insights = Some(analyze_split(&split_input, &timeline, &result)?);
        }
        impact = Some(result);
    }

    Ok(AnalysisReport {
        provenance: build_provenance(config, event, &timeline),
        config: config.clone(),
        parent_id: event.parent_id.clone(),
        event_year: event.event_year,
        timeline,
        impact,
        insights,
        notes,
    })
}

pub fn validate_config(config: &AnalysisConfig) -> Result<(), AppError> {
    if !(config.coverage_tolerance.is_finite() && config.coverage_tolerance >= 0.0) {
        return Err(AppError::invalid_input("Coverage tolerance must be a non-negative number."));
    }
    let confidence = config.bootstrap.confidence;
    if !(confidence > 0.0 && confidence < 1.0) {
        return Err(AppError::invalid_input(format!(
            "Confidence must be strictly between 0 and 1, got {confidence}."
        )));
    }
    if config.bootstrap.iterations == 0 {
        return Err(AppError::invalid_input("Bootstrap iterations must be > 0."));
    }
    Ok(())
}

/// Record what was actually applied to the post-event segment of `timeline`.
///
/// Extensive metrics are summed and renames stay raw whatever intensive
/// method was requested, so the tags come from the points themselves.
pub fn build_provenance(config: &AnalysisConfig, event: &LineageEvent, timeline: &[HarmonizedPoint]) -> Provenance {
    let mut counts: BTreeMap<HarmonizationMethod, usize> = BTreeMap::new();
    for p in timeline.iter().filter(|p| p.year >= event.event_year) {
        *counts.entry(p.method).or_default() += 1;
    }
    // Ties go to the earlier variant.
    let dominant = counts
        .iter()
        .fold(None, |best: Option<(HarmonizationMethod, usize)>, (&m, &n)| match best {
            Some((_, top)) if top >= n => best,
            _ => Some((m, n)),
        })
        .map_or(HarmonizationMethod::Raw, |(m, _)| m);

    Provenance {
        dataset_version: config.dataset_version.clone(),
        query_hash: query_hash(config, event),
        generated_at: Utc::now(),
        harmonization_method: dominant,
        harmonization_methods: counts.into_keys().collect(),
        requested_method: config.reconstruction,
    }
}

/// Stable digest of every parameter that influences the result.
pub fn query_hash(config: &AnalysisConfig, event: &LineageEvent) -> String {
    let mut hasher = DefaultHasher::new();
    config.dataset_version.hash(&mut hasher);
    config.metric.hash(&mut hasher);
    config.reconstruction.hash(&mut hasher);
    config.coverage_tolerance.to_bits().hash(&mut hasher);
    config.min_observations.hash(&mut hasher);
    config.bootstrap.iterations.hash(&mut hasher);
    config.bootstrap.confidence.to_bits().hash(&mut hasher);
    config.bootstrap.statistic.hash(&mut hasher);
    config.seed.hash(&mut hasher);

    event.parent_id.hash(&mut hasher);
    event.kind.hash(&mut hasher);
    event.child_ids.hash(&mut hasher);
    event.event_year.hash(&mut hasher);
    if let Some(ratios) = &event.coverage_ratios {
        for (id, ratio) in ratios {
            id.hash(&mut hasher);
            ratio.to_bits().hash(&mut hasher);
        }
    }
    format!("{:016x}", hasher.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{ScenarioParams, generate_split_scenario};
    use crate::domain::{UncertaintyMethod, pivot_observations};

    fn demo_input() -> PipelineInput {
        let scenario = generate_split_scenario(&ScenarioParams::default()).unwrap();
        PipelineInput {
            data: pivot_observations(&scenario.observations),
            event: scenario.event,
            regions: scenario.regions,
            benchmark: Vec::new(),
            notes: Vec::new(),
        }
    }

    #[test]
    fn stages_fill_the_report_progressively() {
        let input = demo_input();
        let config = AnalysisConfig::default();

        let harmonized = run_analysis(
            &input,
            &config,
            RunOptions {
                stage: Stage::Harmonize,
                bootstrap: false,
            },
        )
        .unwrap();
        assert_eq!(harmonized.timeline.len(), 10);
        assert!(harmonized.impact.is_none());
        assert!(harmonized.notes.is_empty(), "{:?}", harmonized.notes);

        let full = run_analysis(
            &input,
            &config,
            RunOptions {
                stage: Stage::Insights,
                bootstrap: true,
            },
        )
        .unwrap();
        let impact = full.impact.as_ref().unwrap();
        let ci = impact.impact.uncertainty.unwrap();
        assert_eq!(ci.method, UncertaintyMethod::BootstrapPercentile);
        assert!(ci.lower <= ci.upper);
        assert_eq!(full.insights.as_ref().unwrap().children.len(), 3);
    }

    #[test]
    fn bootstrap_is_reproducible_for_a_seed() {
        let input = demo_input();
        let config = AnalysisConfig::default();
        let options = RunOptions {
            stage: Stage::Impact,
            bootstrap: true,
        };
        let a = run_analysis(&input, &config, options).unwrap();
        let b = run_analysis(&input, &config, options).unwrap();
        assert_eq!(
            a.impact.unwrap().impact.uncertainty,
            b.impact.unwrap().impact.uncertainty
        );
    }

    #[test]
    fn query_hash_tracks_parameters() {
        let input = demo_input();
        let config = AnalysisConfig::default();
        let other = AnalysisConfig {
            seed: 1,
            ..AnalysisConfig::default()
        };
        assert_eq!(query_hash(&config, &input.event), query_hash(&config, &input.event));
        assert_ne!(query_hash(&config, &input.event), query_hash(&other, &input.event));
        assert_eq!(query_hash(&config, &input.event).len(), 16);

        let mut merged = input.event.clone();
        merged.kind = crate::domain::EventKind::Merge;
        assert_ne!(query_hash(&config, &input.event), query_hash(&config, &merged));
    }

    #[test]
    fn provenance_reports_applied_methods() {
        let input = demo_input();
        let config = AnalysisConfig {
            metric: crate::domain::MetricKind::Production,
            ..AnalysisConfig::default()
        };
        let options = RunOptions {
            stage: Stage::Harmonize,
            bootstrap: false,
        };
        let report = run_analysis(&input, &config, options).unwrap();
        assert_eq!(report.provenance.harmonization_method, HarmonizationMethod::Sum);
        assert_eq!(report.provenance.harmonization_methods, vec![HarmonizationMethod::Sum]);
        assert_eq!(report.provenance.requested_method, config.reconstruction);

        let point = |year, method| HarmonizedPoint {
            year,
            value: 1.0,
            method,
            contributing_regions: Vec::new(),
            participation: 1.0,
        };
        let event_year = input.event.event_year;
        let timeline = vec![
            point(event_year - 1, HarmonizationMethod::Raw),
            point(event_year, HarmonizationMethod::EqualSplit),
            point(event_year + 1, HarmonizationMethod::AreaWeighted),
            point(event_year + 2, HarmonizationMethod::AreaWeighted),
        ];
        let provenance = build_provenance(&config, &input.event, &timeline);
        assert_eq!(provenance.harmonization_method, HarmonizationMethod::AreaWeighted);
        assert_eq!(
            provenance.harmonization_methods,
            vec![HarmonizationMethod::AreaWeighted, HarmonizationMethod::EqualSplit]
        );
        assert_eq!(build_provenance(&config, &input.event, &timeline[..1]).harmonization_method, HarmonizationMethod::Raw);
    }

    #[test]
    fn missing_metric_is_insufficient_data() {
        let mut input = demo_input();
        input.data = YearData::new();
        let err = run_analysis(
            &input,
            &AnalysisConfig::default(),
            RunOptions {
                stage: Stage::Harmonize,
                bootstrap: false,
            },
        )
        .unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn rejects_bad_confidence() {
        let mut config = AnalysisConfig::default();
        config.bootstrap.confidence = 1.0;
        assert_eq!(validate_config(&config).unwrap_err().exit_code(), 2);
    }
}
