//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and initializes logging
//! - parses CLI arguments
//! - loads observations and lineage
//! - runs the analysis pipeline
//! - prints reports and writes optional exports

use std::path::Path;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{AnalysisArgs, Command, DemoArgs, RunArgs, TrendArgs};
use crate::domain::{AnalysisConfig, BootstrapConfig, pivot_observations};
use crate::error::AppError;
use crate::report::AnalysisReport;

pub mod pipeline;

use pipeline::{PipelineInput, RunOptions, Stage};

/// Entry point for the `bimpact` binary.
pub fn run() -> Result<(), AppError> {
    // A missing `.env` is the normal case.
    let _ = dotenvy::dotenv();

    let cli = crate::cli::Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Harmonize(args) => handle_run(&args, Stage::Harmonize),
        Command::Impact(args) => handle_run(&args, Stage::Impact),
        Command::Insights(args) => handle_run(&args, Stage::Insights),
        Command::Trend(args) => handle_trend(&args),
        Command::Demo(args) => handle_demo(&args),
    }
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    // Ignore a second init (e.g. when embedded in tests).
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn handle_run(args: &RunArgs, stage: Stage) -> Result<(), AppError> {
    let config = analysis_config_from_args(&args.analysis);
    let input = load_pipeline_input(&args.input.data, &args.input.lineage)?;
    let report = pipeline::run_analysis(
        &input,
        &config,
        RunOptions {
            stage,
            bootstrap: !args.analysis.no_bootstrap,
        },
    )?;
    present(&report, &args.analysis)
}

fn handle_demo(args: &DemoArgs) -> Result<(), AppError> {
    let config = analysis_config_from_args(&args.analysis);
    let params = crate::data::ScenarioParams {
        children: args.children,
        event_year: args.event_year,
        pre_years: args.pre_years,
        post_years: args.post_years,
        yield_trend: args.yield_trend,
        noise: args.noise,
        seed: args.scenario_seed,
        ..crate::data::ScenarioParams::default()
    };
    let scenario = crate::data::generate_split_scenario(&params)?;
    let input = PipelineInput {
        data: pivot_observations(&scenario.observations),
        event: scenario.event,
        regions: scenario.regions,
        benchmark: Vec::new(),
        notes: Vec::new(),
    };
    let report = pipeline::run_analysis(
        &input,
        &config,
        RunOptions {
            stage: Stage::Insights,
            bootstrap: !args.analysis.no_bootstrap,
        },
    )?;
    present(&report, &args.analysis)
}

fn handle_trend(args: &TrendArgs) -> Result<(), AppError> {
    let (years, values) = match (&args.series, args.start_year) {
        (Some(path), _) => {
            let series = crate::io::ingest::load_series_json(path)?;
            (series.years, series.values)
        }
        (None, Some(start)) if !args.values.is_empty() => {
            let years: Vec<i32> = (0..args.values.len()).map(|i| start + i as i32).collect();
            (years, args.values.clone())
        }
        _ => {
            return Err(AppError::invalid_input(
                "Provide either `--series <JSON>` or `--values` with `--start-year`.",
            ));
        }
    };

    let summary = crate::stats::summarize_series(&years, &values)?;
    println!("{}", crate::report::format_series_summary(&summary));
    Ok(())
}

fn load_pipeline_input(data_path: &Path, lineage_path: &Path) -> Result<PipelineInput, AppError> {
    let ingest = crate::io::ingest::load_observations_csv(data_path)?;
    let lineage = crate::io::ingest::load_lineage_json(lineage_path)?;

    let skipped = crate::report::format_row_errors(&ingest.row_errors, 10);
    if !skipped.is_empty() {
        eprint!("{skipped}");
    }
    let notes = ingest
        .row_errors
        .iter()
        .map(|e| format!("Skipped CSV line {}: {}", e.line, e.message))
        .collect();

    Ok(PipelineInput {
        data: pivot_observations(&ingest.observations),
        event: lineage.event,
        regions: lineage.regions,
        benchmark: lineage.benchmark,
        notes,
    })
}

fn present(report: &AnalysisReport, args: &AnalysisArgs) -> Result<(), AppError> {
    println!(
        "{}",
        crate::report::format_header(
            &report.parent_id,
            report.event_year,
            report.config.metric,
            &report.provenance
        )
    );
    println!("{}", crate::report::format_timeline(&report.timeline));
    if let Some(impact) = &report.impact {
        println!("{}", crate::report::format_impact(impact));
    }
    if let Some(insights) = &report.insights {
        println!("{}", crate::report::format_insights(insights));
    }

    if let Some(path) = &args.export_timeline {
        crate::io::export::write_timeline_csv(path, &report.timeline)?;
    }
    if let Some(path) = &args.export_report {
        crate::io::export::write_report_json(path, report)?;
    }
    Ok(())
}

pub fn analysis_config_from_args(args: &AnalysisArgs) -> AnalysisConfig {
    AnalysisConfig {
        metric: args.metric,
        coverage_tolerance: args.coverage_tolerance,
        min_observations: args.min_observations,
        reconstruction: args.method,
        bootstrap: BootstrapConfig {
            iterations: args.iterations,
            confidence: args.confidence,
            statistic: args.statistic,
        },
        seed: args.seed,
        dataset_version: args.dataset_version.clone(),
    }
}
