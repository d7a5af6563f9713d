//! Command-line parsing for the boundary impact analyzer.
//!
//! Argument parsing and command dispatch stay separate from the analytical
//! code; `app::analysis_config_from_args` turns these structs into an
//! [`crate::domain::AnalysisConfig`].

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

use crate::domain::{
    BootstrapStatistic, DEFAULT_COVERAGE_TOLERANCE, DEFAULT_MIN_OBSERVATIONS, MetricKind, ReconstructionMethod,
};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "bimpact",
    version,
    about = "Harmonize district time series across boundary changes and measure split impact"
)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace). `RUST_LOG` takes precedence.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Build the harmonized parent timeline and print/export it.
    Harmonize(RunArgs),
    /// Timeline + pre/post impact with a bootstrap interval.
    Impact(RunArgs),
    /// Impact plus split diagnostics (divergence, convergence, effect size, counterfactual).
    Insights(RunArgs),
    /// Summarize a flat series: trend, CAGR, outliers.
    Trend(TrendArgs),
    /// Run the full pipeline on a generated split scenario.
    Demo(DemoArgs),
}

/// Inputs for commands that work on files.
#[derive(Debug, Args, Clone)]
pub struct InputArgs {
    /// Observations CSV (`region_id,year,area,production,yield`).
    #[arg(long, value_name = "CSV")]
    pub data: PathBuf,

    /// Lineage JSON describing the boundary event.
    #[arg(long, value_name = "JSON")]
    pub lineage: PathBuf,
}

#[derive(Debug, Args, Clone)]
pub struct RunArgs {
    #[command(flatten)]
    pub input: InputArgs,

    #[command(flatten)]
    pub analysis: AnalysisArgs,
}

/// Analysis knobs shared by every pipeline command.
#[derive(Debug, Args, Clone)]
pub struct AnalysisArgs {
    /// Metric to harmonize.
    #[arg(short, long, value_enum, default_value_t = MetricKind::Yield)]
    pub metric: MetricKind,

    /// How children are combined for yield.
    #[arg(long, value_enum, default_value_t = ReconstructionMethod::AreaWeighted)]
    pub method: ReconstructionMethod,

    /// Allowed deviation of coverage ratios from 1.0.
    #[arg(long, default_value_t = DEFAULT_COVERAGE_TOLERANCE)]
    pub coverage_tolerance: f64,

    /// Minimum observations per period before a warning is raised.
    #[arg(long, default_value_t = DEFAULT_MIN_OBSERVATIONS)]
    pub min_observations: usize,

    /// Bootstrap resamples.
    #[arg(long, default_value_t = 1000)]
    pub iterations: usize,

    /// Confidence level of the bootstrap interval.
    #[arg(long, default_value_t = 0.95)]
    pub confidence: f64,

    /// Statistic computed on each resample.
    #[arg(long, value_enum, default_value_t = BootstrapStatistic::Mean)]
    pub statistic: BootstrapStatistic,

    /// Random seed for the bootstrap.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Skip the bootstrap interval.
    #[arg(long)]
    pub no_bootstrap: bool,

    /// Dataset version recorded in provenance.
    #[arg(long, env = "BOUNDARY_DATASET_VERSION", default_value = "unversioned")]
    pub dataset_version: String,

    /// Export the harmonized timeline to CSV.
    #[arg(long = "export-timeline", value_name = "CSV")]
    pub export_timeline: Option<PathBuf>,

    /// Export the full report (with provenance) to JSON.
    #[arg(long = "export-report", value_name = "JSON")]
    pub export_report: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct TrendArgs {
    /// Series JSON `{ "years": [...], "values": [...] }`.
    #[arg(long, value_name = "JSON", conflicts_with = "values")]
    pub series: Option<PathBuf>,

    /// Comma-separated values, one per consecutive year.
    #[arg(long, value_delimiter = ',', requires = "start_year")]
    pub values: Vec<f64>,

    /// First year for `--values`.
    #[arg(long)]
    pub start_year: Option<i32>,
}

#[derive(Debug, Args, Clone)]
pub struct DemoArgs {
    /// Number of child regions.
    #[arg(long, default_value_t = 3)]
    pub children: usize,

    /// First year in which the children exist.
    #[arg(long, default_value_t = 2012)]
    pub event_year: i32,

    #[arg(long, default_value_t = 5)]
    pub pre_years: usize,

    #[arg(long, default_value_t = 5)]
    pub post_years: usize,

    /// Yield change per year in the generated series.
    #[arg(long, default_value_t = 15.0, allow_negative_numbers = true)]
    pub yield_trend: f64,

    /// Relative noise standard deviation.
    #[arg(long, default_value_t = 0.03)]
    pub noise: f64,

    /// Seed for scenario generation.
    #[arg(long, default_value_t = 7)]
    pub scenario_seed: u64,

    #[command(flatten)]
    pub analysis: AnalysisArgs,
}
