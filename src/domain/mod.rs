//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - input configuration enums (`MetricKind`, `ReconstructionMethod`, `BootstrapStatistic`)
//! - lineage and observation inputs (`LineageEvent`, `RawObservation`, `YearData`)
//! - analytical outputs (`HarmonizedPoint`, `PeriodStats`, `ImpactResult`, etc.)

pub mod types;

pub use types::*;
