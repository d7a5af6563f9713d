//! `boundary-impact` library crate.
//!
//! Harmonizes district-level agricultural series across boundary changes
//! (splits, merges, renames) and measures what the change did to the metric.
//!
//! The binary (`bimpact`) is a thin wrapper around this library so that:
//!
//! - core logic is testable without spawning processes
//! - the analytical modules stay free of I/O and presentation

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod harmonize;
pub mod impact;
pub mod insights;
pub mod io;
pub mod math;
pub mod report;
pub mod stats;
pub mod uncertainty;
