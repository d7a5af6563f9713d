//! Input/output helpers.
//!
//! - observations CSV + lineage/series JSON ingest (`ingest`)
//! - timeline CSV and report JSON exports (`export`)

pub mod export;
pub mod ingest;

pub use export::*;
pub use ingest::*;
