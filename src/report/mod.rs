//! Reporting: the serializable analysis envelope and terminal formatting.

use serde::{Deserialize, Serialize};

use crate::domain::{AnalysisConfig, HarmonizedPoint, ImpactResult, Provenance};
use crate::insights::SplitInsights;

pub mod format;

pub use format::*;

/// Everything one run produced, wrapped in provenance. This is the JSON
/// export schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub provenance: Provenance,
    pub config: AnalysisConfig,
    pub parent_id: String,
    pub event_year: i32,
    pub timeline: Vec<HarmonizedPoint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub impact: Option<ImpactResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insights: Option<SplitInsights>,
    /// Non-fatal notes gathered along the way (skipped rows, region validity).
    #[serde(default)]
    pub notes: Vec<String>,
}
