//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - created and consumed within a single analytical call
//! - exported to JSON/CSV verbatim
//! - handed to a presentation layer without conversion

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Default tolerance around 1.0 for coverage ratio sums (±5%).
pub const DEFAULT_COVERAGE_TOLERANCE: f64 = 0.05;

/// Default minimum observations per side before the impact analyzer warns.
pub const DEFAULT_MIN_OBSERVATIONS: usize = 3;

/// Which agricultural metric is being analyzed.
///
/// The extensive/intensive split decides how child regions are combined, so
/// every consumer matches on this enum instead of comparing strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    Area,
    Production,
    Yield,
}

impl MetricKind {
    /// Extensive quantities sum across sub-regions; intensive ones are averaged.
    pub fn is_extensive(self) -> bool {
        match self {
            MetricKind::Area | MetricKind::Production => true,
            MetricKind::Yield => false,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            MetricKind::Area => "area",
            MetricKind::Production => "production",
            MetricKind::Yield => "yield",
        }
    }
}

/// Kind of boundary change recorded by a lineage edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Split,
    Merge,
    Rename,
}

/// Provenance tag attached to every harmonized point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HarmonizationMethod {
    /// Taken directly from one region, untransformed.
    Raw,
    /// Extensive quantity summed across children.
    Sum,
    /// Intensive quantity averaged across children with area (or coverage) weights.
    AreaWeighted,
    /// Unweighted average, used when no weights are available.
    EqualSplit,
}

impl HarmonizationMethod {
    pub fn label(self) -> &'static str {
        match self {
            HarmonizationMethod::Raw => "raw",
            HarmonizationMethod::Sum => "sum",
            HarmonizationMethod::AreaWeighted => "area_weighted",
            HarmonizationMethod::EqualSplit => "equal_split",
        }
    }

    pub fn is_raw(self) -> bool {
        matches!(self, HarmonizationMethod::Raw)
    }
}

/// How children are combined when an intensive metric is reconstructed.
///
/// Extensive metrics are always summed; this only changes the weights used
/// for yield.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ReconstructionMethod {
    /// Weight each child by its own reported area that year.
    AreaWeighted,
    /// Weight each child by the lineage coverage ratio (falls back to equal split
    /// when ratios are missing or invalid).
    CoverageWeighted,
    /// Plain unweighted mean across contributing children.
    EqualSplit,
}

impl ReconstructionMethod {
    pub fn label(self) -> &'static str {
        match self {
            ReconstructionMethod::AreaWeighted => "area_weighted",
            ReconstructionMethod::CoverageWeighted => "coverage_weighted",
            ReconstructionMethod::EqualSplit => "equal_split",
        }
    }
}

/// A versioned administrative region, owned by an external registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub id: String,
    pub name: String,
    /// Parent political unit (state) name.
    #[serde(default)]
    pub state: Option<String>,
    pub created_year: i32,
    #[serde(default)]
    pub abolished_year: Option<i32>,
}

impl Region {
    /// Whether the region existed during `year` (abolition year is exclusive).
    pub fn is_active(&self, year: i32) -> bool {
        year >= self.created_year && self.abolished_year.is_none_or(|end| year < end)
    }
}

/// A directed lineage edge: one parent, one or more children.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineageEvent {
    pub parent_id: String,
    pub child_ids: Vec<String>,
    /// First year in which the children exist as separate regions.
    #[serde(alias = "split_year")]
    pub event_year: i32,
    #[serde(default = "default_event_kind")]
    pub kind: EventKind,
    /// Fraction of the parent attributed to each child (keyed by child id).
    #[serde(default)]
    pub coverage_ratios: Option<BTreeMap<String, f64>>,
}

fn default_event_kind() -> EventKind {
    EventKind::Split
}

/// An immutable observation supplied by the data repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawObservation {
    pub region_id: String,
    pub year: i32,
    pub metric: MetricKind,
    pub value: f64,
}

/// All metrics reported by one region for one year.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricValues {
    pub area: Option<f64>,
    pub production: Option<f64>,
    #[serde(rename = "yield")]
    pub yield_: Option<f64>,
}

impl MetricValues {
    pub fn get(&self, metric: MetricKind) -> Option<f64> {
        match metric {
            MetricKind::Area => self.area,
            MetricKind::Production => self.production,
            MetricKind::Yield => self.yield_,
        }
    }

    pub fn set(&mut self, metric: MetricKind, value: f64) {
        match metric {
            MetricKind::Area => self.area = Some(value),
            MetricKind::Production => self.production = Some(value),
            MetricKind::Yield => self.yield_ = Some(value),
        }
    }

    /// Area, only when it is strictly positive.
    pub fn positive_area(&self) -> Option<f64> {
        self.area.filter(|a| a.is_finite() && *a > 0.0)
    }
}

/// `year → region_id → metrics`, ordered by year.
pub type YearData = BTreeMap<i32, BTreeMap<String, MetricValues>>;

/// Pivot flat observations into [`YearData`]. Later duplicates overwrite earlier ones.
pub fn pivot_observations(observations: &[RawObservation]) -> YearData {
    let mut data = YearData::new();
    for obs in observations {
        data.entry(obs.year)
            .or_default()
            .entry(obs.region_id.clone())
            .or_default()
            .set(obs.metric, obs.value);
    }
    data
}

/// One point of a harmonized series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HarmonizedPoint {
    pub year: i32,
    pub value: f64,
    pub method: HarmonizationMethod,
    pub contributing_regions: Vec<String>,
    /// Share of expected children that reported data this year.
    ///
    /// This is a participation count ratio, not an area share.
    pub participation: f64,
}

/// Summary of one contiguous segment (pre- or post-split) of a series.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PeriodStats {
    pub mean: f64,
    /// Population variance.
    pub variance: f64,
    /// Coefficient of variation in percent.
    pub cv: f64,
    /// Compound annual growth rate in percent.
    pub cagr: f64,
    pub n_observations: usize,
}

impl PeriodStats {
    pub fn empty() -> Self {
        Self::default()
    }
}

/// Label describing how an uncertainty interval was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UncertaintyMethod {
    BootstrapPercentile,
    /// Not enough values to resample; both bounds equal the point value.
    InsufficientData,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UncertaintyBounds {
    pub lower: f64,
    pub upper: f64,
    pub method: UncertaintyMethod,
    pub confidence: f64,
}

impl UncertaintyBounds {
    pub fn contains(&self, value: f64) -> bool {
        self.lower <= value && value <= self.upper
    }

    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }
}

/// Comparison of two periods.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImpactStats {
    pub absolute_change: f64,
    pub pct_change: f64,
    pub uncertainty: Option<UncertaintyBounds>,
}

/// Output of the impact analyzer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImpactResult {
    pub pre_stats: PeriodStats,
    pub post_stats: PeriodStats,
    pub impact: ImpactStats,
    pub warnings: Vec<String>,
}

/// Statistic evaluated on each bootstrap resample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BootstrapStatistic {
    Mean,
    Median,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BootstrapConfig {
    pub iterations: usize,
    pub confidence: f64,
    pub statistic: BootstrapStatistic,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            iterations: 1000,
            confidence: 0.95,
            statistic: BootstrapStatistic::Mean,
        }
    }
}

/// A full run's analytical configuration.
///
/// This is derived from CLI flags (plus defaults).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    pub metric: MetricKind,
    pub coverage_tolerance: f64,
    pub min_observations: usize,
    pub reconstruction: ReconstructionMethod,
    pub bootstrap: BootstrapConfig,
    /// Seed for the bootstrap random source.
    pub seed: u64,
    /// Opaque dataset version string carried into provenance.
    pub dataset_version: String,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            metric: MetricKind::Yield,
            coverage_tolerance: DEFAULT_COVERAGE_TOLERANCE,
            min_observations: DEFAULT_MIN_OBSERVATIONS,
            reconstruction: ReconstructionMethod::AreaWeighted,
            bootstrap: BootstrapConfig::default(),
            seed: 42,
            dataset_version: "unversioned".to_string(),
        }
    }
}

/// Reproducibility envelope wrapped around exported results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provenance {
    pub dataset_version: String,
    /// Hex digest of the query parameters.
    pub query_hash: String,
    pub generated_at: DateTime<Utc>,
    /// Most frequent tag on the post-event points (`raw` without any).
    pub harmonization_method: HarmonizationMethod,
    /// Every distinct tag applied from the event year on, in enum order.
    pub harmonization_methods: Vec<HarmonizationMethod>,
    /// Intensive weighting asked for on the command line.
    pub requested_method: ReconstructionMethod,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metric_kind_extensive_split() {
        assert!(MetricKind::Area.is_extensive());
        assert!(MetricKind::Production.is_extensive());
        assert!(!MetricKind::Yield.is_extensive());
    }

    #[test]
    fn region_activity_window() {
        let region = Region {
            id: "R1".to_string(),
            name: "Bastar".to_string(),
            state: Some("Chhattisgarh".to_string()),
            created_year: 1950,
            abolished_year: Some(2012),
        };
        assert!(!region.is_active(1949));
        assert!(region.is_active(1950));
        assert!(region.is_active(2011));
        assert!(!region.is_active(2012));
    }

    #[test]
    fn pivot_groups_by_year_and_region() {
        let obs = vec![
            RawObservation {
                region_id: "A".to_string(),
                year: 2001,
                metric: MetricKind::Area,
                value: 10.0,
            },
            RawObservation {
                region_id: "A".to_string(),
                year: 2001,
                metric: MetricKind::Yield,
                value: 150.0,
            },
            RawObservation {
                region_id: "B".to_string(),
                year: 2000,
                metric: MetricKind::Production,
                value: 7.0,
            },
        ];
        let data = pivot_observations(&obs);
        assert_eq!(data.keys().copied().collect::<Vec<_>>(), vec![2000, 2001]);
        let a = data[&2001]["A"];
        assert_eq!(a.area, Some(10.0));
        assert_eq!(a.yield_, Some(150.0));
        assert_eq!(a.production, None);
        assert_eq!(data[&2000]["B"].get(MetricKind::Production), Some(7.0));
    }

    #[test]
    fn harmonization_method_serializes_snake_case() {
        let json = serde_json::to_string(&HarmonizationMethod::AreaWeighted).unwrap();
        assert_eq!(json, "\"area_weighted\"");
        let json = serde_json::to_string(&UncertaintyMethod::InsufficientData).unwrap();
        assert_eq!(json, "\"insufficient_data\"");
    }

    #[test]
    fn lineage_event_accepts_split_year_alias() {
        let json = r#"{"parent_id":"P","child_ids":["A","B"],"split_year":2012}"#;
        let event: LineageEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.event_year, 2012);
        assert_eq!(event.kind, EventKind::Split);
        assert!(event.coverage_ratios.is_none());
    }
}
