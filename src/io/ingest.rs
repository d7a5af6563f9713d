//! CSV and JSON ingest.
//!
//! Observations arrive as a wide CSV, one row per `(region, year)`:
//!
//! ```text
//! region_id,year,area,production,yield
//! Bastar,2012,100,110000,1100
//! ```
//!
//! - required columns: `region_id` (or `district`) and `year`
//! - at least one metric column must be present; empty cells are simply absent
//! - bad rows are skipped and reported, never fatal on their own
//!
//! Lineage and flat series inputs are JSON documents read with `serde_json`.

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::StringRecord;
use serde::{Deserialize, Serialize};

use crate::domain::{LineageEvent, MetricKind, RawObservation, Region};
use crate::error::AppError;

const METRIC_COLUMNS: [(&str, MetricKind); 3] = [
    ("area", MetricKind::Area),
    ("production", MetricKind::Production),
    ("yield", MetricKind::Yield),
];

/// A row-level error encountered during ingest.
#[derive(Debug, Clone, PartialEq)]
pub struct RowError {
    pub line: usize,
    pub region_id: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct IngestedObservations {
    pub observations: Vec<RawObservation>,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
    pub rows_used: usize,
}

/// Lineage document: the event plus optional region registry and benchmark.
///
/// A bare [`LineageEvent`] object is accepted as well.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineageInput {
    pub event: LineageEvent,
    #[serde(default)]
    pub regions: Vec<Region>,
    /// Reference values (e.g. state-level yields) for efficiency comparison.
    #[serde(default)]
    pub benchmark: Vec<f64>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LineageDocument {
    Wrapped(LineageInput),
    Bare(LineageEvent),
}

/// Flat `(years, values)` series for ad-hoc trend analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesInput {
    pub years: Vec<i32>,
    pub values: Vec<f64>,
}

pub fn load_observations_csv(path: &Path) -> Result<IngestedObservations, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open CSV '{}': {e}", path.display())))?;
    read_observations(file)
}

/// Parse observations from any CSV source.
pub fn read_observations<R: Read>(source: R) -> Result<IngestedObservations, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(source);

    let headers = reader
        .headers()
        .map_err(|e| AppError::new(2, format!("Failed to read CSV headers: {e}")))?
        .clone();
    let header_map = build_header_map(&headers);
    ensure_required_columns_exist(&header_map)?;

    let mut observations = Vec::new();
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;
    let mut rows_used = 0usize;

    for (idx, result) in reader.records().enumerate() {
        // Header is line 1.
        let line = idx + 2;
        rows_read += 1;

        let record = match result {
            Ok(r) => r,
            Err(e) => {
                row_errors.push(RowError {
                    line,
                    region_id: None,
                    message: format!("CSV parse error: {e}"),
                });
                continue;
            }
        };

        match parse_row(&record, &header_map) {
            Ok(rows) if rows.is_empty() => {}
            Ok(rows) => {
                rows_used += 1;
                observations.extend(rows);
            }
            Err((region_id, message)) => row_errors.push(RowError { line, region_id, message }),
        }
    }

    for err in &row_errors {
        tracing::warn!(line = err.line, region = ?err.region_id, "skipped row: {}", err.message);
    }

    if observations.is_empty() {
        return Err(AppError::new(3, "No valid observations remain after ingest."));
    }

    tracing::info!(rows_read, rows_used, observations = observations.len(), "ingested observations");

    Ok(IngestedObservations {
        observations,
        row_errors,
        rows_read,
        rows_used,
    })
}

pub fn load_lineage_json(path: &Path) -> Result<LineageInput, AppError> {
    let text = read_to_string(path, "lineage JSON")?;
    parse_lineage_json(&text)
}

pub fn parse_lineage_json(text: &str) -> Result<LineageInput, AppError> {
    let doc: LineageDocument =
        serde_json::from_str(text).map_err(|e| AppError::new(2, format!("Invalid lineage JSON: {e}")))?;
    Ok(match doc {
        LineageDocument::Wrapped(input) => input,
        LineageDocument::Bare(event) => LineageInput {
            event,
            regions: Vec::new(),
            benchmark: Vec::new(),
        },
    })
}

pub fn load_series_json(path: &Path) -> Result<SeriesInput, AppError> {
    let text = read_to_string(path, "series JSON")?;
    parse_series_json(&text)
}

pub fn parse_series_json(text: &str) -> Result<SeriesInput, AppError> {
    let series: SeriesInput =
        serde_json::from_str(text).map_err(|e| AppError::new(2, format!("Invalid series JSON: {e}")))?;
    if series.years.len() != series.values.len() {
        return Err(AppError::invalid_input(format!(
            "Series JSON has {} years but {} values.",
            series.years.len(),
            series.values.len()
        )));
    }
    Ok(series)
}

fn read_to_string(path: &Path, what: &str) -> Result<String, AppError> {
    std::fs::read_to_string(path)
        .map_err(|e| AppError::new(2, format!("Failed to open {what} '{}': {e}", path.display())))
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports often prefix the first header with a UTF-8 BOM.
    let name = name.trim().trim_start_matches('\u{feff}').to_ascii_lowercase();
    let name = name.replace([' ', '-'], "_");
    match name.as_str() {
        "district" | "region" => "region_id".to_string(),
        _ => name,
    }
}

fn ensure_required_columns_exist(header_map: &HashMap<String, usize>) -> Result<(), AppError> {
    if !header_map.contains_key("region_id") {
        return Err(AppError::new(2, "Missing required column: `region_id`"));
    }
    if !header_map.contains_key("year") {
        return Err(AppError::new(2, "Missing required column: `year`"));
    }
    if !METRIC_COLUMNS.iter().any(|(name, _)| header_map.contains_key(*name)) {
        return Err(AppError::new(
            2,
            "No metric columns found: expected at least one of `area`, `production`, `yield`.",
        ));
    }
    Ok(())
}

type RowFailure = (Option<String>, String);

fn parse_row(record: &StringRecord, header_map: &HashMap<String, usize>) -> Result<Vec<RawObservation>, RowFailure> {
    let region_id = get_required(record, header_map, "region_id").map_err(|e| (None, e))?.to_string();
    let fail = |message: String| (Some(region_id.clone()), message);

    let year_raw = get_required(record, header_map, "year").map_err(fail)?;
    let year = year_raw
        .parse::<i32>()
        .map_err(|_| fail(format!("Invalid year '{year_raw}'.")))?;

    let mut rows = Vec::new();
    for (column, metric) in METRIC_COLUMNS {
        let Some(raw) = get_optional(record, header_map, column) else {
            continue;
        };
        let value = parse_f64(raw).ok_or_else(|| fail(format!("Invalid `{column}` value '{raw}'.")))?;
        rows.push(RawObservation {
            region_id: region_id.clone(),
            year,
            metric,
            value,
        });
    }
    Ok(rows)
}

fn get_required<'a>(
    record: &'a StringRecord,
    header_map: &HashMap<String, usize>,
    name: &str,
) -> Result<&'a str, String> {
    let idx = header_map
        .get(name)
        .ok_or_else(|| format!("Missing required column: `{name}`"))?;
    record
        .get(*idx)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| format!("Missing required value: `{name}`"))
}

fn get_optional<'a>(record: &'a StringRecord, header_map: &HashMap<String, usize>, name: &str) -> Option<&'a str> {
    let idx = header_map.get(name)?;
    record.get(*idx).map(str::trim).filter(|s| !s.is_empty())
}

fn parse_f64(s: &str) -> Option<f64> {
    // Thousands separators are common in agricultural statistics exports.
    let v = s.replace(',', "").parse::<f64>().ok()?;
    if v.is_finite() { Some(v) } else { None }
}
