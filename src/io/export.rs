//! Result exports: the harmonized timeline as CSV and full reports as JSON.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use serde::Serialize;

use crate::domain::HarmonizedPoint;
use crate::error::AppError;

/// Write the timeline CSV to `path`.
pub fn write_timeline_csv(path: &Path, timeline: &[HarmonizedPoint]) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create timeline CSV '{}': {e}", path.display())))?;
    write_timeline(file, timeline)?;
    tracing::info!(path = %path.display(), points = timeline.len(), "wrote timeline CSV");
    Ok(())
}

/// Write `year,value,method,participation,contributing_regions` rows.
///
/// Contributing regions are joined with `;` inside one cell.
pub fn write_timeline<W: Write>(sink: W, timeline: &[HarmonizedPoint]) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_writer(sink);
    let io_err = |e: csv::Error| AppError::new(2, format!("Failed to write timeline CSV: {e}"));

    writer
        .write_record(["year", "value", "method", "participation", "contributing_regions"])
        .map_err(io_err)?;
    for p in timeline {
        writer
            .write_record([
                p.year.to_string(),
                format!("{:.4}", p.value),
                p.method.label().to_string(),
                format!("{:.4}", p.participation),
                p.contributing_regions.join(";"),
            ])
            .map_err(io_err)?;
    }
    writer
        .flush()
        .map_err(|e| AppError::new(2, format!("Failed to flush timeline CSV: {e}")))?;
    Ok(())
}

/// Write any serializable report as pretty JSON.
pub fn write_report_json<T: Serialize>(path: &Path, report: &T) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create report JSON '{}': {e}", path.display())))?;
    serde_json::to_writer_pretty(file, report)
        .map_err(|e| AppError::new(2, format!("Failed to write report JSON: {e}")))?;
    tracing::info!(path = %path.display(), "wrote report JSON");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::HarmonizationMethod;

    #[test]
    fn timeline_csv_layout() {
        let timeline = vec![
            HarmonizedPoint {
                year: 2011,
                value: 1300.0,
                method: HarmonizationMethod::Raw,
                contributing_regions: vec!["P".into()],
                participation: 1.0,
            },
            HarmonizedPoint {
                year: 2012,
                value: 1250.0,
                method: HarmonizationMethod::AreaWeighted,
                contributing_regions: vec!["A".into(), "B".into()],
                participation: 2.0 / 3.0,
            },
        ];
        let mut buf = Vec::new();
        write_timeline(&mut buf, &timeline).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "year,value,method,participation,contributing_regions");
        assert_eq!(lines[1], "2011,1300.0000,raw,1.0000,P");
        assert_eq!(lines[2], "2012,1250.0000,area_weighted,0.6667,A;B");
    }
}
