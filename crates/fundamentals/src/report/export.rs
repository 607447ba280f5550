//! Report export adapters.

use crate::{
    Result,
    config::EngineConfig,
    table::{write_csv_atomic, write_json_records},
};
use polars::prelude::DataFrame;
use std::path::{Path, PathBuf};
use tracing::info;

/// Writes the assembled report as CSV and JSON, preserving its row and
/// column order.
#[derive(Debug, Clone)]
pub struct ReportExporter {
    csv_path: PathBuf,
    json_path: PathBuf,
}

impl ReportExporter {
    /// Exporter writing to explicit paths.
    pub fn new(csv_path: impl Into<PathBuf>, json_path: impl Into<PathBuf>) -> Self {
        Self {
            csv_path: csv_path.into(),
            json_path: json_path.into(),
        }
    }

    /// Exporter writing to the report paths of `config`.
    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(&config.report_csv, &config.report_json)
    }

    /// CSV destination.
    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }

    /// JSON destination.
    pub fn json_path(&self) -> &Path {
        &self.json_path
    }

    /// Write both formats.
    pub fn export(&self, report: &mut DataFrame) -> Result<()> {
        write_csv_atomic(report, &self.csv_path)?;
        info!(path = %self.csv_path.display(), rows = report.height(), "exported report CSV");
        write_json_records(report, &self.json_path)?;
        info!(path = %self.json_path.display(), rows = report.height(), "exported report JSON");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::df;
    use std::fs;

    #[test]
    fn test_export_writes_both_formats() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = ReportExporter::new(
            dir.path().join("csv/summary_report.csv"),
            dir.path().join("json/summary_report.json"),
        );
        let mut report = df!(
            "code" => ["1101", "2330"],
            "name" => ["TCC", "TSMC"],
            "113_roe" => [None, Some(26.67)],
        )
        .unwrap();

        exporter.export(&mut report).unwrap();

        let csv = fs::read_to_string(exporter.csv_path()).unwrap();
        assert!(csv.starts_with('\u{feff}'));
        assert_eq!(csv.lines().next().unwrap().trim_start_matches('\u{feff}'), "code,name,113_roe");

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(exporter.json_path()).unwrap()).unwrap();
        let records = json.as_array().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["code"], "1101");
        assert!(records[0]["113_roe"].is_null());
        assert_eq!(records[1]["113_roe"], 26.67);
    }
}
