//! Update manifest written alongside the ledger artifact.

use super::{CODE, YEAR};
use crate::{Result, period::FiscalYear, table::write_json_value};
use chrono::{DateTime, Local};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

/// Operational summary of one precomputation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateManifest {
    /// Completion time, RFC 3339
    pub last_update: String,
    /// Wall-clock duration of the run
    pub duration_seconds: f64,
    /// Ledger row count
    pub total_records: usize,
    /// Distinct security codes in the ledger
    pub unique_stocks: usize,
    /// Earliest fiscal year present
    pub year_min: Option<FiscalYear>,
    /// Latest fiscal year present
    pub year_max: Option<FiscalYear>,
    /// `"min - max"`, empty for an empty ledger
    pub year_range: String,
}

impl UpdateManifest {
    /// Summarize a typed ledger frame.
    pub fn from_ledger(ledger: &DataFrame, finished: DateTime<Local>, elapsed: Duration) -> Result<Self> {
        let unique_stocks = ledger
            .column(CODE)?
            .str()?
            .into_iter()
            .flatten()
            .collect::<HashSet<_>>()
            .len();
        let years = ledger.column(YEAR)?.i32()?;
        let year_min = years.into_iter().flatten().min();
        let year_max = years.into_iter().flatten().max();
        let year_range = match (year_min, year_max) {
            (Some(lo), Some(hi)) => format!("{lo} - {hi}"),
            _ => String::new(),
        };

        Ok(Self {
            last_update: finished.to_rfc3339(),
            duration_seconds: elapsed.as_secs_f64(),
            total_records: ledger.height(),
            unique_stocks,
            year_min,
            year_max,
            year_range,
        })
    }

    /// Write as pretty JSON.
    pub fn write(&self, path: &Path) -> Result<()> {
        write_json_value(self, path)
    }

    /// Read a previously written manifest.
    pub fn read(path: &Path) -> Result<Self> {
        Ok(serde_json::from_str(&std::fs::read_to_string(path)?)?)
    }
}
