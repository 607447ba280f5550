//! Runtime configuration.
//!
//! Every path, year range, and header alias is an explicit value passed to
//! the components that need it. Nothing is read from ambient state.

use crate::{FundamentalsError, Result, period::FiscalYear};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default offset between Gregorian years and the source's fiscal calendar.
pub const DEFAULT_CALENDAR_OFFSET: i32 = 1911;

/// Configuration shared by the ledger builder and the report generator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Directory holding the per-year `{year}-{report}.csv` extracts.
    pub source_dir: PathBuf,
    /// Latest close-price listing.
    pub price_file: PathBuf,
    /// Long ledger artifact.
    pub ledger_file: PathBuf,
    /// Update manifest written next to the ledger.
    pub manifest_file: PathBuf,
    /// Wide summary report, CSV export.
    pub report_csv: PathBuf,
    /// Wide summary report, JSON export.
    pub report_json: PathBuf,
    /// Number of trailing years covered by a report, not counting the
    /// current year.
    pub summary_years: usize,
    /// Gregorian year minus this value gives the local fiscal year.
    pub calendar_offset: i32,
    /// Accepted header names for the source extracts.
    pub schema: SourceSchema,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::from("datas/merged_data/csv"),
            price_file: PathBuf::from("datas/merged_data/csv/latest_stock_prices.csv"),
            ledger_file: PathBuf::from("datas/precomputed_metrics/historical_metrics.csv"),
            manifest_file: PathBuf::from("datas/precomputed_metrics/update_log.json"),
            report_csv: PathBuf::from("datas/reports_data/csv/summary_report.csv"),
            report_json: PathBuf::from("datas/reports_data/json/summary_report.json"),
            summary_years: 8,
            calendar_offset: DEFAULT_CALENDAR_OFFSET,
            schema: SourceSchema::default(),
        }
    }
}

impl EngineConfig {
    /// Load a JSON override file. Keys that are not present keep their
    /// default values.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            FundamentalsError::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Fiscal years covered by a report run started on `today`, newest first.
    pub fn report_years(&self, today: NaiveDate) -> Vec<FiscalYear> {
        recent_fiscal_years(today, self.summary_years + 1, self.calendar_offset)
    }
}

/// Ordered header aliases for every logical source column.
///
/// The first alias present in a file's header row is used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceSchema {
    /// Security code
    pub code: Vec<String>,
    /// Security name (price listing)
    pub name: Vec<String>,
    /// Fiscal year
    pub year: Vec<String>,
    /// Fiscal period tag
    pub period: Vec<String>,
    /// Basic EPS
    pub eps: Vec<String>,
    /// Net profit attributable to the parent
    pub profit: Vec<String>,
    /// Total equity attributable to the parent
    pub equity: Vec<String>,
    /// Aggregate cash dividend per share
    pub cash_dividend: Vec<String>,
    /// Close price (price listing)
    pub price: Vec<String>,
    /// Close date (price listing)
    pub date: Vec<String>,
}

fn aliases(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| (*s).to_string()).collect()
}

impl Default for SourceSchema {
    fn default() -> Self {
        Self {
            code: aliases(&["代號", "code", "stock_code"]),
            name: aliases(&["名稱", "name", "stock_name"]),
            year: aliases(&["年度", "year"]),
            period: aliases(&["季別", "quarter", "period"]),
            eps: aliases(&["基本每股盈餘（元）", "eps"]),
            profit: aliases(&["淨利", "profit"]),
            equity: aliases(&["權益總計", "equity"]),
            cash_dividend: aliases(&["現金股利", "cash_dividend"]),
            price: aliases(&["price", "收盤價"]),
            date: aliases(&["date", "日期"]),
        }
    }
}

/// `count` local fiscal years ending at the one containing `today`, newest
/// first.
pub fn recent_fiscal_years(today: NaiveDate, count: usize, calendar_offset: i32) -> Vec<FiscalYear> {
    let current = today.year() - calendar_offset;
    (0..count as i32).map(|i| current - i).collect()
}
