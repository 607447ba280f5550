//! The long-format fundamentals ledger.
//!
//! One row per (code, fiscal year, period) merging income-statement,
//! balance-sheet, and dividend extracts. The ledger is rebuilt wholesale on
//! every precomputation run and persisted as a seven-column CSV artifact.

pub mod builder;
pub mod manifest;
pub mod source;

pub use builder::LongTableBuilder;
pub use manifest::UpdateManifest;
pub use source::SourceKind;

use crate::{
    FundamentalsError, Result,
    period::{FiscalPeriod, FiscalYear},
    table::{NumberParser, read_text_csv, text_values},
};
use polars::prelude::*;
use std::path::Path;
use tracing::{info, warn};

/// Security code column.
pub const CODE: &str = "code";
/// Fiscal year column.
pub const YEAR: &str = "year";
/// Period tag column (`Q1`..`Q4` or `Y1`).
pub const PERIOD: &str = "quarter";
/// Cumulative basic EPS column.
pub const EPS: &str = "eps";
/// Cumulative net profit attributable to the parent.
pub const PROFIT: &str = "profit";
/// Period-end equity attributable to the parent.
pub const EQUITY: &str = "equity";
/// Annual cash dividend per share, `Y1` rows only.
pub const CASH_DIVIDEND: &str = "cash_dividend";

/// Columns of the ledger artifact, in order.
pub const LEDGER_COLUMNS: [&str; 7] = [CODE, YEAR, PERIOD, EPS, PROFIT, EQUITY, CASH_DIVIDEND];

/// One ledger row.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerRow {
    /// Security code
    pub code: String,
    /// Fiscal year in the source's calendar
    pub year: FiscalYear,
    /// Period tag
    pub period: FiscalPeriod,
    /// Cumulative basic EPS
    pub eps: Option<f64>,
    /// Cumulative net profit; the full-year figure at `Q4`
    pub profit: Option<f64>,
    /// Period-end equity
    pub equity: Option<f64>,
    /// Annual cash dividend per share
    pub cash_dividend: Option<f64>,
}

impl LedgerRow {
    /// A row with every value absent.
    pub fn empty(code: impl Into<String>, year: FiscalYear, period: FiscalPeriod) -> Self {
        Self {
            code: code.into(),
            year,
            period,
            eps: None,
            profit: None,
            equity: None,
            cash_dividend: None,
        }
    }
}

/// Convert a typed ledger frame (as produced by [`LongTableBuilder`]) into rows.
pub fn rows_from_frame(df: &DataFrame) -> Result<Vec<LedgerRow>> {
    let codes = df.column(CODE)?.str()?;
    let years = df.column(YEAR)?.i32()?;
    let periods = df.column(PERIOD)?.str()?;
    let eps = df.column(EPS)?.f64()?;
    let profit = df.column(PROFIT)?.f64()?;
    let equity = df.column(EQUITY)?.f64()?;
    let dividend = df.column(CASH_DIVIDEND)?.f64()?;

    let mut rows = Vec::with_capacity(df.height());
    for idx in 0..df.height() {
        let (Some(code), Some(year), Some(period)) = (codes.get(idx), years.get(idx), periods.get(idx))
        else {
            continue;
        };
        let period: FiscalPeriod = period.parse()?;
        rows.push(LedgerRow {
            code: code.to_string(),
            year,
            period,
            eps: eps.get(idx),
            profit: profit.get(idx),
            equity: equity.get(idx),
            cash_dividend: dividend.get(idx),
        });
    }
    Ok(rows)
}

/// Build a typed ledger frame from rows, preserving their order.
pub fn rows_to_frame(rows: &[LedgerRow]) -> Result<DataFrame> {
    let df = DataFrame::new(vec![
        Column::new(CODE.into(), rows.iter().map(|r| r.code.as_str()).collect::<Vec<_>>()),
        Column::new(YEAR.into(), rows.iter().map(|r| r.year).collect::<Vec<_>>()),
        Column::new(PERIOD.into(), rows.iter().map(|r| r.period.as_str()).collect::<Vec<_>>()),
        Column::new(EPS.into(), rows.iter().map(|r| r.eps).collect::<Vec<_>>()),
        Column::new(PROFIT.into(), rows.iter().map(|r| r.profit).collect::<Vec<_>>()),
        Column::new(EQUITY.into(), rows.iter().map(|r| r.equity).collect::<Vec<_>>()),
        Column::new(CASH_DIVIDEND.into(), rows.iter().map(|r| r.cash_dividend).collect::<Vec<_>>()),
    ])?;
    Ok(df)
}

/// Load the ledger artifact at `path`.
///
/// Cells that do not parse as numbers are read as absent; rows with a
/// missing key or an unknown period tag are skipped.
pub fn read_ledger(path: &Path) -> Result<Vec<LedgerRow>> {
    if !path.exists() {
        return Err(FundamentalsError::LedgerNotFound(path.display().to_string()));
    }

    let df = read_text_csv(path)?;
    if df.height() == 0 {
        warn!(path = %path.display(), "ledger artifact is empty");
        return Ok(Vec::new());
    }

    for column in LEDGER_COLUMNS {
        if df.get_column_index(column).is_none() {
            return Err(FundamentalsError::MissingColumn {
                column: column.to_string(),
                file: path.display().to_string(),
            });
        }
    }

    let codes = text_values(&df, CODE)?;
    let years = text_values(&df, YEAR)?;
    let periods = text_values(&df, PERIOD)?;
    let eps = text_values(&df, EPS)?;
    let profit = text_values(&df, PROFIT)?;
    let equity = text_values(&df, EQUITY)?;
    let dividend = text_values(&df, CASH_DIVIDEND)?;

    let mut parser = NumberParser::new();
    let mut skipped = 0usize;
    let mut rows = Vec::with_capacity(df.height());
    for idx in 0..df.height() {
        let key = (
            codes[idx].as_deref(),
            years[idx].as_deref().and_then(|y| y.parse::<FiscalYear>().ok()),
            periods[idx].as_deref().and_then(|p| p.parse::<FiscalPeriod>().ok()),
        );
        let (Some(code), Some(year), Some(period)) = key else {
            skipped += 1;
            continue;
        };
        rows.push(LedgerRow {
            code: code.to_string(),
            year,
            period,
            eps: parser.parse(eps[idx].as_deref()),
            profit: parser.parse(profit[idx].as_deref()),
            equity: parser.parse(equity[idx].as_deref()),
            cash_dividend: parser.parse(dividend[idx].as_deref()),
        });
    }

    if skipped > 0 || parser.malformed() > 0 {
        warn!(skipped, malformed = parser.malformed(), "ledger rows or cells could not be read");
    }
    info!(rows = rows.len(), path = %path.display(), "loaded ledger");
    Ok(rows)
}
