//! Per-year source extracts and their projection onto ledger columns.

use super::{CASH_DIVIDEND, CODE, EPS, EQUITY, PERIOD, PROFIT, YEAR};
use crate::{
    Result,
    config::SourceSchema,
    period::{FiscalPeriod, FiscalYear},
    table::{NumberParser, read_text_csv, require_column, resolve_column, text_values},
};
use derive_more::Display;
use polars::prelude::*;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// The three statement families merged into the ledger.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    /// EPS and net profit, quarterly cumulative
    #[display("income_statement")]
    IncomeStatement,
    /// Equity, quarterly point-in-time
    #[display("balance_sheet")]
    BalanceSheet,
    /// Annual cash dividend declarations
    #[display("dividend")]
    Dividend,
}

impl SourceKind {
    /// Extract path for `year` under `dir`, e.g. `113-income_statement.csv`.
    pub fn path(self, dir: &Path, year: FiscalYear) -> PathBuf {
        dir.join(format!("{year}-{self}.csv"))
    }

    /// Ledger value columns this source contributes.
    pub const fn value_columns(self) -> &'static [&'static str] {
        match self {
            Self::IncomeStatement => &[EPS, PROFIT],
            Self::BalanceSheet => &[EQUITY],
            Self::Dividend => &[CASH_DIVIDEND],
        }
    }

    fn value_aliases(self, schema: &SourceSchema) -> Vec<&[String]> {
        match self {
            Self::IncomeStatement => vec![schema.eps.as_slice(), schema.profit.as_slice()],
            Self::BalanceSheet => vec![schema.equity.as_slice()],
            Self::Dividend => vec![schema.cash_dividend.as_slice()],
        }
    }

    /// Fiscal year encoded in an extract file name, if it belongs to `self`.
    pub fn year_from_file_name(self, file_name: &str) -> Option<FiscalYear> {
        let stem = file_name.strip_suffix(&format!("-{self}.csv"))?;
        stem.parse().ok()
    }
}

/// One source file projected onto (code, year, period, values...).
#[derive(Debug)]
pub struct Projection {
    /// Which statement family the rows came from
    pub kind: SourceKind,
    codes: Vec<String>,
    years: Vec<FiscalYear>,
    periods: Vec<&'static str>,
    values: Vec<Vec<Option<f64>>>,
    /// Numeric cells that were present but unparseable
    pub malformed: usize,
    /// Rows dropped for a missing code or an unrecognized period
    pub dropped: usize,
    /// Rows dropped because the code is outside the security universe
    pub outside_universe: usize,
}

impl Projection {
    /// A projection with no rows.
    pub fn empty(kind: SourceKind) -> Self {
        Self {
            kind,
            codes: Vec::new(),
            years: Vec::new(),
            periods: Vec::new(),
            values: vec![Vec::new(); kind.value_columns().len()],
            malformed: 0,
            dropped: 0,
            outside_universe: 0,
        }
    }

    /// Read the extract at `path` and project it.
    ///
    /// `file_year` stands in for rows whose year cell is missing. Dividend
    /// rows are always tagged `Y1` and a zero dividend is read as absent.
    pub fn read(
        kind: SourceKind,
        path: &Path,
        file_year: FiscalYear,
        schema: &SourceSchema,
        universe: Option<&BTreeSet<String>>,
    ) -> Result<Self> {
        let df = read_text_csv(path)?;
        let mut projection = Self::empty(kind);
        if df.height() == 0 {
            return Ok(projection);
        }

        let codes = text_values(&df, require_column(&df, &schema.code, CODE, path)?)?;
        let years = match resolve_column(&df, &schema.year) {
            Some(name) => text_values(&df, name)?,
            None => vec![None; df.height()],
        };
        let periods = match kind {
            SourceKind::Dividend => vec![None; df.height()],
            _ => text_values(&df, require_column(&df, &schema.period, PERIOD, path)?)?,
        };
        let raw_values = kind
            .value_aliases(schema)
            .into_iter()
            .zip(kind.value_columns())
            .map(|(aliases, logical)| text_values(&df, require_column(&df, aliases, logical, path)?))
            .collect::<Result<Vec<_>>>()?;

        let mut parser = NumberParser::new();
        for idx in 0..df.height() {
            let Some(code) = codes[idx].as_deref() else {
                projection.dropped += 1;
                continue;
            };
            if universe.is_some_and(|u| !u.contains(code)) {
                projection.outside_universe += 1;
                continue;
            }
            let period = match kind {
                SourceKind::Dividend => FiscalPeriod::Y1,
                _ => match periods[idx].as_deref().and_then(FiscalPeriod::parse_quarter) {
                    Some(period) => period,
                    None => {
                        projection.dropped += 1;
                        continue;
                    }
                },
            };
            let year = years[idx]
                .as_deref()
                .and_then(|y| y.parse::<FiscalYear>().ok())
                .unwrap_or(file_year);

            projection.codes.push(code.to_string());
            projection.years.push(year);
            projection.periods.push(period.as_str());
            for (column, raw) in projection.values.iter_mut().zip(&raw_values) {
                let value = parser.parse(raw[idx].as_deref());
                column.push(match kind {
                    SourceKind::Dividend => value.filter(|v| *v != 0.0),
                    _ => value,
                });
            }
        }
        projection.malformed = parser.malformed();

        Ok(projection)
    }

    /// Number of projected rows.
    pub fn len(&self) -> usize {
        self.codes.len()
    }

    /// Whether no rows were projected.
    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// Append the rows of `other`, which must be of the same kind.
    pub fn extend(&mut self, other: Self) {
        debug_assert_eq!(self.kind, other.kind);
        self.codes.extend(other.codes);
        self.years.extend(other.years);
        self.periods.extend(other.periods);
        for (column, more) in self.values.iter_mut().zip(other.values) {
            column.extend(more);
        }
        self.malformed += other.malformed;
        self.dropped += other.dropped;
        self.outside_universe += other.outside_universe;
    }

    /// Typed frame with key columns and this source's value columns.
    pub fn into_frame(self) -> Result<DataFrame> {
        let mut columns = vec![
            Column::new(CODE.into(), self.codes),
            Column::new(YEAR.into(), self.years),
            Column::new(PERIOD.into(), self.periods),
        ];
        for (name, values) in self.kind.value_columns().iter().zip(self.values) {
            columns.push(Column::new((*name).into(), values));
        }
        Ok(DataFrame::new(columns)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_source_paths_and_year_parsing() {
        let dir = Path::new("/data");
        assert_eq!(
            SourceKind::IncomeStatement.path(dir, 113),
            PathBuf::from("/data/113-income_statement.csv")
        );
        assert_eq!(
            SourceKind::IncomeStatement.year_from_file_name("112-income_statement.csv"),
            Some(112)
        );
        assert_eq!(SourceKind::IncomeStatement.year_from_file_name("112-dividend.csv"), None);
        assert_eq!(SourceKind::Dividend.year_from_file_name("abc-dividend.csv"), None);
    }

    #[test]
    fn test_income_projection_parses_garbage_as_absent() {
        let dir = tempfile::tempdir().unwrap();
        let path = SourceKind::IncomeStatement.path(dir.path(), 113);
        fs::write(
            &path,
            "\u{feff}代號,名稱,年度,季別,基本每股盈餘（元）,淨利\n\
             2330,TSMC,113,Q1,8.70,\"225,485,000\"\n\
             2330,TSMC,,Q2,abc,-\n\
             2330,TSMC,113,Q9,1.0,1.0\n",
        )
        .unwrap();

        let projection =
            Projection::read(SourceKind::IncomeStatement, &path, 113, &SourceSchema::default(), None)
                .unwrap();
        assert_eq!(projection.len(), 2);
        assert_eq!(projection.dropped, 1);
        assert_eq!(projection.malformed, 1);

        let df = projection.into_frame().unwrap();
        let eps = df.column(EPS).unwrap().f64().unwrap();
        let profit = df.column(PROFIT).unwrap().f64().unwrap();
        let years = df.column(YEAR).unwrap().i32().unwrap();
        assert_eq!(eps.get(0), Some(8.7));
        assert_eq!(profit.get(0), Some(225_485_000.0));
        assert_eq!(eps.get(1), None);
        assert_eq!(profit.get(1), None);
        assert_eq!(years.get(1), Some(113));
    }

    #[test]
    fn test_dividend_projection_tags_y1_and_drops_zero() {
        let dir = tempfile::tempdir().unwrap();
        let path = SourceKind::Dividend.path(dir.path(), 112);
        fs::write(&path, "代號,年度,季別,現金股利\n1101,112,Y1,1.5\n1102,112,Y1,0\n9999,112,Y1,3\n").unwrap();

        let universe: BTreeSet<String> = ["1101", "1102"].iter().map(|s| s.to_string()).collect();
        let projection = Projection::read(
            SourceKind::Dividend,
            &path,
            112,
            &SourceSchema::default(),
            Some(&universe),
        )
        .unwrap();
        assert_eq!(projection.len(), 2);
        assert_eq!(projection.outside_universe, 1);

        let df = projection.into_frame().unwrap();
        let periods = df.column(PERIOD).unwrap().str().unwrap();
        let dividends = df.column(CASH_DIVIDEND).unwrap().f64().unwrap();
        assert!(periods.into_iter().all(|p| p == Some("Y1")));
        assert_eq!(dividends.get(0), Some(1.5));
        assert_eq!(dividends.get(1), None);
    }

    #[test]
    fn test_missing_value_column_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = SourceKind::BalanceSheet.path(dir.path(), 113);
        fs::write(&path, "代號,年度,季別\n2330,113,Q4\n").unwrap();

        let err = Projection::read(SourceKind::BalanceSheet, &path, 113, &SourceSchema::default(), None)
            .unwrap_err();
        assert!(err.to_string().contains(EQUITY));
    }
}
