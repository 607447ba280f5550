//! Long-table construction from per-year statement extracts.

use super::{
    CASH_DIVIDEND, CODE, EPS, EQUITY, LEDGER_COLUMNS, PERIOD, PROFIT, UpdateManifest, YEAR,
    source::{Projection, SourceKind},
};
use crate::{
    FundamentalsError, Result,
    config::{EngineConfig, SourceSchema},
    period::{FiscalPeriod, FiscalYear},
    prices::PriceListing,
    table::write_csv_atomic,
};
use chrono::Local;
use polars::prelude::*;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

const PERIOD_ORDER: &str = "period_order";

/// Builds the long ledger from income-statement, balance-sheet, and
/// dividend extracts.
///
/// The three sources are projected independently, deduplicated on
/// (code, year, period), and merged with a full outer join so a row exists
/// whenever any source reports it. Duplicate dividend declarations keep the
/// largest value; duplicate statement rows keep the last one in the file.
#[derive(Debug, Clone)]
pub struct LongTableBuilder {
    source_dir: PathBuf,
    price_file: PathBuf,
    schema: SourceSchema,
}

impl LongTableBuilder {
    /// Create a builder reading from the directories named in `config`.
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            source_dir: config.source_dir.clone(),
            price_file: config.price_file.clone(),
            schema: config.schema.clone(),
        }
    }

    /// Fiscal years with an income-statement extract, newest first.
    pub fn discover_years(&self) -> Result<Vec<FiscalYear>> {
        let mut years = BTreeSet::new();
        if self.source_dir.is_dir() {
            for entry in std::fs::read_dir(&self.source_dir)? {
                let name = entry?.file_name();
                if let Some(year) = name
                    .to_str()
                    .and_then(|n| SourceKind::IncomeStatement.year_from_file_name(n))
                {
                    years.insert(year);
                }
            }
        }

        if years.is_empty() {
            return Err(FundamentalsError::NoSourceYears(self.source_dir.display().to_string()));
        }
        Ok(years.into_iter().rev().collect())
    }

    /// Build the ledger for `years`, restricted to the securities in the
    /// close-price listing when one is available.
    pub fn build(&self, years: &[FiscalYear]) -> Result<DataFrame> {
        let universe = match PriceListing::load_or_warn(&self.price_file, &self.schema) {
            Some(listing) => {
                info!(securities = listing.len(), "restricting ledger to listed securities");
                Some(listing.codes())
            }
            None => {
                warn!("no valid-security universe available, keeping all securities");
                None
            }
        };
        self.build_with_universe(years, universe.as_ref())
    }

    /// Build the ledger for `years` with an explicit security universe.
    /// `None` keeps every security.
    pub fn build_with_universe(
        &self,
        years: &[FiscalYear],
        universe: Option<&BTreeSet<String>>,
    ) -> Result<DataFrame> {
        if years.is_empty() {
            return Err(FundamentalsError::Config("no fiscal years requested".to_string()));
        }

        let mut income = Projection::empty(SourceKind::IncomeStatement);
        let mut balance = Projection::empty(SourceKind::BalanceSheet);
        let mut dividend = Projection::empty(SourceKind::Dividend);

        for &year in years {
            let path = SourceKind::IncomeStatement.path(&self.source_dir, year);
            if !path.exists() {
                return Err(FundamentalsError::MissingIncomeStatement {
                    year,
                    path: path.display().to_string(),
                });
            }
            income.extend(self.load(SourceKind::IncomeStatement, year, universe)?);

            for (kind, target) in [
                (SourceKind::BalanceSheet, &mut balance),
                (SourceKind::Dividend, &mut dividend),
            ] {
                match self.load_optional(kind, year, universe) {
                    Some(projection) => target.extend(projection),
                    None => debug!(source = %kind, year, "columns stay absent for this year"),
                }
            }
        }

        info!(
            income = income.len(),
            balance = balance.len(),
            dividend = dividend.len(),
            "projected source extracts"
        );
        let outside = income.outside_universe + balance.outside_universe + dividend.outside_universe;
        if outside > 0 {
            info!(rows = outside, "dropped rows for securities outside the universe");
        }

        let ledger = merge(
            income.into_frame()?,
            balance.into_frame()?,
            dividend.into_frame()?,
        )?;
        info!(rows = ledger.height(), "built long ledger");
        Ok(ledger)
    }

    /// Full precomputation run: discover or validate years, build, write the
    /// ledger artifact, and write the update manifest.
    pub fn precompute(
        &self,
        years: Option<&[FiscalYear]>,
        ledger_file: &Path,
        manifest_file: &Path,
    ) -> Result<UpdateManifest> {
        let started = Instant::now();
        let years = match years {
            Some(years) if !years.is_empty() => years.to_vec(),
            _ => self.discover_years()?,
        };
        info!(?years, "starting ledger precomputation");

        let mut ledger = self.build(&years)?;
        write_csv_atomic(&mut ledger, ledger_file)?;
        info!(path = %ledger_file.display(), rows = ledger.height(), "wrote ledger artifact");

        let manifest = UpdateManifest::from_ledger(&ledger, Local::now(), started.elapsed())?;
        manifest.write(manifest_file)?;
        info!(
            duration_seconds = manifest.duration_seconds,
            securities = manifest.unique_stocks,
            years = %manifest.year_range,
            "precomputation complete"
        );
        Ok(manifest)
    }

    fn load(
        &self,
        kind: SourceKind,
        year: FiscalYear,
        universe: Option<&BTreeSet<String>>,
    ) -> Result<Projection> {
        let path = kind.path(&self.source_dir, year);
        let projection = Projection::read(kind, &path, year, &self.schema, universe)?;
        debug!(source = %kind, year, rows = projection.len(), "loaded extract");
        if projection.malformed > 0 {
            warn!(
                source = %kind,
                year,
                malformed = projection.malformed,
                "unparseable numeric cells read as absent"
            );
        }
        if projection.dropped > 0 {
            warn!(source = %kind, year, dropped = projection.dropped, "rows without a usable key");
        }
        Ok(projection)
    }

    fn load_optional(
        &self,
        kind: SourceKind,
        year: FiscalYear,
        universe: Option<&BTreeSet<String>>,
    ) -> Option<Projection> {
        let path = kind.path(&self.source_dir, year);
        if !path.exists() {
            warn!(source = %kind, year, path = %path.display(), "extract missing");
            return None;
        }
        match self.load(kind, year, universe) {
            Ok(projection) => Some(projection),
            Err(e) => {
                warn!(source = %kind, year, error = %e, "extract unusable");
                None
            }
        }
    }
}

fn key_columns() -> [Expr; 3] {
    [col(CODE), col(YEAR), col(PERIOD)]
}

fn full_join() -> JoinArgs {
    JoinArgs::new(JoinType::Full).with_coalesce(JoinCoalesce::CoalesceColumns)
}

/// Quarters map to their number and `Y1` to zero.
fn period_order() -> Expr {
    let [q1, q2, q3, q4] = FiscalPeriod::QUARTERS;
    when(col(PERIOD).eq(lit(q4.as_str())))
        .then(lit(q4.ordinal()))
        .when(col(PERIOD).eq(lit(q3.as_str())))
        .then(lit(q3.ordinal()))
        .when(col(PERIOD).eq(lit(q2.as_str())))
        .then(lit(q2.ordinal()))
        .when(col(PERIOD).eq(lit(q1.as_str())))
        .then(lit(q1.ordinal()))
        .otherwise(lit(FiscalPeriod::Y1.ordinal()))
}

/// Deduplicate each projection, outer-join them on the key, and sort by
/// code ascending, year descending, period descending.
fn merge(income: DataFrame, balance: DataFrame, dividend: DataFrame) -> Result<DataFrame> {
    let income = income
        .lazy()
        .group_by_stable(key_columns())
        .agg([col(EPS).last(), col(PROFIT).last()]);
    let balance = balance
        .lazy()
        .group_by_stable(key_columns())
        .agg([col(EQUITY).last()]);
    let dividend = dividend
        .lazy()
        .group_by_stable(key_columns())
        .agg([col(CASH_DIVIDEND).max()]);

    let ledger = income
        .join(balance, key_columns(), key_columns(), full_join())
        .join(dividend, key_columns(), key_columns(), full_join())
        .with_column(period_order().alias(PERIOD_ORDER))
        .sort(
            [CODE, YEAR, PERIOD_ORDER],
            SortMultipleOptions::default()
                .with_order_descending_multi([false, true, true])
                .with_nulls_last(true),
        )
        .select(LEDGER_COLUMNS.iter().map(|c| col(*c)).collect::<Vec<_>>())
        .collect()?;

    Ok(ledger)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{LedgerRow, read_ledger, rows_from_frame};
    use std::collections::HashSet;
    use std::fs;

    const INCOME_HEADER: &str = "代號,名稱,年度,季別,基本每股盈餘（元）,淨利\n";
    const BALANCE_HEADER: &str = "代號,名稱,年度,季別,權益總計\n";
    const DIVIDEND_HEADER: &str = "代號,名稱,年度,季別,現金股利\n";

    fn write_source(dir: &Path, kind: SourceKind, year: FiscalYear, header: &str, body: &str) {
        fs::write(kind.path(dir, year), format!("{header}{body}")).unwrap();
    }

    fn builder_for(dir: &Path) -> LongTableBuilder {
        LongTableBuilder::new(&EngineConfig {
            source_dir: dir.to_path_buf(),
            price_file: dir.join("latest_stock_prices.csv"),
            ..Default::default()
        })
    }

    fn seed_two_years(dir: &Path) {
        write_source(
            dir,
            SourceKind::IncomeStatement,
            113,
            INCOME_HEADER,
            "2330,TSMC,113,Q1,1.0,10\n2330,TSMC,113,Q4,5.0,30\n1101,TCC,113,Q4,1.2,5\n",
        );
        write_source(
            dir,
            SourceKind::IncomeStatement,
            112,
            INCOME_HEADER,
            "2330,TSMC,112,Q4,4.0,25\n",
        );
        write_source(
            dir,
            SourceKind::BalanceSheet,
            113,
            BALANCE_HEADER,
            "2330,TSMC,113,Q4,200\n0050,ETF,113,Q4,50\n",
        );
        write_source(
            dir,
            SourceKind::Dividend,
            113,
            DIVIDEND_HEADER,
            "2330,TSMC,113,Y1,5.0\n2330,TSMC,113,Y1,3.0\n1101,TCC,113,Y1,0\n",
        );
    }

    fn find<'a>(rows: &'a [LedgerRow], code: &str, year: i32, period: FiscalPeriod) -> &'a LedgerRow {
        rows.iter()
            .find(|r| r.code == code && r.year == year && r.period == period)
            .unwrap()
    }

    #[test]
    fn test_outer_union_keeps_rows_from_any_source() {
        let dir = tempfile::tempdir().unwrap();
        seed_two_years(dir.path());

        let df = builder_for(dir.path())
            .build_with_universe(&[113, 112], None)
            .unwrap();
        let rows = rows_from_frame(&df).unwrap();

        let tsmc_q4 = find(&rows, "2330", 113, FiscalPeriod::Q4);
        assert_eq!(tsmc_q4.eps, Some(5.0));
        assert_eq!(tsmc_q4.profit, Some(30.0));
        assert_eq!(tsmc_q4.equity, Some(200.0));
        assert_eq!(tsmc_q4.cash_dividend, None);

        // Balance-sheet-only security still gets a row with absent EPS.
        let etf = find(&rows, "0050", 113, FiscalPeriod::Q4);
        assert_eq!(etf.eps, None);
        assert_eq!(etf.equity, Some(50.0));

        // Missing balance sheet for 112 leaves equity absent, not zero.
        assert_eq!(find(&rows, "2330", 112, FiscalPeriod::Q4).equity, None);
    }

    #[test]
    fn test_duplicate_dividends_take_max_not_sum() {
        let dir = tempfile::tempdir().unwrap();
        seed_two_years(dir.path());
        let builder = builder_for(dir.path());

        for _ in 0..2 {
            let rows = rows_from_frame(&builder.build_with_universe(&[113], None).unwrap()).unwrap();
            let dividend = find(&rows, "2330", 113, FiscalPeriod::Y1);
            assert_eq!(dividend.cash_dividend, Some(5.0));
            // Zero dividends are read as absent.
            assert_eq!(find(&rows, "1101", 113, FiscalPeriod::Y1).cash_dividend, None);
        }
    }

    #[test]
    fn test_keys_are_unique() {
        let dir = tempfile::tempdir().unwrap();
        seed_two_years(dir.path());
        write_source(
            dir.path(),
            SourceKind::BalanceSheet,
            112,
            BALANCE_HEADER,
            "2330,TSMC,112,Q4,90\n2330,TSMC,112,Q4,100\n",
        );

        let rows = rows_from_frame(
            &builder_for(dir.path())
                .build_with_universe(&[113, 112], None)
                .unwrap(),
        )
        .unwrap();

        let keys: HashSet<_> = rows.iter().map(|r| (&r.code, r.year, r.period)).collect();
        assert_eq!(keys.len(), rows.len());
        assert_eq!(find(&rows, "2330", 112, FiscalPeriod::Q4).equity, Some(100.0));
    }

    #[test]
    fn test_sort_order() {
        let dir = tempfile::tempdir().unwrap();
        seed_two_years(dir.path());

        let df = builder_for(dir.path())
            .build_with_universe(&[113, 112], None)
            .unwrap();
        let keys: Vec<String> = rows_from_frame(&df)
            .unwrap()
            .iter()
            .map(|r| format!("{}-{}{}", r.code, r.year, r.period))
            .collect();

        assert_eq!(
            keys,
            [
                "0050-113Q4",
                "1101-113Q4",
                "1101-113Y1",
                "2330-113Q4",
                "2330-113Q1",
                "2330-113Y1",
                "2330-112Q4",
            ]
        );
    }

    #[test]
    fn test_universe_restriction() {
        let dir = tempfile::tempdir().unwrap();
        seed_two_years(dir.path());
        fs::write(
            dir.path().join("latest_stock_prices.csv"),
            "stock_code,stock_name,price,date\n2330,TSMC,1000,2025-01-02\n",
        )
        .unwrap();

        let rows = rows_from_frame(&builder_for(dir.path()).build(&[113, 112]).unwrap()).unwrap();
        assert!(rows.iter().all(|r| r.code == "2330"));
        assert!(!rows.is_empty());
    }

    #[test]
    fn test_missing_income_statement_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        seed_two_years(dir.path());

        let err = builder_for(dir.path())
            .build_with_universe(&[113, 111], None)
            .unwrap_err();
        assert!(matches!(err, FundamentalsError::MissingIncomeStatement { year: 111, .. }));
        assert!(err.to_string().contains("111"));
    }

    #[test]
    fn test_discover_years_newest_first() {
        let dir = tempfile::tempdir().unwrap();
        seed_two_years(dir.path());
        assert_eq!(builder_for(dir.path()).discover_years().unwrap(), vec![113, 112]);

        let empty = tempfile::tempdir().unwrap();
        let err = builder_for(empty.path()).discover_years().unwrap_err();
        assert!(matches!(err, FundamentalsError::NoSourceYears(_)));
    }

    #[test]
    fn test_precompute_writes_ledger_and_manifest() {
        let dir = tempfile::tempdir().unwrap();
        seed_two_years(dir.path());
        let ledger_file = dir.path().join("out").join("historical_metrics.csv");
        let manifest_file = dir.path().join("out").join("update_log.json");

        let manifest = builder_for(dir.path())
            .precompute(None, &ledger_file, &manifest_file)
            .unwrap();

        let header = fs::read_to_string(&ledger_file).unwrap();
        let header = header.trim_start_matches('\u{feff}').lines().next().unwrap().to_string();
        assert_eq!(header, LEDGER_COLUMNS.join(","));

        let rows = read_ledger(&ledger_file).unwrap();
        assert_eq!(manifest.total_records, rows.len());
        assert_eq!(manifest.unique_stocks, 3);
        assert_eq!(manifest.year_range, "112 - 113");
        assert_eq!(UpdateManifest::read(&manifest_file).unwrap(), manifest);
    }
}
