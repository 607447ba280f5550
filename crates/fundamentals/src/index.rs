//! Point-lookup indices over the long ledger.

use crate::{
    ledger::LedgerRow,
    period::{FiscalPeriod, FiscalYear},
};
use std::collections::{BTreeSet, HashMap, HashSet};

/// (code, year, period) key.
pub type PeriodKey = (String, FiscalYear, FiscalPeriod);
/// (code, year) key.
pub type YearKey = (String, FiscalYear);

/// The four lookups used during report generation.
///
/// Built in a single pass over the ledger and never mutated afterwards.
/// Every row's (code, year, quarterly) key is also kept, whatever its
/// values, to decide which securities a report covers.
#[derive(Debug, Clone, Default)]
pub struct MetricsIndex {
    eps: HashMap<PeriodKey, f64>,
    profit: HashMap<YearKey, f64>,
    equity: HashMap<PeriodKey, f64>,
    dividend: HashMap<YearKey, f64>,
    observed: HashSet<(String, FiscalYear, bool)>,
}

impl MetricsIndex {
    /// Index `rows`.
    ///
    /// EPS and equity are indexed for every period; profit only from `Q4`
    /// rows (the full-year figure); dividends only from `Y1` rows, keeping
    /// the largest value seen for a (code, year).
    pub fn from_rows<'a>(rows: impl IntoIterator<Item = &'a LedgerRow>) -> Self {
        let mut index = Self::default();
        for row in rows {
            index
                .observed
                .insert((row.code.clone(), row.year, row.period.is_quarter()));
            if let Some(eps) = row.eps {
                index.eps.insert((row.code.clone(), row.year, row.period), eps);
            }
            if let Some(equity) = row.equity {
                index.equity.insert((row.code.clone(), row.year, row.period), equity);
            }
            if row.period == FiscalPeriod::Q4
                && let Some(profit) = row.profit
            {
                index.profit.insert((row.code.clone(), row.year), profit);
            }
            if row.period == FiscalPeriod::Y1
                && let Some(dividend) = row.cash_dividend
            {
                index
                    .dividend
                    .entry((row.code.clone(), row.year))
                    .and_modify(|current| *current = current.max(dividend))
                    .or_insert(dividend);
            }
        }
        index
    }

    /// Cumulative EPS reported for `period` of `year`.
    pub fn eps(&self, code: &str, year: FiscalYear, period: FiscalPeriod) -> Option<f64> {
        self.eps.get(&(code.to_string(), year, period)).copied()
    }

    /// Full-year net profit for `year`.
    pub fn profit(&self, code: &str, year: FiscalYear) -> Option<f64> {
        self.profit.get(&(code.to_string(), year)).copied()
    }

    /// Equity balance at the end of `period` of `year`.
    pub fn equity(&self, code: &str, year: FiscalYear, period: FiscalPeriod) -> Option<f64> {
        self.equity.get(&(code.to_string(), year, period)).copied()
    }

    /// Annual cash dividend declared for `year`.
    pub fn dividend(&self, code: &str, year: FiscalYear) -> Option<f64> {
        self.dividend.get(&(code.to_string(), year)).copied()
    }

    /// Securities with any ledger row relevant to a report over `years`.
    ///
    /// Quarterly rows count for the requested years and the year before the
    /// earliest one (needed for beginning-of-year equity); `Y1` rows count
    /// for the requested years only. A row counts even when all of its
    /// values are absent, so a security without balance-sheet data or with
    /// only unusable cells is still included.
    pub fn securities(&self, years: &[FiscalYear]) -> BTreeSet<String> {
        let requested: BTreeSet<FiscalYear> = years.iter().copied().collect();
        let Some(earliest) = requested.first().copied() else {
            return BTreeSet::new();
        };

        self.observed
            .iter()
            .filter(|(_, year, quarterly)| {
                requested.contains(year) || (*quarterly && *year == earliest - 1)
            })
            .map(|(code, _, _)| code.clone())
            .collect()
    }

    /// Sizes of the four lookups: (eps, profit, equity, dividend).
    pub fn sizes(&self) -> (usize, usize, usize, usize) {
        (self.eps.len(), self.profit.len(), self.equity.len(), self.dividend.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(code: &str, year: i32, period: FiscalPeriod) -> LedgerRow {
        LedgerRow::empty(code, year, period)
    }

    #[test]
    fn test_profit_only_from_q4() {
        let rows = vec![
            LedgerRow { profit: Some(10.0), eps: Some(1.0), ..row("A", 113, FiscalPeriod::Q2) },
            LedgerRow { profit: Some(40.0), eps: Some(4.0), ..row("A", 113, FiscalPeriod::Q4) },
        ];
        let index = MetricsIndex::from_rows(&rows);

        assert_eq!(index.profit("A", 113), Some(40.0));
        assert_eq!(index.eps("A", 113, FiscalPeriod::Q2), Some(1.0));
        assert_eq!(index.eps("A", 113, FiscalPeriod::Q4), Some(4.0));
        assert_eq!(index.sizes(), (2, 1, 0, 0));
    }

    #[test]
    fn test_dividend_only_from_y1_with_max_dedup() {
        let rows = vec![
            LedgerRow { cash_dividend: Some(3.0), ..row("A", 113, FiscalPeriod::Y1) },
            LedgerRow { cash_dividend: Some(5.0), ..row("A", 113, FiscalPeriod::Y1) },
            LedgerRow { cash_dividend: Some(4.0), ..row("A", 113, FiscalPeriod::Y1) },
            LedgerRow { cash_dividend: Some(9.0), ..row("A", 112, FiscalPeriod::Q4) },
        ];
        let index = MetricsIndex::from_rows(&rows);

        assert_eq!(index.dividend("A", 113), Some(5.0));
        assert_eq!(index.dividend("A", 112), None);
    }

    #[test]
    fn test_absent_values_are_not_indexed() {
        let rows = vec![row("A", 113, FiscalPeriod::Q4)];
        let index = MetricsIndex::from_rows(&rows);
        assert_eq!(index.sizes(), (0, 0, 0, 0));
        assert_eq!(index.equity("A", 113, FiscalPeriod::Q4), None);
    }

    #[test]
    fn test_securities_is_union_over_window() {
        let rows = vec![
            LedgerRow { eps: Some(1.0), ..row("EPS", 113, FiscalPeriod::Q4) },
            LedgerRow { equity: Some(1.0), ..row("PRIOR", 111, FiscalPeriod::Q4) },
            LedgerRow { cash_dividend: Some(1.0), ..row("DIV", 112, FiscalPeriod::Y1) },
            LedgerRow { cash_dividend: Some(1.0), ..row("OLDDIV", 111, FiscalPeriod::Y1) },
            LedgerRow { eps: Some(1.0), ..row("ANCIENT", 100, FiscalPeriod::Q4) },
        ];
        let index = MetricsIndex::from_rows(&rows);

        let codes: Vec<String> = index.securities(&[113, 112]).into_iter().collect();
        assert_eq!(codes, ["DIV", "EPS", "PRIOR"]);
    }

    #[test]
    fn test_securities_include_rows_with_only_absent_values() {
        let rows = vec![
            row("BLANK", 113, FiscalPeriod::Q4),
            row("ZERODIV", 113, FiscalPeriod::Y1),
            row("PRIORBLANK", 112, FiscalPeriod::Q4),
            row("OLDY1", 112, FiscalPeriod::Y1),
            LedgerRow { eps: Some(1.0), ..row("A", 113, FiscalPeriod::Q4) },
        ];
        let index = MetricsIndex::from_rows(&rows);

        let codes: Vec<String> = index.securities(&[113]).into_iter().collect();
        assert_eq!(codes, ["A", "BLANK", "PRIORBLANK", "ZERODIV"]);
        assert!(index.securities(&[]).is_empty());
    }
}
