//! Column labels of the wide summary report.

use crate::period::{FiscalYear, QuarterKey};
use derive_more::Display;

/// Security code.
pub const CODE: &str = "code";
/// Security name.
pub const NAME: &str = "name";
/// Latest close price.
pub const CLOSE_PRICE: &str = "close_price";
/// Date of the latest close.
pub const CLOSE_DATE: &str = "close_date";
/// Sum of the four most recent single-quarter EPS values.
pub const TRAILING_FOUR_QUARTER_EPS: &str = "trailing4q_eps";
/// Trailing-four-quarter EPS versus the prior fiscal year's annual EPS.
pub const TRAILING_FOUR_QUARTER_EPS_DIFF: &str = "trailing4q_vs_prev_year_eps_diff";

/// Leading identity columns, in order.
pub const IDENTITY: [&str; 4] = [CODE, NAME, CLOSE_PRICE, CLOSE_DATE];

/// Columns pinned to the right edge of the report, in order.
pub const HEADLINE: [&str; 2] = [TRAILING_FOUR_QUARTER_EPS, TRAILING_FOUR_QUARTER_EPS_DIFF];

/// Per-year metric groups, in report order.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
pub enum YearlyMetric {
    /// Annual cash dividend per share
    #[display("cash_dividend")]
    CashDividend,
    /// Dividend yield, percent
    #[display("yield")]
    DividendYield,
    /// Return on average equity, percent
    #[display("roe")]
    Roe,
    /// Full-year cumulative EPS
    #[display("eps")]
    AnnualEps,
}

impl YearlyMetric {
    /// Group order used by the report.
    pub const ALL: [Self; 4] = [Self::CashDividend, Self::DividendYield, Self::Roe, Self::AnnualEps];

    /// Label for `year`, e.g. `113_roe`.
    pub fn label(self, year: FiscalYear) -> String {
        format!("{year}_{self}")
    }
}

/// Series that get trailing multi-year averages.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AveragedMetric {
    /// Cash dividend
    #[display("dividend")]
    Dividend,
    /// Dividend yield
    #[display("yield")]
    DividendYield,
    /// Return on equity
    #[display("roe")]
    Roe,
    /// Payout ratio
    #[display("payout")]
    PayoutRatio,
}

impl AveragedMetric {
    /// Natural column order.
    pub const ALL: [Self; 4] = [Self::Dividend, Self::DividendYield, Self::Roe, Self::PayoutRatio];

    /// Label for a `window`-year average, e.g. `avg5y_roe`.
    pub fn label(self, window: usize) -> String {
        format!("avg{window}y_{self}")
    }
}

/// Cumulative EPS of one quarter, e.g. `113Q2_eps`.
pub fn quarter_eps(quarter: QuarterKey) -> String {
    format!("{quarter}_eps")
}

/// Year-over-year cumulative EPS change, e.g. `113Q2_vs_112Q2_eps_diff`.
pub fn quarter_eps_diff(quarter: QuarterKey) -> String {
    format!("{quarter}_vs_{}_eps_diff", quarter.year_ago())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::period::FiscalPeriod;

    #[test]
    fn test_labels() {
        assert_eq!(YearlyMetric::CashDividend.label(113), "113_cash_dividend");
        assert_eq!(YearlyMetric::DividendYield.label(113), "113_yield");
        assert_eq!(YearlyMetric::AnnualEps.label(112), "112_eps");
        assert_eq!(AveragedMetric::PayoutRatio.label(8), "avg8y_payout");

        let quarter = QuarterKey::new(113, FiscalPeriod::Q2);
        assert_eq!(quarter_eps(quarter), "113Q2_eps");
        assert_eq!(quarter_eps_diff(quarter), "113Q2_vs_112Q2_eps_diff");
    }
}
