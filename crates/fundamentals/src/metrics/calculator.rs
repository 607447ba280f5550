//! Per-security metric derivation.

use super::{
    math::{
        average_balance, percent_change, percent_ratio, single_quarter_values, sum_present,
        trailing_average,
    },
    record::{MetricRecord, QuarterComparison, TrailingAverages, YearMetrics},
};
use crate::{
    FundamentalsError, Result,
    index::MetricsIndex,
    period::{FiscalPeriod, FiscalYear, QuarterKey},
    prices::{PriceListing, PriceQuote},
};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Window and quarter-count settings for the calculator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalculatorConfig {
    /// Trailing-average window lengths, in years
    pub windows: Vec<usize>,
    /// Number of recent quarters reported with cumulative EPS
    pub recent_quarters: usize,
    /// Number of recent quarters compared year over year
    pub compared_quarters: usize,
}

impl Default for CalculatorConfig {
    fn default() -> Self {
        Self {
            windows: vec![3, 5, 8],
            recent_quarters: 8,
            compared_quarters: 4,
        }
    }
}

/// Single-quarter values summed into the trailing-four-quarter EPS.
const TRAILING_QUARTERS: usize = 4;

/// Derives a [`MetricRecord`] per security from a [`MetricsIndex`].
///
/// Quarter-level metrics are anchored on the current (newest requested)
/// year's `Q4`, which is itself excluded because it is normally not filed
/// yet when the report runs.
#[derive(Debug, Clone, Default)]
pub struct MetricCalculator {
    config: CalculatorConfig,
}

impl MetricCalculator {
    /// Create a calculator with custom settings.
    pub const fn with_config(config: CalculatorConfig) -> Self {
        Self { config }
    }

    /// Settings in use.
    pub const fn config(&self) -> &CalculatorConfig {
        &self.config
    }

    /// One record per security with data in the report window, sorted by
    /// code.
    ///
    /// `years` may be given in any order; it is normalized to distinct
    /// years, newest first.
    pub fn calculate(
        &self,
        index: &MetricsIndex,
        years: &[FiscalYear],
        prices: Option<&PriceListing>,
    ) -> Result<Vec<MetricRecord>> {
        let years = normalize_years(years)?;
        let records: Vec<MetricRecord> = index
            .securities(&years)
            .into_iter()
            .map(|code| {
                let quote = prices.and_then(|p| p.get(&code));
                self.calculate_one(index, &code, &years, quote)
            })
            .collect();
        info!(securities = records.len(), years = years.len(), "calculated metrics");
        Ok(records)
    }

    /// Numeric column labels every record over `years` produces, in natural
    /// order. Depends only on `years` and the calculator settings.
    pub fn column_labels(&self, years: &[FiscalYear]) -> Vec<String> {
        let Ok(years) = normalize_years(years) else {
            return Vec::new();
        };
        self.calculate_one(&MetricsIndex::default(), "", &years, None)
            .numeric_columns()
            .into_iter()
            .map(|(label, _)| label)
            .collect()
    }

    /// Record for one security. `years` must be newest first.
    pub fn calculate_one(
        &self,
        index: &MetricsIndex,
        code: &str,
        years: &[FiscalYear],
        quote: Option<&PriceQuote>,
    ) -> MetricRecord {
        let price = quote.and_then(|q| q.price);

        let yearly: Vec<YearMetrics> = years
            .iter()
            .map(|&year| year_metrics(index, code, year, price))
            .collect();

        let trailing = self
            .config
            .windows
            .iter()
            .map(|&window| {
                let series = |f: fn(&YearMetrics) -> Option<f64>| -> Vec<Option<f64>> {
                    yearly.iter().map(f).collect()
                };
                TrailingAverages {
                    window,
                    dividend: trailing_average(&series(|y| y.cash_dividend), window),
                    dividend_yield: trailing_average(&series(|y| y.dividend_yield), window),
                    roe: trailing_average(&series(|y| y.roe), window),
                    payout_ratio: trailing_average(&series(|y| y.payout_ratio), window),
                }
            })
            .collect();

        let anchor = years.first().map(|&y| QuarterKey::new(y, FiscalPeriod::Q4));
        let cumulative = |count: usize| -> Vec<(QuarterKey, Option<f64>)> {
            let mut quarters = anchor.map(|a| a.preceding(count)).unwrap_or_default();
            quarters.reverse();
            quarters
                .into_iter()
                .map(|q| (q, index.eps(code, q.year, q.quarter)))
                .collect()
        };

        let quarter_eps = cumulative(self.config.recent_quarters);

        let quarter_comparisons = cumulative(self.config.compared_quarters)
            .into_iter()
            .map(|(quarter, eps)| {
                let prior = quarter.year_ago();
                let year_ago_eps = index.eps(code, prior.year, prior.quarter);
                QuarterComparison {
                    quarter,
                    eps,
                    year_ago_eps,
                    change_pct: percent_change(eps, year_ago_eps),
                }
            })
            .collect();

        // One extra quarter so the oldest of the four has a predecessor.
        let back_out_window = cumulative(TRAILING_QUARTERS + 1);
        let singles = single_quarter_values(&back_out_window);
        let single_quarter_eps: Vec<(QuarterKey, Option<f64>)> = back_out_window
            .iter()
            .skip(1)
            .map(|(q, _)| *q)
            .zip(singles.iter().copied())
            .collect();
        let trailing_four_quarter_eps = sum_present(&singles);

        let prior_year_eps = yearly.get(1).and_then(|y| y.eps);
        let trailing_four_quarter_eps_diff = percent_change(trailing_four_quarter_eps, prior_year_eps);

        MetricRecord {
            code: code.to_string(),
            name: quote.map(|q| q.name.clone()).unwrap_or_default(),
            close_price: price,
            close_date: quote.and_then(|q| q.date.clone()),
            years: yearly,
            trailing,
            quarter_eps,
            single_quarter_eps,
            quarter_comparisons,
            trailing_four_quarter_eps,
            trailing_four_quarter_eps_diff,
        }
    }
}

/// Per-year block: annual EPS, dividend, yield, ROE, payout ratio.
fn year_metrics(index: &MetricsIndex, code: &str, year: FiscalYear, price: Option<f64>) -> YearMetrics {
    let eps = index.eps(code, year, FiscalPeriod::Q4);
    let cash_dividend = index.dividend(code, year);
    let average_equity = average_balance(
        index.equity(code, year - 1, FiscalPeriod::Q4),
        index.equity(code, year, FiscalPeriod::Q4),
    );

    YearMetrics {
        year,
        eps,
        cash_dividend,
        dividend_yield: percent_ratio(cash_dividend, price),
        roe: percent_ratio(index.profit(code, year), average_equity),
        payout_ratio: percent_ratio(cash_dividend, eps),
    }
}

/// Distinct years, newest first. An empty request is a configuration error.
pub fn normalize_years(years: &[FiscalYear]) -> Result<Vec<FiscalYear>> {
    let mut normalized = years.to_vec();
    normalized.sort_unstable_by(|a, b| b.cmp(a));
    normalized.dedup();
    if normalized.is_empty() {
        return Err(FundamentalsError::Config("no fiscal years requested".to_string()));
    }
    Ok(normalized)
}
