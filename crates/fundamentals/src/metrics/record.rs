//! Per-security metric record produced by a report run.

use crate::{
    columns::{self, AveragedMetric, YearlyMetric},
    period::{FiscalYear, QuarterKey},
};

/// Metrics for one fiscal year.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct YearMetrics {
    /// Fiscal year
    pub year: FiscalYear,
    /// Full-year cumulative EPS (the `Q4` figure)
    pub eps: Option<f64>,
    /// Annual cash dividend per share
    pub cash_dividend: Option<f64>,
    /// Dividend over latest close, percent
    pub dividend_yield: Option<f64>,
    /// Net profit over average equity, percent
    pub roe: Option<f64>,
    /// Dividend over annual EPS, percent; feeds averages only
    pub payout_ratio: Option<f64>,
}

impl YearMetrics {
    /// Value of an exported per-year metric.
    pub const fn get(&self, metric: YearlyMetric) -> Option<f64> {
        match metric {
            YearlyMetric::CashDividend => self.cash_dividend,
            YearlyMetric::DividendYield => self.dividend_yield,
            YearlyMetric::Roe => self.roe,
            YearlyMetric::AnnualEps => self.eps,
        }
    }
}

/// Averages over one trailing window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrailingAverages {
    /// Window length in years
    pub window: usize,
    /// Average cash dividend
    pub dividend: Option<f64>,
    /// Average dividend yield
    pub dividend_yield: Option<f64>,
    /// Average ROE
    pub roe: Option<f64>,
    /// Average payout ratio
    pub payout_ratio: Option<f64>,
}

impl TrailingAverages {
    /// Value for one averaged series.
    pub const fn get(&self, metric: AveragedMetric) -> Option<f64> {
        match metric {
            AveragedMetric::Dividend => self.dividend,
            AveragedMetric::DividendYield => self.dividend_yield,
            AveragedMetric::Roe => self.roe,
            AveragedMetric::PayoutRatio => self.payout_ratio,
        }
    }
}

/// Cumulative EPS of one quarter compared with the same quarter a year
/// earlier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuarterComparison {
    /// Quarter being compared
    pub quarter: QuarterKey,
    /// Cumulative EPS at `quarter`
    pub eps: Option<f64>,
    /// Cumulative EPS one fiscal year earlier
    pub year_ago_eps: Option<f64>,
    /// Percentage change
    pub change_pct: Option<f64>,
}

/// All metrics for one security.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricRecord {
    /// Security code
    pub code: String,
    /// Security name
    pub name: String,
    /// Latest close price
    pub close_price: Option<f64>,
    /// Date of the latest close
    pub close_date: Option<String>,
    /// One entry per requested year, newest first
    pub years: Vec<YearMetrics>,
    /// One entry per trailing window, shortest first
    pub trailing: Vec<TrailingAverages>,
    /// Cumulative EPS of recent quarters, oldest first
    pub quarter_eps: Vec<(QuarterKey, Option<f64>)>,
    /// Single-quarter EPS backed out of the cumulative figures, oldest first
    pub single_quarter_eps: Vec<(QuarterKey, Option<f64>)>,
    /// Year-over-year comparisons of the most recent quarters, oldest first
    pub quarter_comparisons: Vec<QuarterComparison>,
    /// Sum of the four most recent single-quarter EPS values
    pub trailing_four_quarter_eps: Option<f64>,
    /// Trailing-four-quarter EPS versus the prior year's annual EPS, percent
    pub trailing_four_quarter_eps_diff: Option<f64>,
}

impl MetricRecord {
    /// Metrics for `year`, if it was requested.
    pub fn year(&self, year: FiscalYear) -> Option<&YearMetrics> {
        self.years.iter().find(|y| y.year == year)
    }

    /// Averages for `window`, if it was computed.
    pub fn trailing(&self, window: usize) -> Option<&TrailingAverages> {
        self.trailing.iter().find(|t| t.window == window)
    }

    /// Every numeric column of this record in natural order: per-year
    /// blocks, trailing averages, quarter EPS, quarter comparisons, then the
    /// trailing-four-quarter pair.
    pub fn numeric_columns(&self) -> Vec<(String, Option<f64>)> {
        let mut fields = Vec::new();

        for year in &self.years {
            fields.push((YearlyMetric::AnnualEps.label(year.year), year.eps));
            fields.push((YearlyMetric::CashDividend.label(year.year), year.cash_dividend));
            fields.push((YearlyMetric::DividendYield.label(year.year), year.dividend_yield));
            fields.push((YearlyMetric::Roe.label(year.year), year.roe));
        }

        for metric in AveragedMetric::ALL {
            for averages in &self.trailing {
                fields.push((metric.label(averages.window), averages.get(metric)));
            }
        }

        for (quarter, eps) in &self.quarter_eps {
            fields.push((columns::quarter_eps(*quarter), *eps));
        }

        for comparison in &self.quarter_comparisons {
            let current = columns::quarter_eps(comparison.quarter);
            if !fields.iter().any(|(label, _)| *label == current) {
                fields.push((current, comparison.eps));
            }
            let year_ago = columns::quarter_eps(comparison.quarter.year_ago());
            if !fields.iter().any(|(label, _)| *label == year_ago) {
                fields.push((year_ago, comparison.year_ago_eps));
            }
            fields.push((columns::quarter_eps_diff(comparison.quarter), comparison.change_pct));
        }

        fields.push((
            columns::TRAILING_FOUR_QUARTER_EPS.to_string(),
            self.trailing_four_quarter_eps,
        ));
        fields.push((
            columns::TRAILING_FOUR_QUARTER_EPS_DIFF.to_string(),
            self.trailing_four_quarter_eps_diff,
        ));

        fields
    }
}
