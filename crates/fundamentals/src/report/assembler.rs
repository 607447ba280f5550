//! Pivot metric records into the wide summary table.

use crate::{
    Result,
    columns::{self, YearlyMetric},
    metrics::{MetricCalculator, MetricRecord},
    period::FiscalYear,
};
use polars::prelude::*;
use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::debug;

/// Builds the wide report from [`MetricRecord`]s.
///
/// Column order is fixed: identity columns, per-year groups (one group per
/// metric, years descending), remaining columns in the order records produce
/// them, then the two trailing-four-quarter headline columns. The column
/// set depends only on the requested years and the calculator settings, so
/// it is the same for any security subset, including an empty one. Rows are
/// sorted by security code.
#[derive(Debug, Clone)]
pub struct ReportAssembler {
    years: Vec<FiscalYear>,
    template: Vec<String>,
}

impl ReportAssembler {
    /// Assembler for a report over `years` with the default calculator
    /// settings.
    pub fn new(years: &[FiscalYear]) -> Self {
        Self::for_calculator(years, &MetricCalculator::default())
    }

    /// Assembler for a report over `years` produced by `calculator`.
    pub fn for_calculator(years: &[FiscalYear], calculator: &MetricCalculator) -> Self {
        Self {
            years: years.to_vec(),
            template: calculator.column_labels(years),
        }
    }

    /// Ordered column labels for `records`, identity columns excluded.
    pub fn metric_columns(&self, records: &[MetricRecord]) -> Vec<String> {
        let years: BTreeSet<FiscalYear> = self
            .years
            .iter()
            .copied()
            .chain(records.iter().flat_map(|r| r.years.iter().map(|y| y.year)))
            .collect();

        let mut ordered: Vec<String> = YearlyMetric::ALL
            .iter()
            .flat_map(|metric| years.iter().rev().map(move |&year| metric.label(year)))
            .collect();

        let mut seen: HashSet<String> = ordered.iter().cloned().collect();
        seen.extend(columns::HEADLINE.iter().map(|c| (*c).to_string()));
        let record_labels = records
            .iter()
            .flat_map(|r| r.numeric_columns().into_iter().map(|(label, _)| label));
        for label in self.template.iter().cloned().chain(record_labels) {
            if seen.insert(label.clone()) {
                ordered.push(label);
            }
        }

        ordered.extend(columns::HEADLINE.iter().map(|c| (*c).to_string()));
        ordered
    }

    /// Assemble the report frame.
    pub fn assemble(&self, records: &[MetricRecord]) -> Result<DataFrame> {
        let labels = self.metric_columns(records);
        let values: Vec<HashMap<String, Option<f64>>> = records
            .iter()
            .map(|r| r.numeric_columns().into_iter().collect())
            .collect();

        let mut frame_columns = vec![
            Column::new(
                columns::CODE.into(),
                records.iter().map(|r| r.code.clone()).collect::<Vec<_>>(),
            ),
            Column::new(
                columns::NAME.into(),
                records.iter().map(|r| r.name.clone()).collect::<Vec<_>>(),
            ),
            Column::new(
                columns::CLOSE_PRICE.into(),
                records.iter().map(|r| r.close_price).collect::<Vec<_>>(),
            ),
            Column::new(
                columns::CLOSE_DATE.into(),
                records.iter().map(|r| r.close_date.clone()).collect::<Vec<_>>(),
            ),
        ];

        for label in &labels {
            let column: Vec<Option<f64>> = values
                .iter()
                .map(|row| row.get(label).copied().flatten())
                .collect();
            frame_columns.push(Column::new(label.as_str().into(), column));
        }

        let df = DataFrame::new(frame_columns)?
            .lazy()
            .sort([columns::CODE], SortMultipleOptions::default())
            .collect()?;

        debug!(rows = df.height(), columns = df.width(), "assembled summary report");
        Ok(df)
    }
}
