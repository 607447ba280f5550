//! End-to-end summary report generation over a prebuilt ledger.

use crate::{
    Result,
    config::EngineConfig,
    index::MetricsIndex,
    ledger::read_ledger,
    metrics::{MetricCalculator, normalize_years},
    period::FiscalYear,
    prices::PriceListing,
    report::{ReportAssembler, ReportExporter},
};
use polars::prelude::DataFrame;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Loads the ledger, derives metrics, and assembles the wide report.
#[derive(Debug, Clone)]
pub struct SummaryReportGenerator {
    config: EngineConfig,
    calculator: MetricCalculator,
}

impl SummaryReportGenerator {
    /// Generator over the artifacts named in `config`.
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            config: config.clone(),
            calculator: MetricCalculator::default(),
        }
    }

    /// Replace the metric calculator.
    pub fn with_calculator(mut self, calculator: MetricCalculator) -> Self {
        self.calculator = calculator;
        self
    }

    /// Build the report frame for `years` without writing it.
    pub fn generate(&self, years: &[FiscalYear]) -> Result<DataFrame> {
        let years = normalize_years(years)?;

        let rows = read_ledger(&self.config.ledger_file)?;
        info!(path = %self.config.ledger_file.display(), rows = rows.len(), "loaded ledger");

        let index = MetricsIndex::from_rows(&rows);
        let (eps, profit, equity, dividend) = index.sizes();
        debug!(eps, profit, equity, dividend, "built lookups");

        let prices = PriceListing::load_or_warn(&self.config.price_file, &self.config.schema);
        if prices.is_none() {
            warn!("report has no close prices; yields and names will be empty");
        }

        let records = self.calculator.calculate(&index, &years, prices.as_ref())?;
        ReportAssembler::for_calculator(&years, &self.calculator).assemble(&records)
    }

    /// Generate the report for `years` and export it. Returns the frame that
    /// was written.
    pub fn run(&self, years: &[FiscalYear]) -> Result<DataFrame> {
        let started = Instant::now();
        let mut report = self.generate(years)?;
        ReportExporter::from_config(&self.config).export(&mut report)?;
        info!(
            securities = report.height(),
            columns = report.width(),
            seconds = started.elapsed().as_secs_f64(),
            "summary report complete"
        );
        Ok(report)
    }
}
