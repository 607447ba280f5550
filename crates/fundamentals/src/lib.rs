#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/fundamentals/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod columns;
pub mod config;
pub mod error;
pub mod index;
pub mod ledger;
pub mod metrics;
pub mod period;
pub mod pipeline;
pub mod prices;
pub mod report;
pub mod table;

// Re-export core types
pub use config::{EngineConfig, SourceSchema, recent_fiscal_years};
pub use error::{FundamentalsError, Result};
pub use index::MetricsIndex;
pub use ledger::{LedgerRow, LongTableBuilder, UpdateManifest, read_ledger};
pub use metrics::{CalculatorConfig, MetricCalculator, MetricRecord};
pub use period::{FiscalPeriod, FiscalYear, QuarterKey};
pub use pipeline::SummaryReportGenerator;
pub use prices::{PriceListing, PriceQuote};
pub use report::{ReportAssembler, ReportExporter};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
