//! Derived per-security metrics.
//!
//! [`MetricCalculator`] turns a [`MetricsIndex`](crate::index::MetricsIndex)
//! into one [`MetricRecord`] per security. All arithmetic goes through
//! [`math`], which never substitutes zero for an absent operand.

pub mod calculator;
pub mod math;
pub mod record;

pub use calculator::{CalculatorConfig, MetricCalculator, normalize_years};
pub use record::{MetricRecord, QuarterComparison, TrailingAverages, YearMetrics};
