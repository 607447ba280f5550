//! Error types for ledger construction and report generation.

use thiserror::Error;

/// Result type for fundamentals operations.
pub type Result<T> = std::result::Result<T, FundamentalsError>;

/// Errors that abort a precomputation or report run.
///
/// Degraded inputs (a missing balance sheet, an unparseable cell, a division
/// by zero) are never errors; they surface as absent values instead.
#[derive(Debug, Error)]
pub enum FundamentalsError {
    /// The income-statement extract for a requested fiscal year does not exist
    #[error("Income statement extract missing for fiscal year {year}: {path}")]
    MissingIncomeStatement {
        /// Fiscal year that was requested
        year: i32,
        /// Path that was probed
        path: String,
    },

    /// Year discovery found no income-statement extracts at all
    #[error("No income statement extracts found in {0}")]
    NoSourceYears(String),

    /// Missing required column in a source file
    #[error("Missing required column {column} in {file}")]
    MissingColumn {
        /// Logical column name
        column: String,
        /// File that was being read
        file: String,
    },

    /// The ledger artifact has not been built yet
    #[error("Ledger not found: {0} (run `precompute` first)")]
    LedgerNotFound(String),

    /// Unrecognized fiscal period tag
    #[error("Invalid fiscal period: {0}")]
    InvalidPeriod(String),

    /// Invalid configuration or request parameters
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Filesystem error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars DataFrame error
    #[error("DataFrame error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
