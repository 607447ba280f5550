//! Fiscal period tags and quarter arithmetic.
//!
//! Quarterly statement periods (`Q1`..`Q4`) and the annual dividend
//! declaration tag (`Y1`) share one ledger column but live in disjoint
//! namespaces.

use crate::{FundamentalsError, Result};
use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Fiscal year in the data source's local calendar.
pub type FiscalYear = i32;

/// Period tag of a ledger row.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FiscalPeriod {
    /// First quarter, cumulative from the start of the fiscal year
    Q1,
    /// Second quarter, cumulative
    Q2,
    /// Third quarter, cumulative
    Q3,
    /// Fourth quarter, cumulative (full-year figure)
    Q4,
    /// Annual dividend declaration
    Y1,
}

impl FiscalPeriod {
    /// The four quarterly tags in calendar order.
    pub const QUARTERS: [Self; 4] = [Self::Q1, Self::Q2, Self::Q3, Self::Q4];

    /// Sort ordinal used by the ledger: quarters map to 1..=4 and the
    /// dividend tag to 0, so a descending sort lists it after `Q1`.
    pub const fn ordinal(self) -> i32 {
        match self {
            Self::Q1 => 1,
            Self::Q2 => 2,
            Self::Q3 => 3,
            Self::Q4 => 4,
            Self::Y1 => 0,
        }
    }

    /// Whether this is one of `Q1`..`Q4`.
    pub const fn is_quarter(self) -> bool {
        !matches!(self, Self::Y1)
    }

    /// Canonical text tag.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Q1 => "Q1",
            Self::Q2 => "Q2",
            Self::Q3 => "Q3",
            Self::Q4 => "Q4",
            Self::Y1 => "Y1",
        }
    }

    /// Parse a quarter tag as found in statement extracts.
    ///
    /// Accepts `Q1`..`Q4` in any case as well as bare quarter numbers
    /// (`1`, `01`, ...). Returns `None` for anything else, including `Y1`.
    pub fn parse_quarter(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        let digits = trimmed
            .strip_prefix('Q')
            .or_else(|| trimmed.strip_prefix('q'))
            .unwrap_or(trimmed);
        match digits.parse::<u8>().ok()? {
            1 => Some(Self::Q1),
            2 => Some(Self::Q2),
            3 => Some(Self::Q3),
            4 => Some(Self::Q4),
            _ => None,
        }
    }
}

impl FromStr for FiscalPeriod {
    type Err = FundamentalsError;

    fn from_str(s: &str) -> Result<Self> {
        if s.trim().eq_ignore_ascii_case("Y1") {
            return Ok(Self::Y1);
        }
        Self::parse_quarter(s).ok_or_else(|| FundamentalsError::InvalidPeriod(s.to_string()))
    }
}

/// A specific fiscal quarter, e.g. `113Q2`.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[display("{year}{quarter}")]
pub struct QuarterKey {
    /// Fiscal year
    pub year: FiscalYear,
    /// Quarter tag, always one of `Q1`..`Q4`
    pub quarter: FiscalPeriod,
}

impl QuarterKey {
    /// Create a key for `year` and `quarter`.
    pub const fn new(year: FiscalYear, quarter: FiscalPeriod) -> Self {
        Self { year, quarter }
    }

    /// The immediately preceding quarter, crossing year boundaries.
    pub const fn prev(self) -> Self {
        match self.quarter {
            FiscalPeriod::Q2 => Self::new(self.year, FiscalPeriod::Q1),
            FiscalPeriod::Q3 => Self::new(self.year, FiscalPeriod::Q2),
            FiscalPeriod::Q4 => Self::new(self.year, FiscalPeriod::Q3),
            FiscalPeriod::Q1 | FiscalPeriod::Y1 => Self::new(self.year - 1, FiscalPeriod::Q4),
        }
    }

    /// Same quarter one fiscal year earlier.
    pub const fn year_ago(self) -> Self {
        Self::new(self.year - 1, self.quarter)
    }

    /// `count` consecutive quarters ending just before `self`, newest first.
    pub fn preceding(self, count: usize) -> Vec<Self> {
        std::iter::successors(Some(self.prev()), |q| Some(q.prev()))
            .take(count)
            .collect()
    }
}
