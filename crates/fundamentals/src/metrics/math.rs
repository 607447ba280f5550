//! Absent-aware arithmetic for derived metrics.
//!
//! Every helper returns `None` instead of panicking, dividing by zero, or
//! substituting zero for a missing operand.

use crate::period::{FiscalPeriod, QuarterKey};

/// Round to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// `numerator / denominator × 100`, rounded to two decimals.
pub fn percent_ratio(numerator: Option<f64>, denominator: Option<f64>) -> Option<f64> {
    let (numerator, denominator) = (numerator?, denominator?);
    if denominator == 0.0 {
        return None;
    }
    let ratio = numerator / denominator * 100.0;
    ratio.is_finite().then(|| round2(ratio))
}

/// `(current − previous) / |previous| × 100`, rounded to two decimals.
pub fn percent_change(current: Option<f64>, previous: Option<f64>) -> Option<f64> {
    let (current, previous) = (current?, previous?);
    if previous == 0.0 {
        return None;
    }
    let change = (current - previous) / previous.abs() * 100.0;
    change.is_finite().then(|| round2(change))
}

/// Mean of beginning and ending balances, falling back to whichever one is
/// present.
pub fn average_balance(beginning: Option<f64>, ending: Option<f64>) -> Option<f64> {
    match (beginning, ending) {
        (Some(beginning), Some(ending)) => Some((beginning + ending) / 2.0),
        (None, Some(only)) | (Some(only), None) => Some(only),
        (None, None) => None,
    }
}

/// Mean of the `window` entries following the first (current) one, ignoring
/// absent entries. `None` if nothing remains.
pub fn trailing_average(series: &[Option<f64>], window: usize) -> Option<f64> {
    let values: Vec<f64> = series.iter().skip(1).take(window).flatten().copied().collect();
    if values.is_empty() {
        return None;
    }
    Some(round2(values.iter().sum::<f64>() / values.len() as f64))
}

/// Back out single-quarter figures from cumulative ones.
///
/// `cumulative` is ordered oldest to newest; the result has one entry per
/// element after the first. A `Q1` figure is already single-quarter. Later
/// quarters subtract the preceding cumulative figure of the same fiscal
/// year; when that figure is absent, or the pair straddles a fiscal-year
/// boundary, the result is absent.
pub fn single_quarter_values(cumulative: &[(QuarterKey, Option<f64>)]) -> Vec<Option<f64>> {
    cumulative
        .windows(2)
        .map(|pair| {
            let (prev_key, prev) = pair[0];
            let (key, current) = pair[1];
            if key.quarter == FiscalPeriod::Q1 {
                current
            } else if key.year == prev_key.year {
                Some(current? - prev?)
            } else {
                None
            }
        })
        .collect()
}

/// Sum of present values, or `None` when none are present.
pub fn sum_present(values: &[Option<f64>]) -> Option<f64> {
    values
        .iter()
        .flatten()
        .copied()
        .reduce(|acc, v| acc + v)
        .map(round2)
}
