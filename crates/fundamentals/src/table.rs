//! Tabular I/O shared by the ledger builder, the ledger reader, the price
//! listing, and the report exporter.
//!
//! Source extracts are read with every column as text; numeric conversion
//! happens afterwards through [`NumberParser`] so that a single garbage cell
//! never fails a whole file.

use crate::{FundamentalsError, Result};
use polars::prelude::*;
use std::ffi::OsString;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

/// Cell contents that mean "no value" rather than "bad value".
const PLACEHOLDERS: [&str; 8] = ["", "-", "--", "—", "N/A", "NA", "nan", "null"];

/// Read a CSV file with every column typed as text.
///
/// Header names are trimmed and stripped of any byte-order mark. An empty
/// file yields an empty frame.
pub fn read_text_csv(path: &Path) -> Result<DataFrame> {
    if fs::metadata(path)?.len() == 0 {
        return Ok(DataFrame::empty());
    }

    let mut df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?;

    let names: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|name| clean_header(name.as_str()))
        .collect();
    df.set_column_names(names)?;

    Ok(df)
}

fn clean_header(raw: &str) -> String {
    raw.replace('\u{feff}', "").trim().to_string()
}

/// First of `aliases` present in `df`.
pub fn resolve_column<'a>(df: &DataFrame, aliases: &'a [String]) -> Option<&'a str> {
    aliases
        .iter()
        .map(String::as_str)
        .find(|alias| df.get_column_index(alias).is_some())
}

/// Like [`resolve_column`], but a missing column is an error naming `logical`.
pub fn require_column<'a>(
    df: &DataFrame,
    aliases: &'a [String],
    logical: &str,
    path: &Path,
) -> Result<&'a str> {
    resolve_column(df, aliases).ok_or_else(|| FundamentalsError::MissingColumn {
        column: logical.to_string(),
        file: path.display().to_string(),
    })
}

/// Values of a column as optional owned strings, trimmed, with empty cells
/// mapped to `None`.
pub fn text_values(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    let column = df.column(name)?.cast(&DataType::String)?;
    Ok(column
        .str()?
        .into_iter()
        .map(|value| {
            value
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        })
        .collect())
}

/// Tolerant numeric parser that counts cells it had to discard.
#[derive(Debug, Default, Clone, Copy)]
pub struct NumberParser {
    malformed: usize,
}

impl NumberParser {
    /// Create a parser with a zeroed malformed counter.
    pub const fn new() -> Self {
        Self { malformed: 0 }
    }

    /// Parse one cell.
    ///
    /// Thousands separators, whitespace, and control characters are removed
    /// first. Placeholders yield `None` silently; anything else that still
    /// fails to parse yields `None` and is counted as malformed.
    pub fn parse(&mut self, raw: Option<&str>) -> Option<f64> {
        let cleaned: String = raw?
            .chars()
            .filter(|c| !c.is_whitespace() && !c.is_control() && *c != ',' && *c != '\u{feff}')
            .collect();

        if PLACEHOLDERS.iter().any(|p| cleaned.eq_ignore_ascii_case(p)) {
            return None;
        }

        match cleaned.parse::<f64>() {
            Ok(value) if value.is_finite() => Some(value),
            _ => {
                self.malformed += 1;
                None
            }
        }
    }

    /// Number of malformed cells seen so far.
    pub const fn malformed(&self) -> usize {
        self.malformed
    }
}

/// Parse one cell without tracking malformed values.
pub fn parse_number(raw: Option<&str>) -> Option<f64> {
    NumberParser::new().parse(raw)
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

fn staging_path(path: &Path) -> PathBuf {
    let mut staged = OsString::from(path.as_os_str());
    staged.push(".tmp");
    PathBuf::from(staged)
}

/// Write `df` as UTF-8 CSV with a byte-order mark.
///
/// The frame is written to a sibling staging file and renamed into place,
/// so readers observe either the old or the new file in full.
pub fn write_csv_atomic(df: &mut DataFrame, path: &Path) -> Result<()> {
    ensure_parent(path)?;
    let staged = staging_path(path);
    {
        let mut file = File::create(&staged)?;
        CsvWriter::new(&mut file)
            .include_bom(true)
            .include_header(true)
            .finish(df)?;
        file.sync_all()?;
    }
    fs::rename(&staged, path)?;
    Ok(())
}

/// Write `df` as a JSON array of records, keeping column order.
pub fn write_json_records(df: &mut DataFrame, path: &Path) -> Result<()> {
    ensure_parent(path)?;
    let staged = staging_path(path);
    {
        let mut file = File::create(&staged)?;
        JsonWriter::new(&mut file)
            .with_json_format(JsonFormat::Json)
            .finish(df)?;
        file.sync_all()?;
    }
    fs::rename(&staged, path)?;
    Ok(())
}

/// Serialize `value` as pretty JSON at `path`.
pub fn write_json_value<T: serde::Serialize>(value: &T, path: &Path) -> Result<()> {
    ensure_parent(path)?;
    let staged = staging_path(path);
    fs::write(&staged, serde_json::to_string_pretty(value)?)?;
    fs::rename(&staged, path)?;
    Ok(())
}
