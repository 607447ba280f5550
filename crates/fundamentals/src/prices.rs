//! Latest close-price listing.
//!
//! The listing defines the valid-security universe for the ledger and
//! supplies names and prices for the summary report.

use crate::{
    Result,
    config::SourceSchema,
    table::{parse_number, read_text_csv, require_column, resolve_column, text_values},
};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use tracing::{info, warn};

/// Most recent close for one security.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceQuote {
    /// Security name, empty when the listing has none
    pub name: String,
    /// Close price
    pub price: Option<f64>,
    /// Close date as printed in the listing
    pub date: Option<String>,
}

/// Close-price listing keyed by security code.
#[derive(Debug, Clone, Default)]
pub struct PriceListing {
    quotes: BTreeMap<String, PriceQuote>,
}

impl PriceListing {
    /// Load the listing at `path`.
    ///
    /// Returns `Ok(None)` when the file does not exist. Duplicate codes keep
    /// the first row.
    pub fn load(path: &Path, schema: &SourceSchema) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }

        let df = read_text_csv(path)?;
        if df.height() == 0 {
            return Ok(Some(Self::default()));
        }

        let codes = text_values(&df, require_column(&df, &schema.code, "code", path)?)?;
        let names = optional_values(&df, &schema.name, df.height())?;
        let prices = optional_values(&df, &schema.price, df.height())?;
        let dates = optional_values(&df, &schema.date, df.height())?;

        let mut quotes = BTreeMap::new();
        for (((code, name), price), date) in codes.into_iter().zip(names).zip(prices).zip(dates) {
            let Some(code) = code else { continue };
            quotes.entry(code).or_insert_with(|| PriceQuote {
                name: name.unwrap_or_default(),
                price: parse_number(price.as_deref()),
                date,
            });
        }

        info!(securities = quotes.len(), path = %path.display(), "loaded close-price listing");
        Ok(Some(Self { quotes }))
    }

    /// Load the listing, degrading to `None` (with a warning) when it is
    /// missing, empty, or unreadable.
    pub fn load_or_warn(path: &Path, schema: &SourceSchema) -> Option<Self> {
        match Self::load(path, schema) {
            Ok(Some(listing)) if !listing.is_empty() => Some(listing),
            Ok(Some(_)) => {
                warn!(path = %path.display(), "close-price listing is empty");
                None
            }
            Ok(None) => {
                warn!(path = %path.display(), "close-price listing not found");
                None
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to read close-price listing");
                None
            }
        }
    }

    /// Build a listing from in-memory quotes.
    pub fn from_quotes(quotes: impl IntoIterator<Item = (String, PriceQuote)>) -> Self {
        let mut map = BTreeMap::new();
        for (code, quote) in quotes {
            map.entry(code).or_insert(quote);
        }
        Self { quotes: map }
    }

    /// Quote for `code`.
    pub fn get(&self, code: &str) -> Option<&PriceQuote> {
        self.quotes.get(code)
    }

    /// Set of listed codes.
    pub fn codes(&self) -> BTreeSet<String> {
        self.quotes.keys().cloned().collect()
    }

    /// Number of listed securities.
    pub fn len(&self) -> usize {
        self.quotes.len()
    }

    /// Whether the listing has no securities.
    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }
}

fn optional_values(
    df: &polars::prelude::DataFrame,
    aliases: &[String],
    height: usize,
) -> Result<Vec<Option<String>>> {
    match resolve_column(df, aliases) {
        Some(name) => text_values(df, name),
        None => Ok(vec![None; height]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_load_listing_with_english_headers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("latest_stock_prices.csv");
        fs::write(
            &path,
            "\u{feff}stock_code,stock_name,price,market,date\n\
             2330,TSMC,\"1,005.00\",sii,2025-03-03\n\
             1101,Taiwan Cement,-,sii,2025-03-03\n\
             2330,Duplicate,1.00,sii,2025-03-01\n",
        )
        .unwrap();

        let listing = PriceListing::load(&path, &SourceSchema::default())
            .unwrap()
            .unwrap();

        assert_eq!(listing.len(), 2);
        let tsmc = listing.get("2330").unwrap();
        assert_eq!(tsmc.name, "TSMC");
        assert_eq!(tsmc.price, Some(1005.0));
        assert_eq!(tsmc.date.as_deref(), Some("2025-03-03"));
        assert_eq!(listing.get("1101").unwrap().price, None);
    }

    #[test]
    fn test_load_listing_with_local_headers_and_no_date() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prices.csv");
        fs::write(&path, "代號,名稱,收盤價\n2317,鴻海,150.5\n").unwrap();

        let listing = PriceListing::load(&path, &SourceSchema::default())
            .unwrap()
            .unwrap();
        let quote = listing.get("2317").unwrap();
        assert_eq!(quote.name, "鴻海");
        assert_eq!(quote.price, Some(150.5));
        assert_eq!(quote.date, None);
    }

    #[test]
    fn test_missing_listing_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.csv");
        assert!(PriceListing::load(&path, &SourceSchema::default()).unwrap().is_none());
        assert!(PriceListing::load_or_warn(&path, &SourceSchema::default()).is_none());
    }

    #[test]
    fn test_empty_listing_degrades_to_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prices.csv");
        fs::write(&path, "stock_code,price\n").unwrap();
        assert!(PriceListing::load_or_warn(&path, &SourceSchema::default()).is_none());
    }
}
