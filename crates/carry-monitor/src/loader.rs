//! CSV price files: `date,open,high,low,close,volume`, where only `date`
//! and `close` are required.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use analysis_core::{Bar, PriceSeries};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct CsvBar {
    date: NaiveDate,
    #[serde(default)]
    open: Option<f64>,
    #[serde(default)]
    high: Option<f64>,
    #[serde(default)]
    low: Option<f64>,
    close: f64,
    #[serde(default)]
    volume: Option<f64>,
}

impl From<CsvBar> for Bar {
    fn from(row: CsvBar) -> Self {
        Bar {
            date: row.date,
            open: row.open,
            high: row.high,
            low: row.low,
            close: row.close,
            volume: row.volume,
        }
    }
}

/// Parse price rows in any date order; duplicate dates are rejected.
pub fn read_prices<R: Read>(symbol: &str, reader: R) -> Result<PriceSeries> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut bars = Vec::new();
    for (line, row) in reader.deserialize::<CsvBar>().enumerate() {
        let row = row.with_context(|| format!("{}: bad row {}", symbol, line + 1))?;
        bars.push(Bar::from(row));
    }
    bars.sort_by_key(|b| b.date);

    debug!("{}: loaded {} bars", symbol, bars.len());
    PriceSeries::new(symbol, bars).with_context(|| format!("{}: invalid price history", symbol))
}

pub fn load_prices(symbol: &str, path: &Path) -> Result<PriceSeries> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    read_prices(symbol, file)
}
