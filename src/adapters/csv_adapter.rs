//! CSV file market data adapter.
//!
//! Reads `Date,Open,High,Low,Close,Volume` files. Rows with an empty or
//! non-finite close (`NaN`, `inf`) are dropped; everything else must parse.

use crate::domain::error::CointraderError;
use crate::domain::ohlcv::OhlcvBar;
use crate::ports::data_port::DataPort;
use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CsvRow {
    #[serde(alias = "date")]
    date: String,
    #[serde(alias = "open")]
    open: f64,
    #[serde(alias = "high")]
    high: f64,
    #[serde(alias = "low")]
    low: f64,
    #[serde(alias = "close")]
    close: Option<f64>,
    #[serde(alias = "volume", default)]
    volume: Option<f64>,
}

pub struct CsvAdapter {
    path: PathBuf,
}

impl CsvAdapter {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn parse_date(raw: &str) -> Result<NaiveDate, CointraderError> {
        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|dt| dt.date()))
            .map_err(|e| CointraderError::data(format!("invalid date '{raw}': {e}")))
    }
}

impl DataPort for CsvAdapter {
    fn fetch_ohlcv(
        &self,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Vec<OhlcvBar>, CointraderError> {
        let file = File::open(&self.path).map_err(|e| {
            CointraderError::data(format!("failed to read {}: {}", self.path.display(), e))
        })?;

        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(file);
        let mut bars = Vec::new();
        let mut dropped = 0usize;

        for (line, result) in rdr.deserialize::<CsvRow>().enumerate() {
            let row = result.map_err(|e| {
                CointraderError::data(format!("CSV parse error in {}: {}", self.path.display(), e))
            })?;

            let Some(close) = row.close.filter(|c| c.is_finite()) else {
                dropped += 1;
                continue;
            };
            let date = Self::parse_date(&row.date).map_err(|e| {
                CointraderError::data(format!("row {}: {}", line + 1, e))
            })?;

            if start_date.is_some_and(|s| date < s) || end_date.is_some_and(|e| date > e) {
                continue;
            }

            bars.push(OhlcvBar {
                date,
                open: row.open,
                high: row.high,
                low: row.low,
                close,
                volume: row.volume.unwrap_or(0.0),
            });
        }

        bars.sort_by_key(|b| b.date);
        debug!(
            path = %self.path.display(),
            bars = bars.len(),
            dropped,
            "loaded market data"
        );
        Ok(bars)
    }
}
