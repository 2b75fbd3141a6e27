#![allow(dead_code)]

use chrono::NaiveDate;
use cointrader::domain::error::CointraderError;
pub use cointrader::domain::ohlcv::OhlcvBar;
use cointrader::domain::risk::RiskParameters;
use cointrader::domain::signal::{Signal, SignalBar};
use cointrader::ports::data_port::DataPort;

pub struct MockDataPort {
    pub bars: Vec<OhlcvBar>,
    pub error: Option<String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            bars: Vec::new(),
            error: None,
        }
    }

    pub fn with_bars(mut self, bars: Vec<OhlcvBar>) -> Self {
        self.bars = bars;
        self
    }

    pub fn with_error(mut self, reason: &str) -> Self {
        self.error = Some(reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_ohlcv(
        &self,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Vec<OhlcvBar>, CointraderError> {
        if let Some(reason) = &self.error {
            return Err(CointraderError::data(reason.clone()));
        }
        Ok(self
            .bars
            .iter()
            .filter(|b| start_date.is_none_or(|s| b.date >= s))
            .filter(|b| end_date.is_none_or(|e| b.date <= e))
            .cloned()
            .collect())
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn day(i: usize) -> NaiveDate {
    date(2024, 1, 1) + chrono::Duration::days(i as i64)
}

/// Bar with explicit range on day `i`.
pub fn ohlc(i: usize, open: f64, high: f64, low: f64, close: f64) -> OhlcvBar {
    OhlcvBar {
        date: day(i),
        open,
        high,
        low,
        close,
        volume: 1_000.0,
    }
}

/// Flat bar where every price equals `close`.
pub fn make_bar(i: usize, close: f64) -> OhlcvBar {
    ohlc(i, close, close, close, close)
}

pub fn make_bars(closes: &[f64]) -> Vec<OhlcvBar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &c)| make_bar(i, c))
        .collect()
}

pub fn signal_bar(bar: OhlcvBar, signal: i8, size: f64) -> SignalBar {
    SignalBar {
        bar,
        signal: Signal::try_from(signal).unwrap(),
        position_size: size,
    }
}

pub fn risk(stop: f64, take: f64, fee: f64) -> RiskParameters {
    RiskParameters::new(stop, take, fee).unwrap()
}

pub fn no_risk() -> RiskParameters {
    risk(0.0, 0.0, 0.0)
}

pub fn csv_content(bars: &[OhlcvBar]) -> String {
    let mut out = String::from("Date,Open,High,Low,Close,Volume\n");
    for b in bars {
        out.push_str(&format!(
            "{},{},{},{},{},{}\n",
            b.date, b.open, b.high, b.low, b.close, b.volume
        ));
    }
    out
}
