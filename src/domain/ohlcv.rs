//! OHLCV bar representation.

use chrono::NaiveDate;

use super::error::CointraderError;

#[derive(Debug, Clone, PartialEq)]
pub struct OhlcvBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl OhlcvBar {
    /// max(high - low, |high - prev_close|, |low - prev_close|)
    pub fn true_range(&self, prev_close: f64) -> f64 {
        let hl = self.high - self.low;
        let hc = (self.high - prev_close).abs();
        let lc = (self.low - prev_close).abs();
        hl.max(hc).max(lc)
    }

    /// Rejects bars the engine cannot make a sound decision on: non-finite
    /// prices, a non-positive close, low above high, or a close outside the
    /// intrabar range.
    pub fn validate(&self) -> Result<(), CointraderError> {
        let fields = [
            ("open", self.open),
            ("high", self.high),
            ("low", self.low),
            ("close", self.close),
        ];
        for (name, value) in fields {
            if !value.is_finite() {
                return Err(CointraderError::InconsistentBar {
                    date: self.date,
                    reason: format!("{name} is not a finite number"),
                });
            }
        }
        if self.close <= 0.0 {
            return Err(CointraderError::InconsistentBar {
                date: self.date,
                reason: format!("close must be positive, got {}", self.close),
            });
        }
        if self.low > self.high {
            return Err(CointraderError::InconsistentBar {
                date: self.date,
                reason: format!("low {} above high {}", self.low, self.high),
            });
        }
        if self.close < self.low || self.close > self.high {
            return Err(CointraderError::InconsistentBar {
                date: self.date,
                reason: format!(
                    "close {} outside range [{}, {}]",
                    self.close, self.low, self.high
                ),
            });
        }
        Ok(())
    }
}

/// Checks that `bars` is strictly ascending by date.
pub fn ensure_ascending(bars: &[OhlcvBar]) -> Result<(), CointraderError> {
    for (i, w) in bars.windows(2).enumerate() {
        if w[1].date <= w[0].date {
            return Err(CointraderError::NonAscendingDates {
                index: i + 1,
                previous: w[0].date,
                current: w[1].date,
            });
        }
    }
    Ok(())
}
