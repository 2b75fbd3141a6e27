//! Average True Range with Wilder smoothing.
//!
//! The first bar's true range is high - low. ATR starts at that value and
//! then follows ATR[i] = ATR[i-1] + (TR[i] - ATR[i-1]) / n, so every point
//! is valid.

use crate::domain::indicator::{valid_point, IndicatorSeries, IndicatorType};
use crate::domain::ohlcv::OhlcvBar;

pub fn calculate_atr(bars: &[OhlcvBar], period: usize) -> IndicatorSeries {
    if period == 0 || bars.is_empty() {
        return IndicatorSeries::empty(IndicatorType::Atr(period));
    }

    let alpha = 1.0 / period as f64;
    let mut values = Vec::with_capacity(bars.len());
    let mut atr = bars[0].high - bars[0].low;
    values.push(valid_point(bars[0].date, atr));

    for w in bars.windows(2) {
        let tr = w[1].true_range(w[0].close);
        atr += alpha * (tr - atr);
        values.push(valid_point(w[1].date, atr));
    }

    IndicatorSeries {
        indicator_type: IndicatorType::Atr(period),
        values,
    }
}
