//! Exponential Moving Average indicator.
//!
//! k = 2/(n+1). The average starts at the first close and then follows
//! EMA[i] = C[i]*k + EMA[i-1]*(1-k), so every point is valid.

use crate::domain::indicator::{valid_point, IndicatorSeries, IndicatorType};
use crate::domain::ohlcv::OhlcvBar;

pub fn calculate_ema(bars: &[OhlcvBar], period: usize) -> IndicatorSeries {
    let Some(first) = bars.first() else {
        return IndicatorSeries::empty(IndicatorType::Ema(period));
    };
    if period == 0 {
        return IndicatorSeries::empty(IndicatorType::Ema(period));
    }

    let k = 2.0 / (period as f64 + 1.0);
    let mut ema = first.close;
    let mut values = Vec::with_capacity(bars.len());
    values.push(valid_point(first.date, ema));

    for bar in &bars[1..] {
        ema = bar.close * k + ema * (1.0 - k);
        values.push(valid_point(bar.date, ema));
    }

    IndicatorSeries {
        indicator_type: IndicatorType::Ema(period),
        values,
    }
}
