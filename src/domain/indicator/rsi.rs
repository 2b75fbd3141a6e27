//! RSI (Relative Strength Index) using Wilder's smoothing.
//!
//! First average is the simple mean of the first n gains/losses; after that
//! avg = (prev_avg * (n-1) + current) / n. RSI = 100 - 100 / (1 + gain/loss),
//! and 100 when the average loss is zero. The first n bars are invalid.

use crate::domain::indicator::{invalid_point, valid_point, IndicatorSeries, IndicatorType};
use crate::domain::ohlcv::OhlcvBar;

fn rsi_from(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        100.0
    } else {
        100.0 - (100.0 / (1.0 + avg_gain / avg_loss))
    }
}

pub fn calculate_rsi(bars: &[OhlcvBar], period: usize) -> IndicatorSeries {
    if period == 0 || bars.len() < 2 {
        return IndicatorSeries {
            indicator_type: IndicatorType::Rsi(period),
            values: bars.iter().map(|b| invalid_point(b.date)).collect(),
        };
    }

    let mut values = Vec::with_capacity(bars.len());
    values.push(invalid_point(bars[0].date));

    let mut avg_gain = 0.0;
    let mut avg_loss = 0.0;

    for (i, w) in bars.windows(2).enumerate() {
        let change = w[1].close - w[0].close;
        let gain = change.max(0.0);
        let loss = (-change).max(0.0);

        if i < period {
            avg_gain += gain;
            avg_loss += loss;
            if i + 1 == period {
                avg_gain /= period as f64;
                avg_loss /= period as f64;
                values.push(valid_point(w[1].date, rsi_from(avg_gain, avg_loss)));
            } else {
                values.push(invalid_point(w[1].date));
            }
        } else {
            avg_gain = (avg_gain * (period - 1) as f64 + gain) / period as f64;
            avg_loss = (avg_loss * (period - 1) as f64 + loss) / period as f64;
            values.push(valid_point(w[1].date, rsi_from(avg_gain, avg_loss)));
        }
    }

    IndicatorSeries {
        indicator_type: IndicatorType::Rsi(period),
        values,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::test_support::make_bars;

    #[test]
    fn rsi_empty_bars() {
        assert!(calculate_rsi(&[], 14).is_empty());
    }

    #[test]
    fn rsi_single_bar_invalid() {
        let series = calculate_rsi(&make_bars(&[10.0]), 14);
        assert_eq!(series.len(), 1);
        assert!(!series.values[0].valid);
    }

    #[test]
    fn rsi_warmup_length() {
        let series = calculate_rsi(&make_bars(&[1.0, 2.0, 3.0, 4.0, 5.0]), 3);
        assert_eq!(series.len(), 5);
        assert!(!series.values[0].valid);
        assert!(!series.values[2].valid);
        assert!(series.values[3].valid);
    }

    #[test]
    fn rsi_all_gains_is_100() {
        let series = calculate_rsi(&make_bars(&[1.0, 2.0, 3.0, 4.0, 5.0]), 3);
        assert!((series.values[4].value - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn rsi_all_losses_is_0() {
        let series = calculate_rsi(&make_bars(&[5.0, 4.0, 3.0, 2.0, 1.0]), 3);
        assert!(series.values[4].value.abs() < f64::EPSILON);
    }

    #[test]
    fn rsi_first_value_uses_simple_average() {
        // changes: +2, -1, +1 → avg gain 1, avg loss 1/3
        let series = calculate_rsi(&make_bars(&[10.0, 12.0, 11.0, 12.0]), 3);
        let expected = 100.0 - 100.0 / (1.0 + 1.0 / (1.0 / 3.0));
        assert!((series.values[3].value - expected).abs() < 1e-9);
    }

    #[test]
    fn rsi_wilder_smoothing_after_seed() {
        // seed as above, then change -2
        let series = calculate_rsi(&make_bars(&[10.0, 12.0, 11.0, 12.0, 10.0]), 3);
        let gain = (1.0 * 2.0 + 0.0) / 3.0;
        let loss = ((1.0 / 3.0) * 2.0 + 2.0) / 3.0;
        let expected = 100.0 - 100.0 / (1.0 + gain / loss);
        assert!((series.values[4].value - expected).abs() < 1e-9);
    }
}
