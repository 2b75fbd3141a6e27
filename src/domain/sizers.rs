//! Position sizers.
//!
//! Sizes are percentages of available cash. A bar whose signal is Hold
//! always gets size 0.

use super::indicator::atr::calculate_atr;
use super::ohlcv::OhlcvBar;
use super::signal::Signal;
use super::strategy::PositionSizer;

/// Same percentage on every signal bar.
#[derive(Debug, Clone, Copy)]
pub struct FixedPositionSizer {
    pub fixed_size_pct: f64,
}

impl Default for FixedPositionSizer {
    fn default() -> Self {
        FixedPositionSizer {
            fixed_size_pct: 100.0,
        }
    }
}

impl PositionSizer for FixedPositionSizer {
    fn kind(&self) -> &'static str {
        "FixedPositionSizer"
    }

    fn size(&self, _bars: &[OhlcvBar], signals: &[Signal]) -> Vec<f64> {
        signals
            .iter()
            .map(|s| if s.is_hold() { 0.0 } else { self.fixed_size_pct })
            .collect()
    }
}

/// Volatility-scaled sizing.
///
/// size = risk_factor * 100 / (ATR / close), clipped to
/// [0, max_position_size]. A zero ATR gets the maximum.
#[derive(Debug, Clone, Copy)]
pub struct AtrPositionSizer {
    pub atr_period: usize,
    pub risk_factor: f64,
    pub max_position_size: f64,
}

impl Default for AtrPositionSizer {
    fn default() -> Self {
        AtrPositionSizer {
            atr_period: 14,
            risk_factor: 0.02,
            max_position_size: 100.0,
        }
    }
}

impl AtrPositionSizer {
    fn size_for(&self, atr: f64, close: f64) -> f64 {
        if atr <= 0.0 {
            return self.max_position_size;
        }
        let raw = self.risk_factor * 100.0 / (atr / close);
        raw.clamp(0.0, self.max_position_size)
    }
}

impl PositionSizer for AtrPositionSizer {
    fn kind(&self) -> &'static str {
        "AtrPositionSizer"
    }

    fn size(&self, bars: &[OhlcvBar], signals: &[Signal]) -> Vec<f64> {
        let atr = calculate_atr(bars, self.atr_period);
        signals
            .iter()
            .zip(bars)
            .enumerate()
            .map(|(i, (signal, bar))| {
                if signal.is_hold() {
                    0.0
                } else {
                    atr.value_at(i)
                        .map_or(self.max_position_size, |a| self.size_for(a, bar.close))
                }
            })
            .collect()
    }
}
