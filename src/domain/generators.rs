//! Signal generators.
//!
//! Each generator emits exactly one [`Signal`] per input bar.

use tracing::warn;

use super::indicator::ema::calculate_ema;
use super::indicator::rsi::calculate_rsi;
use super::indicator::sma::calculate_sma;
use super::indicator::IndicatorSeries;
use super::ohlcv::OhlcvBar;
use super::signal::Signal;
use super::strategy::SignalGenerator;

/// Enter on the first bar and exit on the last.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuyAndHold;

impl SignalGenerator for BuyAndHold {
    fn kind(&self) -> &'static str {
        "BuyAndHoldStrategy"
    }

    fn generate(&self, bars: &[OhlcvBar]) -> Vec<Signal> {
        let mut signals = vec![Signal::Hold; bars.len()];
        if bars.len() < 2 {
            warn!(bars = bars.len(), "buy-and-hold needs at least two bars, holding cash");
            return signals;
        }
        signals[0] = Signal::Enter;
        if let Some(last) = signals.last_mut() {
            *last = Signal::Exit;
        }
        signals
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovingAverageKind {
    Simple,
    Exponential,
}

impl MovingAverageKind {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.to_ascii_uppercase().as_str() {
            "SMA" => Some(MovingAverageKind::Simple),
            "EMA" => Some(MovingAverageKind::Exponential),
            _ => None,
        }
    }

    fn series(self, bars: &[OhlcvBar], window: usize) -> IndicatorSeries {
        match self {
            MovingAverageKind::Simple => calculate_sma(bars, window),
            MovingAverageKind::Exponential => calculate_ema(bars, window),
        }
    }
}

/// Long while the short average is above the long one.
///
/// The trend is +1 only when both averages are past their warmup and
/// short > long, otherwise -1. A signal fires where the trend flips.
#[derive(Debug, Clone, Copy)]
pub struct MovingAverageCrossover {
    pub ma_kind: MovingAverageKind,
    pub short_window: usize,
    pub long_window: usize,
}

impl SignalGenerator for MovingAverageCrossover {
    fn kind(&self) -> &'static str {
        "MovingAverageCrossover"
    }

    fn generate(&self, bars: &[OhlcvBar]) -> Vec<Signal> {
        let short = self.ma_kind.series(bars, self.short_window);
        let long = self.ma_kind.series(bars, self.long_window);

        let trend: Vec<bool> = (0..bars.len())
            .map(|i| match (short.value_at(i), long.value_at(i)) {
                (Some(s), Some(l)) => s > l,
                _ => false,
            })
            .collect();

        let mut signals = vec![Signal::Hold; bars.len()];
        for (i, w) in trend.windows(2).enumerate() {
            signals[i + 1] = match (w[0], w[1]) {
                (false, true) => Signal::Enter,
                (true, false) => Signal::Exit,
                _ => Signal::Hold,
            };
        }
        signals
    }
}

/// Mean-reversion on RSI threshold crossings.
///
/// Enter when RSI crosses up through `oversold`, exit when it crosses down
/// through `overbought`.
#[derive(Debug, Clone, Copy)]
pub struct RsiThreshold {
    pub period: usize,
    pub oversold: f64,
    pub overbought: f64,
}

impl SignalGenerator for RsiThreshold {
    fn kind(&self) -> &'static str {
        "RsiThreshold"
    }

    fn generate(&self, bars: &[OhlcvBar]) -> Vec<Signal> {
        let rsi = calculate_rsi(bars, self.period);
        let mut signals = vec![Signal::Hold; bars.len()];
        for i in 1..bars.len() {
            let (Some(prev), Some(cur)) = (rsi.value_at(i - 1), rsi.value_at(i)) else {
                continue;
            };
            if prev < self.oversold && cur >= self.oversold {
                signals[i] = Signal::Enter;
            } else if prev > self.overbought && cur <= self.overbought {
                signals[i] = Signal::Exit;
            }
        }
        signals
    }
}
