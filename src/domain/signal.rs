//! Per-bar trading signals and the annotated bar consumed by the engine.

use std::fmt;

use super::error::CointraderError;
use super::ohlcv::OhlcvBar;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Signal {
    Exit,
    #[default]
    Hold,
    Enter,
}

impl Signal {
    pub fn as_i8(self) -> i8 {
        match self {
            Signal::Exit => -1,
            Signal::Hold => 0,
            Signal::Enter => 1,
        }
    }

    pub fn is_hold(self) -> bool {
        self == Signal::Hold
    }
}

impl TryFrom<i8> for Signal {
    type Error = CointraderError;

    fn try_from(value: i8) -> Result<Self, Self::Error> {
        match value {
            -1 => Ok(Signal::Exit),
            0 => Ok(Signal::Hold),
            1 => Ok(Signal::Enter),
            other => Err(CointraderError::data(format!(
                "signal must be -1, 0 or 1, got {other}"
            ))),
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_i8())
    }
}

/// A market bar annotated with the strategy's instruction for it.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalBar {
    pub bar: OhlcvBar,
    pub signal: Signal,
    /// Percentage of available cash to commit on entry, in [0, 100].
    pub position_size: f64,
}

/// Zips bars with their signal and size series.
///
/// The three inputs must be aligned one-to-one; every size must lie in
/// [0, 100].
pub fn annotate(
    bars: &[OhlcvBar],
    signals: &[Signal],
    sizes: &[f64],
) -> Result<Vec<SignalBar>, CointraderError> {
    if signals.len() != bars.len() || sizes.len() != bars.len() {
        return Err(CointraderError::data(format!(
            "series misaligned: {} bars, {} signals, {} sizes",
            bars.len(),
            signals.len(),
            sizes.len()
        )));
    }

    bars.iter()
        .zip(signals.iter().zip(sizes.iter()))
        .map(|(bar, (&signal, &position_size))| {
            if !(0.0..=100.0).contains(&position_size) {
                return Err(CointraderError::data(format!(
                    "position size on {} must be within [0, 100], got {}",
                    bar.date, position_size
                )));
            }
            Ok(SignalBar {
                bar: bar.clone(),
                signal,
                position_size,
            })
        })
        .collect()
}
