//! Strategy composition: a signal generator plus a position sizer.
//!
//! The two capabilities are independent traits so any generator can be paired
//! with any sizer. Concrete variants are built from a [`StrategySpec`] through
//! the closed registry in [`super::strategy_factory`].

use std::collections::BTreeMap;
use std::fmt;

use super::backtest::check_bars;
use super::error::CointraderError;
use super::ohlcv::OhlcvBar;
use super::risk::RiskOverrides;
use super::signal::{annotate, Signal, SignalBar};

/// Produces one signal per bar.
pub trait SignalGenerator: fmt::Debug + Send + Sync {
    fn kind(&self) -> &'static str;

    fn generate(&self, bars: &[OhlcvBar]) -> Vec<Signal>;
}

/// Produces one position size (percent of cash, in [0, 100]) per bar.
pub trait PositionSizer: fmt::Debug + Send + Sync {
    fn kind(&self) -> &'static str;

    fn size(&self, bars: &[OhlcvBar], signals: &[Signal]) -> Vec<f64>;
}

/// Raw string parameters for a generator or sizer, keyed by name.
pub type ComponentParams = BTreeMap<String, String>;

/// Declarative description of one strategy, as read from configuration.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StrategySpec {
    pub id: String,
    pub name: String,
    pub description: String,
    pub kind: String,
    pub params: ComponentParams,
    pub sizer_kind: String,
    pub sizer_params: ComponentParams,
    pub risk_overrides: RiskOverrides,
}

#[derive(Debug)]
pub struct Strategy {
    pub name: String,
    pub description: String,
    generator: Box<dyn SignalGenerator>,
    sizer: Box<dyn PositionSizer>,
}

impl Strategy {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        generator: Box<dyn SignalGenerator>,
        sizer: Box<dyn PositionSizer>,
    ) -> Self {
        Strategy {
            name: name.into(),
            description: description.into(),
            generator,
            sizer,
        }
    }

    pub fn generator_kind(&self) -> &'static str {
        self.generator.kind()
    }

    pub fn sizer_kind(&self) -> &'static str {
        self.sizer.kind()
    }

    /// Annotate `bars` with this strategy's signals and sizes.
    pub fn apply(&self, bars: &[OhlcvBar]) -> Result<Vec<SignalBar>, CointraderError> {
        check_bars(bars)?;
        let signals = self.generator.generate(bars);
        let sizes = self.sizer.size(bars, &signals);
        annotate(bars, &signals, &sizes)
    }
}

/// Typed access to [`ComponentParams`] with defaults.
pub struct ParamReader<'a> {
    component: &'a str,
    params: &'a ComponentParams,
}

impl<'a> ParamReader<'a> {
    pub fn new(component: &'a str, params: &'a ComponentParams) -> Self {
        ParamReader { component, params }
    }

    /// Fails on any key not in `allowed`.
    pub fn ensure_known(&self, allowed: &[&str]) -> Result<(), CointraderError> {
        match self.params.keys().find(|k| !allowed.contains(&k.as_str())) {
            Some(key) => Err(self.invalid(
                key,
                format!("unknown parameter (expected one of: {})", allowed.join(", ")),
            )),
            None => Ok(()),
        }
    }

    pub fn f64_or(&self, key: &str, default: f64) -> Result<f64, CointraderError> {
        match self.params.get(key) {
            None => Ok(default),
            Some(raw) => match raw.trim().parse::<f64>() {
                Ok(v) if v.is_finite() => Ok(v),
                _ => Err(self.invalid(key, format!("expected a number, got '{raw}'"))),
            },
        }
    }

    pub fn usize_or(&self, key: &str, default: usize) -> Result<usize, CointraderError> {
        match self.params.get(key) {
            None => Ok(default),
            Some(raw) => raw
                .trim()
                .parse::<usize>()
                .map_err(|_| self.invalid(key, format!("expected a whole number, got '{raw}'"))),
        }
    }

    pub fn str_or(&self, key: &str, default: &str) -> String {
        self.params
            .get(key)
            .map(|s| s.trim().to_string())
            .unwrap_or_else(|| default.to_string())
    }

    pub fn invalid(&self, key: &str, reason: impl Into<String>) -> CointraderError {
        CointraderError::InvalidParameter {
            component: self.component.to_string(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}
