//! Closed registry mapping discriminator strings to generator and sizer
//! constructors.

use super::error::CointraderError;
use super::generators::{BuyAndHold, MovingAverageCrossover, MovingAverageKind, RsiThreshold};
use super::sizers::{AtrPositionSizer, FixedPositionSizer};
use super::strategy::{
    ComponentParams, ParamReader, PositionSizer, SignalGenerator, Strategy, StrategySpec,
};

type GeneratorCtor = fn(&ParamReader) -> Result<Box<dyn SignalGenerator>, CointraderError>;
type SizerCtor = fn(&ParamReader) -> Result<Box<dyn PositionSizer>, CointraderError>;

const GENERATORS: &[(&str, GeneratorCtor)] = &[
    ("BuyAndHoldStrategy", buy_and_hold),
    ("HODL", buy_and_hold),
    ("MovingAverageCrossover", moving_average_crossover),
    ("RsiThreshold", rsi_threshold),
];

const SIZERS: &[(&str, SizerCtor)] = &[
    ("FixedPositionSizer", fixed_sizer),
    ("AtrPositionSizer", atr_sizer),
];

pub const DEFAULT_SIZER: &str = "FixedPositionSizer";

pub fn generator_kinds() -> Vec<&'static str> {
    GENERATORS.iter().map(|(k, _)| *k).collect()
}

pub fn sizer_kinds() -> Vec<&'static str> {
    SIZERS.iter().map(|(k, _)| *k).collect()
}

fn lookup<T: Copy>(
    table: &[(&'static str, T)],
    kind: &str,
    component: &str,
) -> Result<T, CointraderError> {
    table
        .iter()
        .find(|(k, _)| *k == kind)
        .map(|(_, ctor)| *ctor)
        .ok_or_else(|| CointraderError::UnknownComponent {
            component: component.to_string(),
            kind: kind.to_string(),
            available: table.iter().map(|(k, _)| *k).collect::<Vec<_>>().join(", "),
        })
}

pub fn create_signal_generator(
    kind: &str,
    params: &ComponentParams,
) -> Result<Box<dyn SignalGenerator>, CointraderError> {
    let ctor = lookup(GENERATORS, kind, "strategy")?;
    ctor(&ParamReader::new(kind, params))
}

pub fn create_position_sizer(
    kind: &str,
    params: &ComponentParams,
) -> Result<Box<dyn PositionSizer>, CointraderError> {
    let ctor = lookup(SIZERS, kind, "sizer")?;
    ctor(&ParamReader::new(kind, params))
}

/// Build the strategy a spec describes. An empty sizer kind means
/// [`DEFAULT_SIZER`]; an empty name falls back to the id.
pub fn create_strategy(spec: &StrategySpec) -> Result<Strategy, CointraderError> {
    let generator = create_signal_generator(&spec.kind, &spec.params)?;
    let sizer_kind = if spec.sizer_kind.is_empty() {
        DEFAULT_SIZER
    } else {
        spec.sizer_kind.as_str()
    };
    let sizer = create_position_sizer(sizer_kind, &spec.sizer_params)?;
    let name = if spec.name.is_empty() {
        &spec.id
    } else {
        &spec.name
    };
    Ok(Strategy::new(name.clone(), spec.description.clone(), generator, sizer))
}

fn buy_and_hold(p: &ParamReader) -> Result<Box<dyn SignalGenerator>, CointraderError> {
    p.ensure_known(&[])?;
    Ok(Box::new(BuyAndHold))
}

fn moving_average_crossover(p: &ParamReader) -> Result<Box<dyn SignalGenerator>, CointraderError> {
    p.ensure_known(&["ma_type", "short_window", "long_window"])?;
    let ma_type = p.str_or("ma_type", "SMA");
    let ma_kind = MovingAverageKind::parse(&ma_type)
        .ok_or_else(|| p.invalid("ma_type", format!("expected SMA or EMA, got '{ma_type}'")))?;
    let short_window = p.usize_or("short_window", 50)?;
    let long_window = p.usize_or("long_window", 200)?;
    if short_window == 0 {
        return Err(p.invalid("short_window", "must be positive"));
    }
    if short_window >= long_window {
        return Err(p.invalid(
            "short_window",
            format!("must be less than long_window ({short_window} >= {long_window})"),
        ));
    }
    Ok(Box::new(MovingAverageCrossover {
        ma_kind,
        short_window,
        long_window,
    }))
}

fn rsi_threshold(p: &ParamReader) -> Result<Box<dyn SignalGenerator>, CointraderError> {
    p.ensure_known(&["period", "oversold", "overbought"])?;
    let period = p.usize_or("period", 14)?;
    let oversold = p.f64_or("oversold", 30.0)?;
    let overbought = p.f64_or("overbought", 70.0)?;
    if period == 0 {
        return Err(p.invalid("period", "must be positive"));
    }
    if !(0.0 < oversold && oversold < overbought && overbought < 100.0) {
        return Err(p.invalid(
            "oversold",
            format!("need 0 < oversold < overbought < 100, got {oversold} / {overbought}"),
        ));
    }
    Ok(Box::new(RsiThreshold {
        period,
        oversold,
        overbought,
    }))
}

fn fixed_sizer(p: &ParamReader) -> Result<Box<dyn PositionSizer>, CointraderError> {
    p.ensure_known(&["fixed_size_pct"])?;
    let fixed_size_pct = p.f64_or("fixed_size_pct", 100.0)?;
    if !(fixed_size_pct > 0.0 && fixed_size_pct <= 100.0) {
        return Err(p.invalid("fixed_size_pct", format!("must be in (0, 100], got {fixed_size_pct}")));
    }
    Ok(Box::new(FixedPositionSizer { fixed_size_pct }))
}

fn atr_sizer(p: &ParamReader) -> Result<Box<dyn PositionSizer>, CointraderError> {
    p.ensure_known(&["atr_period", "risk_factor", "max_position_size"])?;
    let defaults = AtrPositionSizer::default();
    let atr_period = p.usize_or("atr_period", defaults.atr_period)?;
    let risk_factor = p.f64_or("risk_factor", defaults.risk_factor)?;
    let max_position_size = p.f64_or("max_position_size", defaults.max_position_size)?;
    if atr_period == 0 {
        return Err(p.invalid("atr_period", "must be positive"));
    }
    if !(risk_factor > 0.0 && risk_factor <= 1.0) {
        return Err(p.invalid("risk_factor", format!("must be in (0, 1], got {risk_factor}")));
    }
    if !(max_position_size > 0.0 && max_position_size <= 100.0) {
        return Err(p.invalid(
            "max_position_size",
            format!("must be in (0, 100], got {max_position_size}"),
        ));
    }
    Ok(Box::new(AtrPositionSizer {
        atr_period,
        risk_factor,
        max_position_size,
    }))
}
