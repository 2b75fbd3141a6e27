//! Run several strategies over the same bars.
//!
//! Each strategy gets its own engine and run state, so strategies run in
//! parallel and one failure never affects the others.

use rayon::prelude::*;
use tracing::warn;

use super::backtest::{run_backtest, BacktestResult};
use super::error::CointraderError;
use super::metrics::Metrics;
use super::ohlcv::OhlcvBar;
use super::risk::{resolve_risk, RiskParameters};
use super::strategy::StrategySpec;
use super::strategy_factory::create_strategy;

/// A completed strategy run with its computed metrics.
#[derive(Debug, Clone)]
pub struct StrategyRun {
    pub name: String,
    pub description: String,
    pub sizer_kind: &'static str,
    pub result: BacktestResult,
    pub metrics: Metrics,
}

#[derive(Debug)]
pub struct StrategyOutcome {
    pub id: String,
    pub outcome: Result<StrategyRun, CointraderError>,
}

impl StrategyOutcome {
    pub fn run(&self) -> Option<&StrategyRun> {
        self.outcome.as_ref().ok()
    }
}

/// Build, resolve risk for, and run a single strategy.
pub fn run_strategy(
    bars: &[OhlcvBar],
    spec: &StrategySpec,
    defaults: &RiskParameters,
    initial_capital: f64,
) -> Result<StrategyRun, CointraderError> {
    let strategy = create_strategy(spec)?;
    let risk = resolve_risk(defaults, Some(&spec.risk_overrides))?;
    let signal_bars = strategy.apply(bars)?;
    let result = run_backtest(signal_bars, initial_capital, risk)?;
    let metrics = Metrics::compute(&result.equity_curve, &result.trades, initial_capital);

    Ok(StrategyRun {
        sizer_kind: strategy.sizer_kind(),
        name: strategy.name,
        description: strategy.description,
        result,
        metrics,
    })
}

/// Run every spec in parallel. Outcomes come back in input order.
pub fn run_strategies(
    bars: &[OhlcvBar],
    specs: &[StrategySpec],
    defaults: &RiskParameters,
    initial_capital: f64,
) -> Vec<StrategyOutcome> {
    specs
        .par_iter()
        .map(|spec| {
            let outcome = run_strategy(bars, spec, defaults, initial_capital);
            if let Err(e) = &outcome {
                warn!(strategy = %spec.id, error = %e, "strategy failed");
            }
            StrategyOutcome {
                id: spec.id.clone(),
                outcome,
            }
        })
        .collect()
}
