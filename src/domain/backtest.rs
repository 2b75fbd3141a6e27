//! Backtest engine: the per-bar FLAT/LONG state machine.
//!
//! Each bar is evaluated once, in date order:
//!
//! 1. LONG: stop-loss (bar low against entry * (1 - stop)), then take-profit
//!    (bar high against entry * (1 + take)), then an exit signal at close.
//!    The first rule that fires closes the position; nothing else happens on
//!    that bar.
//! 2. FLAT: an entry signal buys at close with the bar's position size.
//!
//! One equity snapshot is recorded per bar, valued at the close. A position
//! still open after the last bar is sold at the last close and the final
//! snapshot is replaced by the realized cash.

use chrono::NaiveDate;
use tracing::{debug, info};

use super::error::CointraderError;
use super::execution::{buy, sell};
use super::ohlcv::{ensure_ascending, OhlcvBar};
use super::portfolio::{EquitySnapshot, Portfolio};
use super::position::{ExitReason, Trade};
use super::risk::RiskParameters;
use super::signal::{Signal, SignalBar};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Flat,
    Long,
}

impl EngineState {
    pub fn of(portfolio: &Portfolio) -> Self {
        if portfolio.is_long() {
            EngineState::Long
        } else {
            EngineState::Flat
        }
    }
}

/// Output of a completed run.
#[derive(Debug, Clone, PartialEq)]
pub struct BacktestResult {
    pub initial_capital: f64,
    pub risk: RiskParameters,
    pub equity_curve: Vec<EquitySnapshot>,
    pub trades: Vec<Trade>,
}

impl BacktestResult {
    pub fn final_capital(&self) -> f64 {
        self.equity_curve
            .last()
            .map_or(self.initial_capital, |s| s.total_capital)
    }

    pub fn start_date(&self) -> Option<NaiveDate> {
        self.equity_curve.first().map(|s| s.date)
    }

    pub fn end_date(&self) -> Option<NaiveDate> {
        self.equity_curve.last().map(|s| s.date)
    }
}

/// A validated simulation, ready to run.
#[derive(Debug, Clone)]
pub struct BacktestEngine {
    bars: Vec<SignalBar>,
    initial_capital: f64,
    risk: RiskParameters,
}

impl BacktestEngine {
    /// Validates every input up front so that [`run`](Self::run) cannot fail.
    pub fn new(
        bars: Vec<SignalBar>,
        initial_capital: f64,
        risk: RiskParameters,
    ) -> Result<Self, CointraderError> {
        if bars.is_empty() {
            return Err(CointraderError::validation(
                "bars",
                "bar series must not be empty",
            ));
        }
        if !initial_capital.is_finite() || initial_capital <= 0.0 {
            return Err(CointraderError::validation(
                "initial_capital",
                format!("must be greater than zero, got {initial_capital}"),
            ));
        }

        for sb in &bars {
            sb.bar.validate()?;
            if !(0.0..=100.0).contains(&sb.position_size) {
                return Err(CointraderError::data(format!(
                    "position size on {} must be within [0, 100], got {}",
                    sb.bar.date, sb.position_size
                )));
            }
        }
        for (i, w) in bars.windows(2).enumerate() {
            if w[1].bar.date <= w[0].bar.date {
                return Err(CointraderError::NonAscendingDates {
                    index: i + 1,
                    previous: w[0].bar.date,
                    current: w[1].bar.date,
                });
            }
        }

        Ok(BacktestEngine {
            bars,
            initial_capital,
            risk,
        })
    }

    pub fn bars(&self) -> &[SignalBar] {
        &self.bars
    }

    pub fn risk(&self) -> &RiskParameters {
        &self.risk
    }

    pub fn run(&self) -> BacktestResult {
        let state = self.bars.iter().fold(
            Portfolio::with_capacity(self.initial_capital, self.bars.len()),
            |state, bar| step(state, bar, &self.risk),
        );

        // `new` guarantees at least one bar.
        let state = match self.bars.last() {
            Some(last) => liquidate(state, last, &self.risk),
            None => state,
        };

        let result = BacktestResult {
            initial_capital: self.initial_capital,
            risk: self.risk,
            equity_curve: state.equity_curve,
            trades: state.trades,
        };

        info!(
            bars = self.bars.len(),
            trades = result.trades.len(),
            final_capital = result.final_capital(),
            "backtest complete"
        );
        result
    }
}

/// Validate and run in one call.
pub fn run_backtest(
    bars: Vec<SignalBar>,
    initial_capital: f64,
    risk: RiskParameters,
) -> Result<BacktestResult, CointraderError> {
    Ok(BacktestEngine::new(bars, initial_capital, risk)?.run())
}

/// Advance the run state by one bar.
pub fn step(mut state: Portfolio, sb: &SignalBar, risk: &RiskParameters) -> Portfolio {
    let bar = &sb.bar;

    if let Some(position) = state.position.as_ref() {
        let exit = position
            .stop_loss_hit(bar.low, risk)
            .map(|price| (price, ExitReason::StopLoss))
            .or_else(|| {
                position
                    .take_profit_hit(bar.high, risk)
                    .map(|price| (price, ExitReason::TakeProfit))
            })
            .or_else(|| (sb.signal == Signal::Exit).then_some((bar.close, ExitReason::Signal)));

        if let Some((price, reason)) = exit {
            if let Some(fill) = sell(&mut state, price, bar.date, reason, risk) {
                debug!(
                    date = %bar.date,
                    price = fill.price,
                    fee = fill.fee,
                    cash_profit = fill.cash_profit,
                    reason = %reason,
                    "sell"
                );
            }
        }
    } else if sb.signal == Signal::Enter {
        if let Some(fill) = buy(&mut state, bar.close, bar.date, sb.position_size, risk) {
            debug!(
                date = %bar.date,
                price = fill.price,
                quantity = fill.quantity,
                investment = fill.investment,
                fee = fill.fee,
                "buy"
            );
        }
    }

    let total_capital = state.total_equity(bar.close);
    state.record_equity(bar.date, total_capital);
    state
}

/// Close any open position at the last bar's close and make the final
/// snapshot equal the realized cash.
pub fn liquidate(mut state: Portfolio, last: &SignalBar, risk: &RiskParameters) -> Portfolio {
    let bar = &last.bar;
    if let Some(fill) = sell(&mut state, bar.close, bar.date, ExitReason::EndOfBacktest, risk) {
        debug!(
            date = %bar.date,
            price = fill.price,
            cash_profit = fill.cash_profit,
            "liquidated open position at end of data"
        );
        let cash = state.cash;
        if let Some(snapshot) = state.equity_curve.last_mut() {
            snapshot.total_capital = cash;
        }
    }
    state
}

/// Check the input is sorted before annotating it with signals.
pub fn check_bars(bars: &[OhlcvBar]) -> Result<(), CointraderError> {
    if bars.is_empty() {
        return Err(CointraderError::validation(
            "bars",
            "bar series must not be empty",
        ));
    }
    ensure_ascending(bars)?;
    bars.iter().try_for_each(|b| b.validate())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn sbar(d: u32, low: f64, high: f64, close: f64, signal: Signal, size: f64) -> SignalBar {
        SignalBar {
            bar: OhlcvBar {
                date: date(d),
                open: close,
                high,
                low,
                close,
                volume: 1.0,
            },
            signal,
            position_size: size,
        }
    }

    fn flat_bar(d: u32, close: f64, signal: Signal, size: f64) -> SignalBar {
        sbar(d, close, close, close, signal, size)
    }

    fn risk(stop: f64, take: f64, fee: f64) -> RiskParameters {
        RiskParameters::new(stop, take, fee).unwrap()
    }

    #[test]
    fn empty_bars_rejected() {
        let err = BacktestEngine::new(vec![], 10_000.0, RiskParameters::default()).unwrap_err();
        assert!(matches!(err, CointraderError::Validation { ref field, .. } if field == "bars"));
    }

    #[test]
    fn non_positive_capital_rejected() {
        let bars = vec![flat_bar(1, 100.0, Signal::Hold, 0.0)];
        for capital in [0.0, -5.0, f64::NAN] {
            let err = BacktestEngine::new(bars.clone(), capital, RiskParameters::default())
                .unwrap_err();
            assert!(
                matches!(err, CointraderError::Validation { ref field, .. } if field == "initial_capital")
            );
        }
    }

    #[test]
    fn non_ascending_rejected() {
        let bars = vec![
            flat_bar(2, 100.0, Signal::Hold, 0.0),
            flat_bar(1, 100.0, Signal::Hold, 0.0),
        ];
        let err = BacktestEngine::new(bars, 10_000.0, RiskParameters::default()).unwrap_err();
        assert!(matches!(err, CointraderError::NonAscendingDates { index: 1, .. }));
    }

    #[test]
    fn duplicate_dates_rejected() {
        let bars = vec![
            flat_bar(1, 100.0, Signal::Hold, 0.0),
            flat_bar(1, 101.0, Signal::Hold, 0.0),
        ];
        assert!(BacktestEngine::new(bars, 10_000.0, RiskParameters::default()).is_err());
    }

    #[test]
    fn inconsistent_bar_rejected() {
        let bars = vec![sbar(1, 110.0, 90.0, 100.0, Signal::Hold, 0.0)];
        let err = BacktestEngine::new(bars, 10_000.0, RiskParameters::default()).unwrap_err();
        assert!(matches!(err, CointraderError::InconsistentBar { .. }));
    }

    #[test]
    fn full_cycle_without_fees() {
        let bars = vec![
            flat_bar(1, 100.0, Signal::Enter, 100.0),
            flat_bar(2, 110.0, Signal::Exit, 0.0),
        ];
        let result = run_backtest(bars, 10_000.0, RiskParameters::default()).unwrap();

        assert_eq!(result.trades.len(), 1);
        assert!((result.trades[0].cash_profit - 1_000.0).abs() < 1e-9);
        assert_eq!(result.trades[0].exit_reason, ExitReason::Signal);
        assert_eq!(result.equity_curve.len(), 2);
        assert!((result.equity_curve[0].total_capital - 10_000.0).abs() < 1e-9);
        assert!((result.final_capital() - 11_000.0).abs() < 1e-9);
    }

    #[test]
    fn stop_loss_has_priority_over_signal() {
        let r = risk(0.10, 0.0, 0.0);
        let state = step(
            Portfolio::new(10_000.0),
            &flat_bar(1, 100.0, Signal::Enter, 100.0),
            &r,
        );
        let state = step(state, &sbar(2, 85.0, 95.0, 92.0, Signal::Exit, 0.0), &r);

        assert!(!state.is_long());
        let trade = &state.trades[0];
        assert!((trade.exit_price - 90.0).abs() < 1e-9);
        assert_eq!(trade.exit_reason, ExitReason::StopLoss);
        // residual cash valued; holdings are gone so close price is irrelevant
        assert!((state.equity_curve[1].total_capital - 9_000.0).abs() < 1e-9);
    }

    #[test]
    fn stop_loss_beats_take_profit_on_same_bar() {
        let r = risk(0.10, 0.10, 0.0);
        let state = step(
            Portfolio::new(10_000.0),
            &flat_bar(1, 100.0, Signal::Enter, 100.0),
            &r,
        );
        let state = step(state, &sbar(2, 80.0, 120.0, 100.0, Signal::Hold, 0.0), &r);
        assert_eq!(state.trades[0].exit_reason, ExitReason::StopLoss);
    }

    #[test]
    fn take_profit_checked_even_with_stop_loss_enabled() {
        let r = risk(0.10, 0.20, 0.0);
        let state = step(
            Portfolio::new(10_000.0),
            &flat_bar(1, 100.0, Signal::Enter, 100.0),
            &r,
        );
        let state = step(state, &sbar(2, 95.0, 125.0, 110.0, Signal::Hold, 0.0), &r);

        let trade = &state.trades[0];
        assert_eq!(trade.exit_reason, ExitReason::TakeProfit);
        assert!((trade.exit_price - 120.0).abs() < 1e-9);
        // snapshot values at close, no holdings left
        assert!((state.equity_curve[1].total_capital - 12_000.0).abs() < 1e-9);
    }

    #[test]
    fn no_reentry_on_exit_bar() {
        let r = risk(0.10, 0.0, 0.0);
        let state = step(
            Portfolio::new(10_000.0),
            &flat_bar(1, 100.0, Signal::Enter, 100.0),
            &r,
        );
        let state = step(state, &sbar(2, 85.0, 95.0, 90.0, Signal::Enter, 100.0), &r);
        assert!(!state.is_long());
        assert_eq!(state.trades.len(), 1);
    }

    #[test]
    fn enter_signal_while_long_is_ignored() {
        let r = RiskParameters::default();
        let state = step(
            Portfolio::new(10_000.0),
            &flat_bar(1, 100.0, Signal::Enter, 50.0),
            &r,
        );
        let state = step(state, &flat_bar(2, 100.0, Signal::Enter, 50.0), &r);
        assert!((state.holdings() - 50.0).abs() < 1e-9);
        assert!((state.cash - 5_000.0).abs() < 1e-9);
    }

    #[test]
    fn exit_signal_while_flat_is_ignored() {
        let r = RiskParameters::default();
        let state = step(
            Portfolio::new(10_000.0),
            &flat_bar(1, 100.0, Signal::Exit, 0.0),
            &r,
        );
        assert!(state.trades.is_empty());
        assert_eq!(EngineState::of(&state), EngineState::Flat);
    }

    #[test]
    fn end_of_data_liquidates_and_corrects_final_snapshot() {
        let r = risk(0.0, 0.0, 0.01);
        let bars = vec![
            flat_bar(1, 50.0, Signal::Enter, 100.0),
            flat_bar(2, 55.0, Signal::Hold, 0.0),
            flat_bar(3, 60.0, Signal::Hold, 0.0),
        ];
        let result = run_backtest(bars, 10_000.0, r).unwrap();

        assert_eq!(result.trades.len(), 1);
        let trade = &result.trades[0];
        assert_eq!(trade.exit_reason, ExitReason::EndOfBacktest);
        assert_eq!(trade.exit_date, date(3));
        assert!((trade.exit_price - 60.0).abs() < 1e-9);
        // 198 * 60 = 11880, less 1% exit fee
        let cash = 11_880.0 - 118.8;
        assert!((result.final_capital() - cash).abs() < 1e-6);
        assert_eq!(result.equity_curve.len(), 3);
    }

    #[test]
    fn single_bar_entry_is_liquidated_same_day() {
        let bars = vec![flat_bar(1, 100.0, Signal::Enter, 100.0)];
        let result = run_backtest(bars, 10_000.0, RiskParameters::default()).unwrap();
        assert_eq!(result.trades.len(), 1);
        assert_eq!(result.trades[0].entry_date, result.trades[0].exit_date);
        assert!((result.final_capital() - 10_000.0).abs() < 1e-9);
    }

    #[test]
    fn check_bars_rejects_empty_and_unsorted() {
        assert!(check_bars(&[]).is_err());
        let a = flat_bar(2, 10.0, Signal::Hold, 0.0).bar;
        let b = flat_bar(1, 10.0, Signal::Hold, 0.0).bar;
        assert!(check_bars(&[a.clone(), b.clone()]).is_err());
        assert!(check_bars(&[b, a]).is_ok());
    }
}
