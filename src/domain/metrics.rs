//! Performance metrics over an equity history and trade ledger.

use super::portfolio::EquitySnapshot;
use super::position::Trade;

const DAYS_PER_YEAR: f64 = 365.25;
const PERIODS_PER_YEAR: f64 = 365.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Metrics {
    pub final_capital: f64,
    pub total_return: f64,
    /// None when the history spans zero days.
    pub cagr: Option<f64>,
    /// Largest peak-to-trough decline as a non-positive fraction.
    pub max_drawdown: f64,
    /// Longest run of bars spent below a prior peak.
    pub max_drawdown_duration: usize,
    pub sharpe_ratio: f64,
    pub total_trades: usize,
    pub winning_trades: usize,
    pub win_rate: f64,
    pub profit_factor: f64,
    pub avg_win: f64,
    pub avg_loss: f64,
    pub avg_holding_days: f64,
}

impl Metrics {
    pub fn compute(history: &[EquitySnapshot], trades: &[Trade], initial_capital: f64) -> Self {
        let final_capital = history
            .last()
            .map_or(initial_capital, |s| s.total_capital);

        let total_return = if initial_capital > 0.0 {
            final_capital / initial_capital - 1.0
        } else {
            0.0
        };

        let cagr = match (history.first(), history.last()) {
            (Some(first), Some(last)) if last.date > first.date && initial_capital > 0.0 => {
                let years = (last.date - first.date).num_days() as f64 / DAYS_PER_YEAR;
                Some((final_capital / initial_capital).powf(1.0 / years) - 1.0)
            }
            _ => None,
        };

        let (max_drawdown, max_drawdown_duration) = compute_drawdown(history);
        let sharpe_ratio = compute_sharpe(history);

        let mut winning_trades = 0usize;
        let mut losing_trades = 0usize;
        let mut gross_profit = 0.0_f64;
        let mut gross_loss = 0.0_f64;
        let mut holding_days = 0i64;

        for trade in trades {
            let pnl = trade.cash_profit;
            if pnl > 0.0 {
                winning_trades += 1;
                gross_profit += pnl;
            } else if pnl < 0.0 {
                losing_trades += 1;
                gross_loss += pnl.abs();
            }
            holding_days += trade.holding_days();
        }

        let total_trades = trades.len();
        let win_rate = if total_trades > 0 {
            winning_trades as f64 / total_trades as f64
        } else {
            0.0
        };

        let profit_factor = if gross_loss > 0.0 {
            gross_profit / gross_loss
        } else if gross_profit > 0.0 {
            f64::INFINITY
        } else {
            0.0
        };

        let avg_win = if winning_trades > 0 {
            gross_profit / winning_trades as f64
        } else {
            0.0
        };

        let avg_loss = if losing_trades > 0 {
            gross_loss / losing_trades as f64
        } else {
            0.0
        };

        let avg_holding_days = if total_trades > 0 {
            holding_days as f64 / total_trades as f64
        } else {
            0.0
        };

        Metrics {
            final_capital,
            total_return,
            cagr,
            max_drawdown,
            max_drawdown_duration,
            sharpe_ratio,
            total_trades,
            winning_trades,
            win_rate,
            profit_factor,
            avg_win,
            avg_loss,
            avg_holding_days,
        }
    }
}

fn compute_drawdown(history: &[EquitySnapshot]) -> (f64, usize) {
    let Some(first) = history.first() else {
        return (0.0, 0);
    };

    let mut peak = first.total_capital;
    let mut max_dd = 0.0_f64;
    let mut duration = 0usize;
    let mut max_duration = 0usize;

    for point in history {
        if point.total_capital >= peak {
            peak = point.total_capital;
            duration = 0;
        } else if peak > 0.0 {
            let dd = (point.total_capital - peak) / peak;
            max_dd = max_dd.min(dd);
            duration += 1;
            max_duration = max_duration.max(duration);
        }
    }

    (max_dd, max_duration)
}

/// Annualized mean / sample standard deviation of per-bar returns.
fn compute_sharpe(history: &[EquitySnapshot]) -> f64 {
    let returns: Vec<f64> = history
        .windows(2)
        .filter(|w| w[0].total_capital > 0.0)
        .map(|w| w[1].total_capital / w[0].total_capital - 1.0)
        .collect();

    if returns.len() < 2 {
        return 0.0;
    }

    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (n - 1.0);
    let stddev = variance.sqrt();

    if stddev > 0.0 {
        mean / stddev * PERIODS_PER_YEAR.sqrt()
    } else {
        0.0
    }
}
