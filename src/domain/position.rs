//! Open position and completed trade records.

use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;

use super::risk::RiskParameters;

/// The single open long position, present only while the engine is LONG.
#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub quantity: f64,
    pub entry_price: f64,
    pub entry_date: NaiveDate,
}

impl Position {
    pub fn market_value(&self, price: f64) -> f64 {
        self.quantity * price
    }

    pub fn unrealized_pnl(&self, price: f64) -> f64 {
        self.quantity * (price - self.entry_price)
    }

    /// Stop price if the bar's low reached it.
    pub fn stop_loss_hit(&self, low: f64, risk: &RiskParameters) -> Option<f64> {
        risk.stop_price(self.entry_price).filter(|&stop| low <= stop)
    }

    /// Take price if the bar's high reached it.
    pub fn take_profit_hit(&self, high: f64, risk: &RiskParameters) -> Option<f64> {
        risk.take_price(self.entry_price).filter(|&take| high >= take)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitReason {
    StopLoss,
    TakeProfit,
    Signal,
    EndOfBacktest,
}

impl ExitReason {
    pub fn as_str(self) -> &'static str {
        match self {
            ExitReason::StopLoss => "stop-loss triggered",
            ExitReason::TakeProfit => "take-profit triggered",
            ExitReason::Signal => "signal triggered",
            ExitReason::EndOfBacktest => "end of backtest",
        }
    }
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A completed round trip.
#[derive(Debug, Clone, PartialEq)]
pub struct Trade {
    pub entry_date: NaiveDate,
    pub exit_date: NaiveDate,
    pub entry_price: f64,
    pub exit_price: f64,
    pub quantity: f64,
    pub cash_profit: f64,
    pub exit_reason: ExitReason,
    pub risk: RiskParameters,
}

impl Trade {
    pub fn is_win(&self) -> bool {
        self.cash_profit > 0.0
    }

    pub fn holding_days(&self) -> i64 {
        (self.exit_date - self.entry_date).num_days()
    }
}
