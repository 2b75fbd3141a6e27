//! Portfolio run state and equity tracking.
//!
//! [`Portfolio`] is the owned state record threaded through every engine
//! step: cash, the open position (if any), the trade ledger and the equity
//! history.

use chrono::NaiveDate;
use serde::Serialize;

use super::position::{Position, Trade};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EquitySnapshot {
    pub date: NaiveDate,
    pub total_capital: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Portfolio {
    pub cash: f64,
    pub initial_capital: f64,
    pub position: Option<Position>,
    pub trades: Vec<Trade>,
    pub equity_curve: Vec<EquitySnapshot>,
}

impl Portfolio {
    pub fn new(initial_capital: f64) -> Self {
        Portfolio {
            cash: initial_capital,
            initial_capital,
            position: None,
            trades: Vec::new(),
            equity_curve: Vec::new(),
        }
    }

    pub fn with_capacity(initial_capital: f64, bars: usize) -> Self {
        Portfolio {
            equity_curve: Vec::with_capacity(bars),
            ..Portfolio::new(initial_capital)
        }
    }

    pub fn is_long(&self) -> bool {
        self.position.is_some()
    }

    /// Quantity of the asset held; zero while flat.
    pub fn holdings(&self) -> f64 {
        self.position.as_ref().map_or(0.0, |p| p.quantity)
    }

    pub fn total_equity(&self, price: f64) -> f64 {
        self.cash + self.position.as_ref().map_or(0.0, |p| p.market_value(price))
    }

    pub fn record_trade(&mut self, trade: Trade) {
        self.trades.push(trade);
    }

    pub fn record_equity(&mut self, date: NaiveDate, total_capital: f64) {
        self.equity_curve.push(EquitySnapshot {
            date,
            total_capital,
        });
    }
}
