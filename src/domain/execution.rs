//! Buy and sell fill arithmetic.
//!
//! Fees are charged as a fraction of the traded notional on both sides:
//! on entry they reduce the quantity bought, on exit they reduce the
//! proceeds credited to cash.

use chrono::NaiveDate;

use super::portfolio::Portfolio;
use super::position::{ExitReason, Position, Trade};
use super::risk::RiskParameters;

/// Result of a buy.
#[derive(Debug, Clone, PartialEq)]
pub struct BuyFill {
    pub investment: f64,
    pub fee: f64,
    pub quantity: f64,
    pub price: f64,
}

/// Result of a sell.
#[derive(Debug, Clone, PartialEq)]
pub struct SellFill {
    pub proceeds: f64,
    pub fee: f64,
    pub cash_profit: f64,
    pub price: f64,
}

/// Open a long position with `position_size` percent of current cash.
///
/// 1. investment = cash * position_size / 100
/// 2. fee = investment * transaction_fee_pct
/// 3. quantity = (investment - fee) / price
/// 4. cash -= investment
///
/// Returns `None` and leaves the portfolio untouched when a position is
/// already open or the fill would buy nothing.
pub fn buy(
    portfolio: &mut Portfolio,
    price: f64,
    date: NaiveDate,
    position_size: f64,
    risk: &RiskParameters,
) -> Option<BuyFill> {
    if portfolio.is_long() {
        return None;
    }

    let investment = portfolio.cash * (position_size / 100.0);
    let fee = risk.fee(investment);
    let quantity = (investment - fee) / price;

    if investment <= 0.0 || quantity <= 0.0 || !quantity.is_finite() {
        return None;
    }

    portfolio.cash -= investment;
    portfolio.position = Some(Position {
        quantity,
        entry_price: price,
        entry_date: date,
    });

    Some(BuyFill {
        investment,
        fee,
        quantity,
        price,
    })
}

/// Close the open position at `price`.
///
/// 1. proceeds = holdings * price
/// 2. fee = proceeds * transaction_fee_pct
/// 3. cash_profit = proceeds - entry_price * holdings - fee
/// 4. cash += proceeds - fee
/// 5. record the trade and clear the position
pub fn sell(
    portfolio: &mut Portfolio,
    price: f64,
    date: NaiveDate,
    reason: ExitReason,
    risk: &RiskParameters,
) -> Option<SellFill> {
    let position = portfolio.position.take()?;

    let proceeds = position.market_value(price);
    let fee = risk.fee(proceeds);
    let cash_profit = proceeds - position.entry_price * position.quantity - fee;

    portfolio.cash += proceeds - fee;
    portfolio.record_trade(Trade {
        entry_date: position.entry_date,
        exit_date: date,
        entry_price: position.entry_price,
        exit_price: price,
        quantity: position.quantity,
        cash_profit,
        exit_reason: reason,
        risk: *risk,
    });

    Some(SellFill {
        proceeds,
        fee,
        cash_profit,
        price,
    })
}
