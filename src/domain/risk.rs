//! Risk parameters and per-strategy override resolution.
//!
//! A run always receives a single resolved [`RiskParameters`] value. Stop and
//! take prices are derived from it per position, from that position's own
//! entry price.

use std::collections::BTreeMap;

use serde::Serialize;

use super::error::CointraderError;

pub const STOP_LOSS_PCT: &str = "stop_loss_pct";
pub const TAKE_PROFIT_PCT: &str = "take_profit_pct";
pub const TRANSACTION_FEE_PCT: &str = "transaction_fee_pct";

/// Keys accepted in a risk override mapping.
pub const OVERRIDE_KEYS: [&str; 3] = [STOP_LOSS_PCT, TAKE_PROFIT_PCT, TRANSACTION_FEE_PCT];

/// Per-strategy overrides keyed by field name.
pub type RiskOverrides = BTreeMap<String, f64>;

/// Validated, immutable risk controls. All values are fractions, so 0.05
/// means five percent.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct RiskParameters {
    stop_loss_pct: f64,
    take_profit_pct: f64,
    transaction_fee_pct: f64,
}

impl RiskParameters {
    pub fn new(
        stop_loss_pct: f64,
        take_profit_pct: f64,
        transaction_fee_pct: f64,
    ) -> Result<Self, CointraderError> {
        if !stop_loss_pct.is_finite() || !(0.0..=1.0).contains(&stop_loss_pct) {
            return Err(CointraderError::validation(
                STOP_LOSS_PCT,
                format!("must be between 0 and 1, got {stop_loss_pct}"),
            ));
        }
        if !take_profit_pct.is_finite() || take_profit_pct < 0.0 {
            return Err(CointraderError::validation(
                TAKE_PROFIT_PCT,
                format!("must be non-negative, got {take_profit_pct}"),
            ));
        }
        if !transaction_fee_pct.is_finite() || transaction_fee_pct < 0.0 {
            return Err(CointraderError::validation(
                TRANSACTION_FEE_PCT,
                format!("must be non-negative, got {transaction_fee_pct}"),
            ));
        }
        Ok(RiskParameters {
            stop_loss_pct,
            take_profit_pct,
            transaction_fee_pct,
        })
    }

    pub fn stop_loss_pct(&self) -> f64 {
        self.stop_loss_pct
    }

    pub fn take_profit_pct(&self) -> f64 {
        self.take_profit_pct
    }

    pub fn transaction_fee_pct(&self) -> f64 {
        self.transaction_fee_pct
    }

    /// entry * (1 - stop_loss_pct), or `None` when stop-loss is disabled.
    pub fn stop_price(&self, entry_price: f64) -> Option<f64> {
        (self.stop_loss_pct > 0.0).then(|| entry_price * (1.0 - self.stop_loss_pct))
    }

    /// entry * (1 + take_profit_pct), or `None` when take-profit is disabled.
    pub fn take_price(&self, entry_price: f64) -> Option<f64> {
        (self.take_profit_pct > 0.0).then(|| entry_price * (1.0 + self.take_profit_pct))
    }

    pub fn fee(&self, notional: f64) -> f64 {
        notional * self.transaction_fee_pct
    }
}

/// Merges `overrides` over `defaults` and validates the result.
///
/// Keys outside [`OVERRIDE_KEYS`] fail with a configuration error; merged
/// values outside their range fail with a validation error.
pub fn resolve_risk(
    defaults: &RiskParameters,
    overrides: Option<&RiskOverrides>,
) -> Result<RiskParameters, CointraderError> {
    let mut stop_loss_pct = defaults.stop_loss_pct;
    let mut take_profit_pct = defaults.take_profit_pct;
    let mut transaction_fee_pct = defaults.transaction_fee_pct;

    for (key, &value) in overrides.into_iter().flatten() {
        match key.as_str() {
            STOP_LOSS_PCT => stop_loss_pct = value,
            TAKE_PROFIT_PCT => take_profit_pct = value,
            TRANSACTION_FEE_PCT => transaction_fee_pct = value,
            _ => {
                return Err(CointraderError::UnknownOverrideKey {
                    key: key.clone(),
                    expected: OVERRIDE_KEYS.join(", "),
                })
            }
        }
    }

    RiskParameters::new(stop_loss_pct, take_profit_pct, transaction_fee_pct)
}
