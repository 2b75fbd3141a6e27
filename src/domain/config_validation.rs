//! Configuration validation.
//!
//! Validates all config fields before any data is loaded or any backtest
//! runs.

use crate::domain::error::CointraderError;
use crate::domain::risk::RiskParameters;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;

pub const STRATEGY_SECTION_PREFIX: &str = "strategy.";
pub const RISK_PREFIX: &str = "risk.";
pub const SIZER_PREFIX: &str = "sizer.";

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), CointraderError> {
    validate_data_path(config)?;
    validate_dates(config)?;
    validate_initial_capital(config)?;
    default_risk(config)?;
    Ok(())
}

pub fn validate_strategy_config(config: &dyn ConfigPort) -> Result<(), CointraderError> {
    let sections = strategy_sections(config);
    if sections.is_empty() {
        return Err(CointraderError::ConfigMissing {
            section: "strategy.<id>".to_string(),
            key: "type".to_string(),
        });
    }
    for section in &sections {
        validate_strategy_section(config, section)?;
    }
    Ok(())
}

/// `[strategy.<id>]` section names in ascending order.
pub fn strategy_sections(config: &dyn ConfigPort) -> Vec<String> {
    config
        .sections()
        .into_iter()
        .filter(|s| {
            s.strip_prefix(STRATEGY_SECTION_PREFIX)
                .is_some_and(|id| !id.trim().is_empty())
        })
        .collect()
}

/// Positive starting capital from `[backtest] initial_capital`.
pub fn initial_capital(config: &dyn ConfigPort) -> Result<f64, CointraderError> {
    let value = config
        .get_double("backtest", "initial_capital")?
        .ok_or_else(|| CointraderError::ConfigMissing {
            section: "backtest".to_string(),
            key: "initial_capital".to_string(),
        })?;
    if value <= 0.0 {
        return Err(CointraderError::validation(
            "initial_capital",
            format!("must be greater than zero, got {value}"),
        ));
    }
    Ok(value)
}

/// Default risk parameters from `[backtest]`; absent keys are zero.
pub fn default_risk(config: &dyn ConfigPort) -> Result<RiskParameters, CointraderError> {
    let get = |key: &str| -> Result<f64, CointraderError> {
        Ok(config.get_double("backtest", key)?.unwrap_or(0.0))
    };
    RiskParameters::new(
        get("stop_loss_pct")?,
        get("take_profit_pct")?,
        get("transaction_fee_pct")?,
    )
}

pub fn parse_date(value: &str, section: &str, key: &str) -> Result<NaiveDate, CointraderError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| CointraderError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: format!("invalid {key} format, expected YYYY-MM-DD"),
    })
}

/// Optional inclusive `[data] start_date` / `end_date` filter.
pub fn date_range(
    config: &dyn ConfigPort,
) -> Result<(Option<NaiveDate>, Option<NaiveDate>), CointraderError> {
    let start = config
        .get_string("data", "start_date")
        .map(|s| parse_date(&s, "data", "start_date"))
        .transpose()?;
    let end = config
        .get_string("data", "end_date")
        .map(|s| parse_date(&s, "data", "end_date"))
        .transpose()?;
    Ok((start, end))
}

fn validate_initial_capital(config: &dyn ConfigPort) -> Result<(), CointraderError> {
    initial_capital(config).map(|_| ())
}

fn validate_data_path(config: &dyn ConfigPort) -> Result<(), CointraderError> {
    match config.get_string("data", "path") {
        Some(p) if !p.trim().is_empty() => Ok(()),
        _ => Err(CointraderError::ConfigMissing {
            section: "data".to_string(),
            key: "path".to_string(),
        }),
    }
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(), CointraderError> {
    if let (Some(start), Some(end)) = date_range(config)? {
        if start > end {
            return Err(CointraderError::ConfigInvalid {
                section: "data".to_string(),
                key: "start_date".to_string(),
                reason: "start_date must not be after end_date".to_string(),
            });
        }
    }
    Ok(())
}

fn validate_strategy_section(config: &dyn ConfigPort, section: &str) -> Result<(), CointraderError> {
    match config.get_string(section, "type") {
        Some(t) if !t.trim().is_empty() => {}
        _ => {
            return Err(CointraderError::ConfigMissing {
                section: section.to_string(),
                key: "type".to_string(),
            })
        }
    }
    for key in config.keys(section) {
        if key.starts_with(RISK_PREFIX) {
            config.get_double(section, &key)?;
        }
    }
    Ok(())
}
