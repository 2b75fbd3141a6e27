//! Core domain types and logic.

pub mod error;
pub mod ohlcv;
pub mod signal;
pub mod risk;
pub mod position;
pub mod portfolio;
pub mod execution;
pub mod backtest;
pub mod indicator;
pub mod strategy;
pub mod generators;
pub mod sizers;
pub mod strategy_factory;
pub mod metrics;
pub mod runner;
pub mod config_validation;
