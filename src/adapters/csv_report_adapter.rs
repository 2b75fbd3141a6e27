//! CSV and SVG report adapter.
//!
//! Writes one comparative metrics table, one trade ledger per strategy and a
//! normalized equity chart.

use crate::adapters::chart_svg::comparative_chart;
use crate::domain::error::CointraderError;
use crate::domain::portfolio::EquitySnapshot;
use crate::domain::runner::StrategyRun;
use crate::ports::report_port::ReportPort;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

pub const METRICS_FILE: &str = "comparative_results.csv";
pub const CHART_FILE: &str = "equity_comparison.svg";

#[derive(Debug, Serialize)]
struct MetricsRow<'a> {
    strategy: &'a str,
    description: &'a str,
    sizer: &'a str,
    stop_loss_pct: f64,
    take_profit_pct: f64,
    transaction_fee_pct: f64,
    start_date: String,
    end_date: String,
    final_capital: f64,
    total_return_pct: f64,
    cagr_pct: Option<f64>,
    max_drawdown_pct: f64,
    sharpe_ratio: f64,
    total_trades: usize,
    winning_trades: usize,
    win_rate_pct: f64,
    profit_factor: f64,
}

impl<'a> MetricsRow<'a> {
    fn from_run(run: &'a StrategyRun) -> Self {
        let m = &run.metrics;
        let risk = &run.result.risk;
        let date = |d: Option<chrono::NaiveDate>| d.map(|d| d.to_string()).unwrap_or_default();
        MetricsRow {
            strategy: &run.name,
            description: &run.description,
            sizer: run.sizer_kind,
            stop_loss_pct: risk.stop_loss_pct(),
            take_profit_pct: risk.take_profit_pct(),
            transaction_fee_pct: risk.transaction_fee_pct(),
            start_date: date(run.result.start_date()),
            end_date: date(run.result.end_date()),
            final_capital: m.final_capital,
            total_return_pct: m.total_return * 100.0,
            cagr_pct: m.cagr.map(|c| c * 100.0),
            max_drawdown_pct: m.max_drawdown * 100.0,
            sharpe_ratio: m.sharpe_ratio,
            total_trades: m.total_trades,
            winning_trades: m.winning_trades,
            win_rate_pct: m.win_rate * 100.0,
            profit_factor: m.profit_factor,
        }
    }
}

#[derive(Debug, Serialize)]
struct TradeRow<'a> {
    entry_date: String,
    exit_date: String,
    entry_price: f64,
    exit_price: f64,
    quantity: f64,
    cash_profit: f64,
    exit_reason: &'a str,
    stop_loss_pct: f64,
    take_profit_pct: f64,
    transaction_fee_pct: f64,
}

fn csv_error(path: &Path, e: csv::Error) -> CointraderError {
    CointraderError::Io(std::io::Error::other(format!(
        "failed to write {}: {}",
        path.display(),
        e
    )))
}

/// Lowercase alphanumerics, everything else collapsed to `_`.
pub fn file_slug(name: &str) -> String {
    let slug: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect();
    let parts: Vec<&str> = slug.split('_').filter(|p| !p.is_empty()).collect();
    if parts.is_empty() {
        "strategy".to_string()
    } else {
        parts.join("_")
    }
}

#[derive(Debug, Default)]
pub struct CsvReportAdapter;

impl CsvReportAdapter {
    pub fn new() -> Self {
        Self
    }

    fn write_metrics(&self, runs: &[&StrategyRun], path: &Path) -> Result<(), CointraderError> {
        let mut wtr = csv::Writer::from_path(path).map_err(|e| csv_error(path, e))?;
        for run in runs {
            wtr.serialize(MetricsRow::from_run(run))
                .map_err(|e| csv_error(path, e))?;
        }
        wtr.flush()?;
        Ok(())
    }

    fn write_trades(&self, run: &StrategyRun, path: &Path) -> Result<(), CointraderError> {
        let mut wtr = csv::Writer::from_path(path).map_err(|e| csv_error(path, e))?;
        if run.result.trades.is_empty() {
            wtr.write_record([
                "entry_date",
                "exit_date",
                "entry_price",
                "exit_price",
                "quantity",
                "cash_profit",
                "exit_reason",
                "stop_loss_pct",
                "take_profit_pct",
                "transaction_fee_pct",
            ])
            .map_err(|e| csv_error(path, e))?;
        }
        for trade in &run.result.trades {
            wtr.serialize(TradeRow {
                entry_date: trade.entry_date.to_string(),
                exit_date: trade.exit_date.to_string(),
                entry_price: trade.entry_price,
                exit_price: trade.exit_price,
                quantity: trade.quantity,
                cash_profit: trade.cash_profit,
                exit_reason: trade.exit_reason.as_str(),
                stop_loss_pct: trade.risk.stop_loss_pct(),
                take_profit_pct: trade.risk.take_profit_pct(),
                transaction_fee_pct: trade.risk.transaction_fee_pct(),
            })
            .map_err(|e| csv_error(path, e))?;
        }
        wtr.flush()?;
        Ok(())
    }
}

impl ReportPort for CsvReportAdapter {
    fn write(
        &self,
        runs: &[&StrategyRun],
        output_dir: &Path,
    ) -> Result<Vec<PathBuf>, CointraderError> {
        fs::create_dir_all(output_dir)?;
        let mut written = Vec::with_capacity(runs.len() + 2);

        let metrics_path = output_dir.join(METRICS_FILE);
        self.write_metrics(runs, &metrics_path)?;
        written.push(metrics_path);

        for (i, run) in runs.iter().enumerate() {
            let path = output_dir.join(format!("trades_{:02}_{}.csv", i + 1, file_slug(&run.name)));
            self.write_trades(run, &path)?;
            written.push(path);
        }

        let series: Vec<(&str, &[EquitySnapshot])> = runs
            .iter()
            .map(|r| (r.name.as_str(), r.result.equity_curve.as_slice()))
            .collect();
        let chart_path = output_dir.join(CHART_FILE);
        fs::write(&chart_path, comparative_chart(&series))?;
        written.push(chart_path);

        info!(dir = %output_dir.display(), files = written.len(), "reports written");
        Ok(written)
    }
}
