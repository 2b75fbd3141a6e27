//! CLI definition and dispatch.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::config_validation::{
    date_range, default_risk, initial_capital, strategy_sections, validate_backtest_config,
    validate_strategy_config, RISK_PREFIX, SIZER_PREFIX, STRATEGY_SECTION_PREFIX,
};
use crate::domain::error::CointraderError;
use crate::domain::risk::{resolve_risk, RiskParameters};
use crate::domain::runner::{run_strategies, StrategyOutcome, StrategyRun};
use crate::domain::strategy::StrategySpec;
use crate::domain::strategy_factory::create_strategy;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(name = "cointrader", about = "Single-asset strategy backtester")]
pub struct Cli {
    /// Log engine decisions at debug level (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run every configured strategy and write reports
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        /// Report directory, overriding [report] output_dir
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Validate a configuration and build its strategies without running
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Show the date range of the configured market data
    Info {
        #[arg(short, long)]
        config: PathBuf,
    },
}

/// Resolved `[data]`, `[backtest]` and `[report]` settings.
#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    pub data_path: PathBuf,
    pub symbol: Option<String>,
    pub currency: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub initial_capital: f64,
    pub risk: RiskParameters,
    pub output_dir: PathBuf,
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Backtest { config, output } => run_backtest(&config, output.as_deref()),
        Command::Validate { config } => run_validate(&config),
        Command::Info { config } => run_info(&config),
    }
}

fn fail(err: &CointraderError) -> ExitCode {
    eprintln!("error: {err}");
    err.into()
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| fail(&e))
}

pub fn build_backtest_config(adapter: &dyn ConfigPort) -> Result<BacktestConfig, CointraderError> {
    validate_backtest_config(adapter)?;
    let data_path = adapter
        .get_string("data", "path")
        .map(PathBuf::from)
        .ok_or_else(|| CointraderError::ConfigMissing {
            section: "data".into(),
            key: "path".into(),
        })?;
    let (start_date, end_date) = date_range(adapter)?;

    Ok(BacktestConfig {
        data_path,
        symbol: adapter.get_string("data", "symbol"),
        currency: adapter.get_string("data", "currency"),
        start_date,
        end_date,
        initial_capital: initial_capital(adapter)?,
        risk: default_risk(adapter)?,
        output_dir: adapter
            .get_string("report", "output_dir")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("reports")),
    })
}

/// One [`StrategySpec`] per `[strategy.<id>]` section, in ascending id order.
pub fn build_strategy_specs(adapter: &dyn ConfigPort) -> Result<Vec<StrategySpec>, CointraderError> {
    validate_strategy_config(adapter)?;
    strategy_sections(adapter)
        .iter()
        .map(|section| build_strategy_spec(adapter, section))
        .collect()
}

fn build_strategy_spec(adapter: &dyn ConfigPort, section: &str) -> Result<StrategySpec, CointraderError> {
    let mut spec = StrategySpec {
        id: section
            .strip_prefix(STRATEGY_SECTION_PREFIX)
            .unwrap_or(section)
            .to_string(),
        ..StrategySpec::default()
    };

    for key in adapter.keys(section) {
        let value = adapter.get_string(section, &key).unwrap_or_default();
        match key.as_str() {
            "name" => spec.name = value,
            "description" => spec.description = value,
            "type" => spec.kind = value,
            "sizer" => spec.sizer_kind = value,
            k if k.starts_with(RISK_PREFIX) => {
                let amount = adapter.get_double(section, k)?.ok_or_else(|| {
                    CointraderError::ConfigInvalid {
                        section: section.to_string(),
                        key: k.to_string(),
                        reason: "expected a number".to_string(),
                    }
                })?;
                spec.risk_overrides
                    .insert(k[RISK_PREFIX.len()..].to_string(), amount);
            }
            k if k.starts_with(SIZER_PREFIX) => {
                spec.sizer_params
                    .insert(k[SIZER_PREFIX.len()..].to_string(), value);
            }
            k => {
                spec.params.insert(k.to_string(), value);
            }
        }
    }
    Ok(spec)
}

fn run_backtest(config_path: &Path, output_override: Option<&Path>) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let bt_config = match build_backtest_config(&adapter) {
        Ok(c) => c,
        Err(e) => return fail(&e),
    };
    let specs = match build_strategy_specs(&adapter) {
        Ok(s) => s,
        Err(e) => return fail(&e),
    };

    let data_port = CsvAdapter::new(bt_config.data_path.clone());
    let output_dir = output_override
        .map(Path::to_path_buf)
        .unwrap_or_else(|| bt_config.output_dir.clone());

    run_backtest_pipeline(&data_port, &specs, &bt_config, &CsvReportAdapter::new(), &output_dir)
}

/// Fetch data, run every strategy, print the summary and write reports.
///
/// Returns the exit code of the first failed strategy, if any, after
/// reporting on the ones that succeeded.
pub fn run_backtest_pipeline(
    data_port: &dyn DataPort,
    specs: &[StrategySpec],
    bt_config: &BacktestConfig,
    report: &dyn ReportPort,
    output_dir: &Path,
) -> ExitCode {
    let bars = match data_port.fetch_ohlcv(bt_config.start_date, bt_config.end_date) {
        Ok(b) => b,
        Err(e) => return fail(&e),
    };
    if bars.is_empty() {
        return fail(&CointraderError::validation(
            "bars",
            "no market data in the configured date range",
        ));
    }

    let market = match (&bt_config.symbol, &bt_config.currency) {
        (Some(s), Some(c)) => format!("{s}/{c}"),
        (Some(s), None) => s.clone(),
        _ => bt_config.data_path.display().to_string(),
    };
    eprintln!(
        "Running {} strategies on {}: {} bars, {} to {}",
        specs.len(),
        market,
        bars.len(),
        bars[0].date,
        bars[bars.len() - 1].date,
    );

    let outcomes = run_strategies(&bars, specs, &bt_config.risk, bt_config.initial_capital);
    print_summary(&outcomes);

    let runs: Vec<&StrategyRun> = outcomes.iter().filter_map(StrategyOutcome::run).collect();
    if !runs.is_empty() {
        match report.write(&runs, output_dir) {
            Ok(files) => {
                eprintln!("\nReports written to {}:", output_dir.display());
                for f in &files {
                    eprintln!("  {}", f.display());
                }
            }
            Err(e) => return fail(&e),
        }
    }

    match outcomes.iter().find_map(|o| o.outcome.as_ref().err()) {
        Some(e) => e.into(),
        None => ExitCode::SUCCESS,
    }
}

fn print_summary(outcomes: &[StrategyOutcome]) {
    println!(
        "{:<28} {:>14} {:>10} {:>9} {:>9} {:>8} {:>7} {:>8} {:>8}",
        "Strategy", "Final Capital", "Return %", "CAGR %", "MDD %", "Sharpe", "Trades", "Win %",
        "PF"
    );
    for outcome in outcomes {
        match &outcome.outcome {
            Ok(run) => {
                let m = &run.metrics;
                let cagr = m
                    .cagr
                    .map_or_else(|| "n/a".to_string(), |c| format!("{:.2}", c * 100.0));
                println!(
                    "{:<28} {:>14.2} {:>10.2} {:>9} {:>9.2} {:>8.2} {:>7} {:>8.1} {:>8.2}",
                    run.name,
                    m.final_capital,
                    m.total_return * 100.0,
                    cagr,
                    m.max_drawdown * 100.0,
                    m.sharpe_ratio,
                    m.total_trades,
                    m.win_rate * 100.0,
                    m.profit_factor,
                );
            }
            Err(e) => println!("{:<28} failed: {e}", outcome.id),
        }
    }
}

fn run_validate(config_path: &Path) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let bt_config = match build_backtest_config(&adapter) {
        Ok(c) => c,
        Err(e) => return fail(&e),
    };
    let specs = match build_strategy_specs(&adapter) {
        Ok(s) => s,
        Err(e) => return fail(&e),
    };

    eprintln!("\nBacktest:");
    eprintln!("  data:            {}", bt_config.data_path.display());
    eprintln!("  initial_capital: {:.2}", bt_config.initial_capital);
    eprintln!(
        "  risk:            stop {} / take {} / fee {}",
        bt_config.risk.stop_loss_pct(),
        bt_config.risk.take_profit_pct(),
        bt_config.risk.transaction_fee_pct()
    );

    eprintln!("\nStrategies:");
    for spec in &specs {
        let built = create_strategy(spec).and_then(|s| {
            resolve_risk(&bt_config.risk, Some(&spec.risk_overrides)).map(|r| (s, r))
        });
        match built {
            Ok((strategy, risk)) => eprintln!(
                "  {}: {} ({} + {}), stop {} / take {} / fee {}",
                spec.id,
                strategy.name,
                strategy.generator_kind(),
                strategy.sizer_kind(),
                risk.stop_loss_pct(),
                risk.take_profit_pct(),
                risk.transaction_fee_pct()
            ),
            Err(e) => {
                eprintln!("  {}: error", spec.id);
                return fail(&e);
            }
        }
    }

    eprintln!("\nConfiguration is valid.");
    ExitCode::SUCCESS
}

fn run_info(config_path: &Path) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    let Some(path) = adapter.get_string("data", "path") else {
        return fail(&CointraderError::ConfigMissing {
            section: "data".into(),
            key: "path".into(),
        });
    };

    match CsvAdapter::new(PathBuf::from(&path)).get_data_range() {
        Ok(Some((first, last, count))) => {
            println!("{path}: {count} bars, {first} to {last}");
            ExitCode::SUCCESS
        }
        Ok(None) => {
            println!("{path}: no data");
            ExitCode::SUCCESS
        }
        Err(e) => fail(&e),
    }
}
