//! CLI integration tests for the backtest command orchestration.
//!
//! Tests cover:
//! - Config parsing (build_backtest_config, build_strategy_specs)
//! - Full pipeline with MockDataPort and real report files
//! - End-to-end from INI and CSV files on disk through `cli::run`,
//!   including the `info` and `validate` commands

mod common;

use clap::Parser;
use common::*;
use cointrader::adapters::csv_report_adapter::{CsvReportAdapter, CHART_FILE, METRICS_FILE};
use cointrader::adapters::file_config_adapter::FileConfigAdapter;
use cointrader::cli::{self, Cli};
use cointrader::domain::error::{CointraderError, ErrorCategory};
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

fn write_temp_ini(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

const VALID_INI: &str = r#"
[data]
path = data/BTC-USDT_1d.csv
symbol = BTC
currency = USDT
start_date = 2024-01-01
end_date = 2024-12-31

[backtest]
initial_capital = 10000
stop_loss_pct = 0.05
take_profit_pct = 0.10
transaction_fee_pct = 0.001

[report]
output_dir = out

[strategy.sma_cross]
name = SMA 20/50
description = Golden cross
type = MovingAverageCrossover
ma_type = SMA
short_window = 20
long_window = 50
sizer = FixedPositionSizer
sizer.fixed_size_pct = 50
risk.stop_loss_pct = 0.08

[strategy.hodl]
name = Buy and Hold
type = HODL
"#;

mod config_loading {
    use super::*;

    #[test]
    fn build_backtest_config_reads_all_sections() {
        let adapter = FileConfigAdapter::from_string(VALID_INI).unwrap();
        let config = cli::build_backtest_config(&adapter).unwrap();

        assert_eq!(config.data_path, PathBuf::from("data/BTC-USDT_1d.csv"));
        assert_eq!(config.symbol.as_deref(), Some("BTC"));
        assert_eq!(config.currency.as_deref(), Some("USDT"));
        assert_eq!(config.start_date, Some(date(2024, 1, 1)));
        assert_eq!(config.end_date, Some(date(2024, 12, 31)));
        assert_eq!(config.initial_capital, 10_000.0);
        assert_eq!(config.risk, risk(0.05, 0.10, 0.001));
        assert_eq!(config.output_dir, PathBuf::from("out"));
    }

    #[test]
    fn output_dir_defaults_to_reports() {
        let adapter = FileConfigAdapter::from_string(
            "[data]\npath = x.csv\n[backtest]\ninitial_capital = 1\n",
        )
        .unwrap();
        let config = cli::build_backtest_config(&adapter).unwrap();
        assert_eq!(config.output_dir, PathBuf::from("reports"));
        assert_eq!(config.start_date, None);
    }

    #[test]
    fn strategy_specs_split_keys_by_prefix() {
        let adapter = FileConfigAdapter::from_string(VALID_INI).unwrap();
        let specs = cli::build_strategy_specs(&adapter).unwrap();

        assert_eq!(specs.len(), 2);
        // ascending id order
        assert_eq!(specs[0].id, "hodl");
        assert_eq!(specs[1].id, "sma_cross");

        let sma = &specs[1];
        assert_eq!(sma.name, "SMA 20/50");
        assert_eq!(sma.description, "Golden cross");
        assert_eq!(sma.kind, "MovingAverageCrossover");
        assert_eq!(sma.params.get("short_window").map(String::as_str), Some("20"));
        assert_eq!(sma.params.get("ma_type").map(String::as_str), Some("SMA"));
        assert_eq!(sma.sizer_kind, "FixedPositionSizer");
        assert_eq!(sma.sizer_params.get("fixed_size_pct").map(String::as_str), Some("50"));
        assert_eq!(sma.risk_overrides.get("stop_loss_pct"), Some(&0.08));
        assert!(!sma.params.contains_key("name"));
    }

    #[test]
    fn non_numeric_override_is_rejected() {
        let adapter = FileConfigAdapter::from_string(
            "[strategy.a]\ntype = HODL\nrisk.take_profit_pct = high\n",
        )
        .unwrap();
        let err = cli::build_strategy_specs(&adapter).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Configuration);
    }

    #[test]
    fn load_config_from_disk() {
        let file = write_temp_ini(VALID_INI);
        assert!(cli::load_config(file.path()).is_ok());
        assert!(cli::load_config(&PathBuf::from("/nonexistent/config.ini")).is_err());
    }
}

mod pipeline {
    use super::*;

    fn config(output: &std::path::Path) -> cli::BacktestConfig {
        cli::BacktestConfig {
            data_path: PathBuf::from("mock"),
            symbol: Some("BTC".into()),
            currency: Some("USDT".into()),
            start_date: None,
            end_date: None,
            initial_capital: 10_000.0,
            risk: no_risk(),
            output_dir: output.to_path_buf(),
        }
    }

    #[test]
    fn writes_reports_for_every_strategy() {
        let dir = tempfile::TempDir::new().unwrap();
        let port = MockDataPort::new().with_bars(make_bars(&[100.0, 102.0, 101.0, 108.0]));
        let adapter = FileConfigAdapter::from_string(
            "[strategy.a]\ntype = HODL\n[strategy.b]\ntype = BuyAndHoldStrategy\nsizer.fixed_size_pct = 50\n",
        )
        .unwrap();
        let specs = cli::build_strategy_specs(&adapter).unwrap();

        cli::run_backtest_pipeline(&port, &specs, &config(dir.path()), &CsvReportAdapter::new(), dir.path());

        let metrics = fs::read_to_string(dir.path().join(METRICS_FILE)).unwrap();
        assert_eq!(metrics.lines().count(), 3);
        assert!(dir.path().join(CHART_FILE).exists());
        assert!(dir.path().join("trades_01_a.csv").exists());
        assert!(dir.path().join("trades_02_b.csv").exists());
    }

    #[test]
    fn failed_strategy_does_not_block_reports() {
        let dir = tempfile::TempDir::new().unwrap();
        let port = MockDataPort::new().with_bars(make_bars(&[100.0, 102.0, 101.0]));
        let adapter = FileConfigAdapter::from_string(
            "[strategy.a]\ntype = HODL\n[strategy.b]\ntype = Martingale\n",
        )
        .unwrap();
        let specs = cli::build_strategy_specs(&adapter).unwrap();

        cli::run_backtest_pipeline(&port, &specs, &config(dir.path()), &CsvReportAdapter::new(), dir.path());

        let metrics = fs::read_to_string(dir.path().join(METRICS_FILE)).unwrap();
        assert_eq!(metrics.lines().count(), 2);
    }

    #[test]
    fn data_error_writes_nothing() {
        let dir = tempfile::TempDir::new().unwrap();
        let out = dir.path().join("reports");
        let port = MockDataPort::new().with_error("feed unavailable");
        let adapter = FileConfigAdapter::from_string("[strategy.a]\ntype = HODL\n").unwrap();
        let specs = cli::build_strategy_specs(&adapter).unwrap();

        cli::run_backtest_pipeline(&port, &specs, &config(&out), &CsvReportAdapter::new(), &out);
        assert!(!out.exists());
    }

    #[test]
    fn mock_port_honours_date_filter() {
        use cointrader::ports::data_port::DataPort;
        let port = MockDataPort::new().with_bars(make_bars(&[1.0, 2.0, 3.0]));
        let bars = port.fetch_ohlcv(Some(day(1)), None).unwrap();
        assert_eq!(bars.len(), 2);
        let err = MockDataPort::new().with_error("x").fetch_ohlcv(None, None).unwrap_err();
        assert!(matches!(err, CointraderError::Data { .. }));
    }
}

mod end_to_end {
    use super::*;

    fn write_fixture(dir: &std::path::Path) -> PathBuf {
        let bars: Vec<OhlcvBar> = (0..90)
            .map(|i| {
                let c = 100.0 + 15.0 * (i as f64 / 8.0).sin() + i as f64 * 0.2;
                ohlc(i, c, c * 1.01, c * 0.99, c)
            })
            .collect();
        let data_path = dir.join("BTC-USDT_1d.csv");
        fs::write(&data_path, csv_content(&bars)).unwrap();

        let ini = format!(
            "[data]\npath = {}\n\n[backtest]\ninitial_capital = 10000\nstop_loss_pct = 0.05\ntransaction_fee_pct = 0.001\n\n\
             [report]\noutput_dir = {}\n\n\
             [strategy.hodl]\nname = Buy and Hold\ntype = HODL\n\n\
             [strategy.ma]\nname = EMA 5/20\ntype = MovingAverageCrossover\nma_type = EMA\nshort_window = 5\nlong_window = 20\n\
             sizer = AtrPositionSizer\nsizer.risk_factor = 0.05\n\n\
             [strategy.rsi]\nname = RSI 14\ntype = RsiThreshold\nrisk.take_profit_pct = 0.08\n",
            data_path.display(),
            dir.join("reports").display()
        );
        let ini_path = dir.join("backtest.ini");
        fs::write(&ini_path, ini).unwrap();
        ini_path
    }

    #[test]
    fn backtest_command_writes_reports() {
        let dir = tempfile::TempDir::new().unwrap();
        let ini = write_fixture(dir.path());

        let cli = Cli::try_parse_from(["cointrader", "backtest", "--config", ini.to_str().unwrap()])
            .unwrap();
        cli::run(cli);

        let reports = dir.path().join("reports");
        let metrics = fs::read_to_string(reports.join(METRICS_FILE)).unwrap();
        assert_eq!(metrics.lines().count(), 4);
        assert!(metrics.contains("Buy and Hold"));
        assert!(metrics.contains("AtrPositionSizer"));
        let svg = fs::read_to_string(reports.join(CHART_FILE)).unwrap();
        assert_eq!(svg.matches("<polyline").count(), 3);
    }

    #[test]
    fn output_flag_overrides_report_dir() {
        let dir = tempfile::TempDir::new().unwrap();
        let ini = write_fixture(dir.path());
        let out = dir.path().join("elsewhere");

        let cli = Cli::try_parse_from([
            "cointrader",
            "backtest",
            "--config",
            ini.to_str().unwrap(),
            "--output",
            out.to_str().unwrap(),
        ])
        .unwrap();
        cli::run(cli);

        assert!(out.join(METRICS_FILE).exists());
        assert!(!dir.path().join("reports").exists());
    }

    #[test]
    fn validate_command_writes_nothing() {
        let dir = tempfile::TempDir::new().unwrap();
        let ini = write_fixture(dir.path());

        let cli = Cli::try_parse_from(["cointrader", "validate", "-c", ini.to_str().unwrap()])
            .unwrap();
        cli::run(cli);
        assert!(!dir.path().join("reports").exists());
    }

    #[test]
    fn info_command_reports_data_range() {
        let dir = tempfile::TempDir::new().unwrap();
        let ini = write_fixture(dir.path());

        let cli = Cli::try_parse_from(["cointrader", "info", "-c", ini.to_str().unwrap()]).unwrap();
        assert_eq!(cli::run(cli), ExitCode::SUCCESS);
        assert!(!dir.path().join("reports").exists());
    }

    #[test]
    fn info_command_exit_codes() {
        let missing_data = write_temp_ini("[data]\npath = /nonexistent/data.csv\n");
        let path = missing_data.path().to_str().unwrap();
        let cli = Cli::try_parse_from(["cointrader", "info", "-c", path]).unwrap();
        assert_eq!(cli::run(cli), ExitCode::from(5));

        let no_path = write_temp_ini("[data]\nsymbol = BTC\n");
        let path = no_path.path().to_str().unwrap();
        let cli = Cli::try_parse_from(["cointrader", "info", "-c", path]).unwrap();
        assert_eq!(cli::run(cli), ExitCode::from(2));
    }

    #[test]
    fn verbose_flag_is_global() {
        let cli = Cli::try_parse_from(["cointrader", "validate", "--config", "x.ini", "--verbose"])
            .unwrap();
        assert!(cli.verbose);
    }
}
