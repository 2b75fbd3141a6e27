//! Report generation port trait.

use std::path::{Path, PathBuf};

use crate::domain::error::CointraderError;
use crate::domain::runner::StrategyRun;

/// Port for writing comparative backtest reports.
pub trait ReportPort {
    /// Write reports for `runs` under `output_dir`, returning the files
    /// created.
    fn write(&self, runs: &[&StrategyRun], output_dir: &Path)
        -> Result<Vec<PathBuf>, CointraderError>;
}
