//! Market data access port trait.

use crate::domain::error::CointraderError;
use crate::domain::ohlcv::OhlcvBar;
use chrono::NaiveDate;

pub trait DataPort {
    /// Bars ascending by date, restricted to the inclusive range when bounds
    /// are given.
    fn fetch_ohlcv(
        &self,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Vec<OhlcvBar>, CointraderError>;

    /// First date, last date and bar count of the full data set.
    fn get_data_range(&self) -> Result<Option<(NaiveDate, NaiveDate, usize)>, CointraderError> {
        let bars = self.fetch_ohlcv(None, None)?;
        Ok(match (bars.first(), bars.last()) {
            (Some(first), Some(last)) => Some((first.date, last.date, bars.len())),
            _ => None,
        })
    }
}
