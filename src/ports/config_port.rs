//! Configuration access port trait.

use crate::domain::error::CointraderError;

pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;

    /// `Ok(None)` when the key is absent; an error when present but not a
    /// finite number.
    fn get_double(&self, section: &str, key: &str) -> Result<Option<f64>, CointraderError>;

    /// All section names, lowercased, in ascending order.
    fn sections(&self) -> Vec<String>;

    /// Keys of `section` in ascending order; empty for a missing section.
    fn keys(&self, section: &str) -> Vec<String>;
}
