//! Domain error types.

use chrono::NaiveDate;

/// Broad classification of a [`CointraderError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    Configuration,
    Data,
    Io,
}

/// Top-level error type for cointrader.
#[derive(Debug, thiserror::Error)]
pub enum CointraderError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("unknown risk override key '{key}' (expected one of: {expected})")]
    UnknownOverrideKey { key: String, expected: String },

    #[error("unknown {component} type '{kind}' (available: {available})")]
    UnknownComponent {
        component: String,
        kind: String,
        available: String,
    },

    #[error("invalid parameter '{key}' for {component}: {reason}")]
    InvalidParameter {
        component: String,
        key: String,
        reason: String,
    },

    #[error("data error: {reason}")]
    Data { reason: String },

    #[error("bars not strictly ascending at index {index}: {current} follows {previous}")]
    NonAscendingDates {
        index: usize,
        previous: NaiveDate,
        current: NaiveDate,
    },

    #[error("inconsistent bar on {date}: {reason}")]
    InconsistentBar { date: NaiveDate, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CointraderError {
    pub fn validation(field: &str, reason: impl Into<String>) -> Self {
        CointraderError::Validation {
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    pub fn data(reason: impl Into<String>) -> Self {
        CointraderError::Data {
            reason: reason.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            CointraderError::Validation { .. } => ErrorCategory::Validation,
            CointraderError::ConfigParse { .. }
            | CointraderError::ConfigMissing { .. }
            | CointraderError::ConfigInvalid { .. }
            | CointraderError::UnknownOverrideKey { .. }
            | CointraderError::UnknownComponent { .. }
            | CointraderError::InvalidParameter { .. } => ErrorCategory::Configuration,
            CointraderError::Data { .. }
            | CointraderError::NonAscendingDates { .. }
            | CointraderError::InconsistentBar { .. } => ErrorCategory::Data,
            CointraderError::Io(_) => ErrorCategory::Io,
        }
    }
}

impl From<&CointraderError> for std::process::ExitCode {
    fn from(err: &CointraderError) -> Self {
        let code: u8 = match err.category() {
            ErrorCategory::Io => 1,
            ErrorCategory::Configuration => 2,
            ErrorCategory::Validation => 3,
            ErrorCategory::Data => 5,
        };
        std::process::ExitCode::from(code)
    }
}
