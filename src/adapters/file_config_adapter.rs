//! INI file configuration adapter.

use crate::domain::error::CointraderError;
use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::fs;
use std::path::Path;

pub struct FileConfigAdapter {
    config: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, CointraderError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        Self::parse(content, &path.display().to_string())
    }

    pub fn from_string(content: &str) -> Result<Self, CointraderError> {
        Self::parse(content.to_string(), "<string>")
    }

    fn parse(content: String, file: &str) -> Result<Self, CointraderError> {
        let mut config = Ini::new();
        config.set_inline_comment_symbols(Some(&[';', '#']));
        config
            .read(content)
            .map_err(|reason| CointraderError::ConfigParse {
                file: file.to_string(),
                reason,
            })?;
        Ok(Self { config })
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.config
            .get(section, key)
            .filter(|v| !v.is_empty())
    }

    fn get_double(&self, section: &str, key: &str) -> Result<Option<f64>, CointraderError> {
        let Some(raw) = self.get_string(section, key) else {
            return Ok(None);
        };
        match raw.parse::<f64>() {
            Ok(v) if v.is_finite() => Ok(Some(v)),
            _ => Err(CointraderError::ConfigInvalid {
                section: section.to_string(),
                key: key.to_string(),
                reason: format!("expected a number, got '{raw}'"),
            }),
        }
    }

    fn sections(&self) -> Vec<String> {
        let mut sections = self.config.sections();
        sections.sort();
        sections
    }

    fn keys(&self, section: &str) -> Vec<String> {
        let mut keys: Vec<String> = self
            .config
            .get_map_ref()
            .get(&section.to_lowercase())
            .map(|entries| entries.keys().cloned().collect())
            .unwrap_or_default();
        keys.sort();
        keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    #[test]
    fn from_string_parses_config() {
        let content = r#"
[data]
path = data/BTC-USDT.csv

[backtest]
initial_capital = 10000

[strategy.hodl]
name = Buy and Hold
type = HODL
"#;
        let adapter = FileConfigAdapter::from_string(content).unwrap();
        assert_eq!(
            adapter.get_string("data", "path"),
            Some("data/BTC-USDT.csv".to_string())
        );
        assert_eq!(
            adapter.get_string("strategy.hodl", "name"),
            Some("Buy and Hold".to_string())
        );
    }

    #[test]
    fn get_string_returns_none_for_missing_key() {
        let adapter =
            FileConfigAdapter::from_string("[backtest]\ninitial_capital = 100\n").unwrap();
        assert_eq!(adapter.get_string("backtest", "missing"), None);
        assert_eq!(adapter.get_string("missing_section", "key"), None);
    }

    #[test]
    fn get_string_strips_inline_comments() {
        let adapter =
            FileConfigAdapter::from_string("[strategy.a]\ntype = HODL    ; alias\n").unwrap();
        assert_eq!(adapter.get_string("strategy.a", "type"), Some("HODL".to_string()));
    }

    #[test]
    fn hash_comments_are_stripped_too() {
        let content = "[backtest]\ninitial_capital = 5000 # starting cash\n\n[data]\npath = ; unset\n";
        let adapter = FileConfigAdapter::from_string(content).unwrap();
        assert_eq!(
            adapter.get_double("backtest", "initial_capital").unwrap(),
            Some(5000.0)
        );
        assert_eq!(adapter.get_string("data", "path"), None);
    }

    #[test]
    fn get_double_returns_value() {
        let adapter =
            FileConfigAdapter::from_string("[backtest]\ninitial_capital = 10000.5\n").unwrap();
        assert_eq!(
            adapter.get_double("backtest", "initial_capital").unwrap(),
            Some(10000.5)
        );
    }

    #[test]
    fn get_double_missing_is_none() {
        let adapter = FileConfigAdapter::from_string("[backtest]\n").unwrap();
        assert_eq!(adapter.get_double("backtest", "missing").unwrap(), None);
    }

    #[test]
    fn get_double_rejects_non_numeric() {
        let adapter =
            FileConfigAdapter::from_string("[backtest]\ninitial_capital = lots\n").unwrap();
        let err = adapter.get_double("backtest", "initial_capital").unwrap_err();
        assert!(matches!(err, CointraderError::ConfigInvalid { .. }));
    }

    #[test]
    fn sections_and_keys_are_sorted() {
        let content = "[strategy.b]\ntype = HODL\n[strategy.a]\nz = 1\ntype = HODL\n[data]\npath = x\n";
        let adapter = FileConfigAdapter::from_string(content).unwrap();
        assert_eq!(adapter.sections(), vec!["data", "strategy.a", "strategy.b"]);
        assert_eq!(adapter.keys("strategy.a"), vec!["type", "z"]);
        assert!(adapter.keys("nope").is_empty());
    }

    #[test]
    fn from_file_reads_config() {
        let file = create_temp_config("[report]\noutput_dir = out\n");
        let adapter = FileConfigAdapter::from_file(file.path()).unwrap();
        assert_eq!(
            adapter.get_string("report", "output_dir"),
            Some("out".to_string())
        );
    }

    #[test]
    fn from_file_missing_is_io_error() {
        let result = FileConfigAdapter::from_file("/nonexistent/path/config.ini");
        assert!(matches!(result, Err(CointraderError::Io(_))));
    }
}
