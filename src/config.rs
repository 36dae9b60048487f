use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Settings for one logging session
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggerConfig {
    pub port: String,           // Serial device path (COMx on Windows)
    pub baud_rate: u32,         // Must match the board firmware
    pub output_path: String,    // CSV destination, truncated on start
    pub poll_interval_ms: u64,  // Sleep between availability checks
    pub settle_delay_ms: u64,   // Wait after opening the port for the board to reset
    pub read_timeout_ms: u64,   // Serial read timeout
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            port: "/dev/ttyUSB0".to_string(),
            baud_rate: 115_200,
            output_path: "sensor_data.csv".to_string(),
            poll_interval_ms: 1000,
            settle_delay_ms: 2000,
            read_timeout_ms: 1000,
        }
    }
}

impl LoggerConfig {
    /// Defaults, optionally overridden key by key from a JSON file.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            info!("No config file given, using defaults");
            return Ok(Self::default());
        };

        info!("Loading configuration from {}", path.display());
        let text = fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn partial_json_keeps_remaining_defaults() {
        let json = r#"{ "port": "COM14", "poll_interval_ms": 250 }"#;
        let config = LoggerConfig::from_json(json).unwrap();
        assert_eq!(config.port, "COM14");
        assert_eq!(config.poll_interval(), Duration::from_millis(250));
        assert_eq!(config.baud_rate, 115_200);
        assert_eq!(config.output_path, "sensor_data.csv");
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = LoggerConfig::from_json(r#"{ "baud": 9600 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn load_without_path_uses_defaults() {
        assert_eq!(LoggerConfig::load(None).unwrap(), LoggerConfig::default());
    }

    #[test]
    fn load_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "output_path": "run1.csv", "settle_delay_ms": 0 }}"#).unwrap();

        let config = LoggerConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.output_path, "run1.csv");
        assert_eq!(config.settle_delay(), Duration::ZERO);
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = LoggerConfig::load(Some(&dir.path().join("nope.json"))).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
