//! Service configuration.
//!
//! Read from a TOML file; every key is optional and falls back to the
//! defaults below. Example `vodomon.toml`:
//!
//! ```toml
//! source_url = "https://www.arso.gov.si/vode/podatki/stanje_voda_samodejne.html"
//! coordinates_path = "geocoded-coordinates.json"
//! output_path = "public/arso-latest.json"
//! timeout_secs = 30
//!
//! [logging]
//! level = "debug"
//! file = "vodomon.log"
//! timestamps = true
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::ingest::arso::{ARSO_URL, DEFAULT_USER_AGENT};
use crate::logging::LogLevel;
use crate::stations::DEFAULT_COORDINATES_PATH;

/// Env var naming the config file.
pub const CONFIG_PATH_VAR: &str = "VODOMON_CONFIG";
pub const SOURCE_URL_VAR: &str = "VODOMON_SOURCE_URL";
pub const OUTPUT_PATH_VAR: &str = "VODOMON_OUTPUT_PATH";

pub const DEFAULT_CONFIG_PATH: &str = "vodomon.toml";
pub const DEFAULT_OUTPUT_PATH: &str = "arso-latest.json";

// ---------------------------------------------------------------------------
// Config types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub source_url: String,
    pub coordinates_path: PathBuf,
    pub output_path: PathBuf,
    pub user_agent: String,
    pub timeout_secs: u64,
    /// The ARSO certificate chain has been broken before; scraping
    /// public data over a bad chain is acceptable here.
    pub accept_invalid_certs: bool,
    pub logging: LoggingConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        ServiceConfig {
            source_url: ARSO_URL.to_string(),
            coordinates_path: PathBuf::from(DEFAULT_COORDINATES_PATH),
            output_path: PathBuf::from(DEFAULT_OUTPUT_PATH),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_secs: 30,
            accept_invalid_certs: true,
            logging: LoggingConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<String>,
    pub timestamps: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: "info".to_string(),
            file: None,
            timestamps: false,
        }
    }
}

impl LoggingConfig {
    /// Configured level, or `Info` if the value is not recognized.
    pub fn min_level(&self) -> LogLevel {
        self.level.parse().unwrap_or(LogLevel::Info)
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Toml(toml::de::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "Config I/O error: {}", e),
            ConfigError::Toml(e) => write!(f, "Config parse error: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e)
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(e: toml::de::Error) -> Self {
        ConfigError::Toml(e)
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

impl ServiceConfig {
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Loads the config file at `path`.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml(&text)
    }

    /// Loads `.env`, then the file named by `VODOMON_CONFIG` (default
    /// `vodomon.toml`). A missing file yields the defaults; a malformed
    /// one is an error. `VODOMON_SOURCE_URL` and `VODOMON_OUTPUT_PATH`
    /// override the file.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();

        let path = std::env::var(CONFIG_PATH_VAR).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        let mut config = match Self::load(&path) {
            Ok(config) => config,
            Err(ConfigError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => Self::default(),
            Err(e) => return Err(e),
        };

        if let Ok(url) = std::env::var(SOURCE_URL_VAR) {
            config.source_url = url;
        }
        if let Ok(out) = std::env::var(OUTPUT_PATH_VAR) {
            config.output_path = PathBuf::from(out);
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_gives_defaults() {
        let config = ServiceConfig::from_toml("").unwrap();
        assert_eq!(config, ServiceConfig::default());
        assert_eq!(config.source_url, ARSO_URL);
        assert_eq!(config.output_path, PathBuf::from("arso-latest.json"));
    }

    #[test]
    fn test_partial_file_overrides_only_given_keys() {
        let config = ServiceConfig::from_toml(
            r#"
            output_path = "public/arso-latest.json"
            timeout_secs = 5

            [logging]
            level = "debug"
            "#,
        )
        .unwrap();

        assert_eq!(config.output_path, PathBuf::from("public/arso-latest.json"));
        assert_eq!(config.timeout_secs, 5);
        assert_eq!(config.logging.min_level(), LogLevel::Debug);
        assert_eq!(config.coordinates_path, PathBuf::from(DEFAULT_COORDINATES_PATH));
        assert!(config.accept_invalid_certs);
    }

    #[test]
    fn test_malformed_file_is_error() {
        let err = ServiceConfig::from_toml("timeout_secs = \"soon\"").unwrap_err();
        assert!(matches!(err, ConfigError::Toml(_)));
    }

    #[test]
    fn test_unknown_log_level_falls_back_to_info() {
        let logging = LoggingConfig { level: "loud".into(), ..LoggingConfig::default() };
        assert_eq!(logging.min_level(), LogLevel::Info);
    }
}
