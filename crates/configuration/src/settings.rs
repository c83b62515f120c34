use crate::error::ConfigError;
use core_types::PriceField;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// The root configuration structure for the entire application.
///
/// Every section is optional in `config.toml`; missing sections take their defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub data: DataConfig,
    pub report: ReportConfig,
    pub logging: LoggingConfig,
}

/// Contains parameters for the market-data provider.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Base URL of the Yahoo Finance chart endpoint.
    pub base_url: String,
    /// Some providers reject requests without a browser-like User-Agent.
    pub user_agent: String,
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
    /// How many calendar days to look back when no explicit range is given.
    pub lookback_days: u32,
    /// The price a return is computed from.
    pub price_field: PriceField,
}

/// Contains parameters for the generated report.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Directory the report documents are written to. Created if missing.
    pub output_dir: PathBuf,
    /// A Sharpe ratio above this value reads as a good risk/return trade-off.
    pub good_sharpe: f64,
    /// A max drawdown below this percentage reads as a significant decline.
    pub severe_drawdown_pct: f64,
}

/// Contains parameters for the tracing subscriber.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive, used when `RUST_LOG` is not set.
    pub level: String,
    /// When set, logs are also written to a daily-rolling file in this directory.
    pub directory: Option<PathBuf>,
    pub file_prefix: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Full,
    Compact,
}

// --- Default Implementations ---
// This allows a user to omit any section from their toml
// and still have it work with sensible defaults.

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            base_url: "https://query1.finance.yahoo.com/v8/finance/chart".to_string(),
            user_agent: "Mozilla/5.0".to_string(),
            request_timeout: Duration::from_secs(10),
            lookback_days: 365,
            price_field: PriceField::AdjustedClose,
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("reports"),
            good_sharpe: 1.0,
            severe_drawdown_pct: -30.0,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            directory: None,
            file_prefix: "pricelens.log".to_string(),
            format: LogFormat::Full,
        }
    }
}

impl Config {
    /// Rejects settings that would make the analysis meaningless.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.data.base_url.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "data.base_url must not be empty".to_string(),
            ));
        }
        if self.data.lookback_days == 0 {
            return Err(ConfigError::ValidationError(
                "data.lookback_days must be at least 1".to_string(),
            ));
        }
        if self.data.request_timeout.is_zero() {
            return Err(ConfigError::ValidationError(
                "data.request_timeout must be greater than zero".to_string(),
            ));
        }
        if !(self.report.good_sharpe > 0.0) {
            return Err(ConfigError::ValidationError(format!(
                "report.good_sharpe must be positive, got {}",
                self.report.good_sharpe
            )));
        }
        if !(self.report.severe_drawdown_pct < 0.0) {
            return Err(ConfigError::ValidationError(format!(
                "report.severe_drawdown_pct must be negative, got {}",
                self.report.severe_drawdown_pct
            )));
        }
        Ok(())
    }
}
