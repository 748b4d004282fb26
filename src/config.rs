//! Configuration management
//!
//! Loads the JSON run configuration. Selected settings can be overridden
//! from the environment (a `.env` file is honoured by the binary).

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::oms::BASE_UNIT_SCALE;
use crate::BinSize;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("initial_balance must be positive, got {0}")]
    NonPositiveBalance(f64),

    #[error("leverage must be positive, got {0}")]
    NonPositiveLeverage(f64),

    #[error("commission must be within [0, 1), got {0}")]
    CommissionOutOfRange(f64),

    #[error("'name' is required in the 'strategy' section")]
    MissingStrategyName,
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub exchange: ExchangeConfig,
    pub backtest: BacktestConfig,
    /// Strategy section: `name` plus strategy-specific parameters
    pub strategy: serde_json::Value,
    /// Grid search parameters for optimization (optional)
    /// Each key is a strategy param name, value is array of values to test
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grid: Option<HashMap<String, Vec<serde_json::Value>>>,
}

impl Config {
    /// Load configuration from JSON file and apply environment overrides
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = fs::read_to_string(path.as_ref()).context("Failed to read config file")?;
        let mut config: Config =
            serde_json::from_str(&contents).context("Failed to parse config JSON")?;

        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// `BACKTEST_DATA_FILE`, `BACKTEST_LEVERAGE` and `BACKTEST_TRADE_LOG`
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(data_file) = std::env::var("BACKTEST_DATA_FILE") {
            self.backtest.data_file = data_file;
        }
        if let Ok(leverage) = std::env::var("BACKTEST_LEVERAGE") {
            self.exchange.leverage = leverage
                .parse()
                .context(format!("Invalid BACKTEST_LEVERAGE: {}", leverage))?;
        }
        if let Ok(flag) = std::env::var("BACKTEST_TRADE_LOG") {
            self.backtest.enable_trade_log = matches!(flag.as_str(), "1" | "true" | "yes");
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !is_positive(self.exchange.initial_balance) {
            return Err(ConfigError::NonPositiveBalance(
                self.exchange.initial_balance,
            ));
        }
        if !is_positive(self.exchange.leverage) {
            return Err(ConfigError::NonPositiveLeverage(self.exchange.leverage));
        }
        if let Some(leverage) = self.exchange.leverage_override {
            if !is_positive(leverage) {
                return Err(ConfigError::NonPositiveLeverage(leverage));
            }
        }
        if !(0.0..1.0).contains(&self.exchange.commission) {
            return Err(ConfigError::CommissionOutOfRange(self.exchange.commission));
        }
        if self.strategy_name().is_none() {
            return Err(ConfigError::MissingStrategyName);
        }
        Ok(())
    }

    pub fn strategy_name(&self) -> Option<&str> {
        self.strategy.get("name").and_then(|v| v.as_str())
    }

    /// Set a strategy parameter in the JSON section
    pub fn set_strategy_param(&mut self, key: &str, value: serde_json::Value) {
        if let Some(obj) = self.strategy.as_object_mut() {
            obj.insert(key.to_string(), value);
        }
    }
}

/// Finite and strictly positive; rejects NaN
fn is_positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

/// Simulated account settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeConfig {
    /// Starting balance in base units (satoshis)
    #[serde(default = "default_initial_balance")]
    pub initial_balance: f64,
    /// Stored account leverage
    #[serde(default = "default_leverage")]
    pub leverage: f64,
    /// Leverage applied to realized PnL instead of the stored one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub leverage_override: Option<f64>,
    /// Fractional commission per realized close
    #[serde(default = "default_commission")]
    pub commission: f64,
}

// 0.1 BTC
fn default_initial_balance() -> f64 {
    0.1 * BASE_UNIT_SCALE
}
fn default_leverage() -> f64 {
    1.0
}
fn default_commission() -> f64 {
    0.00075
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        ExchangeConfig {
            initial_balance: default_initial_balance(),
            leverage: default_leverage(),
            leverage_override: None,
            commission: default_commission(),
        }
    }
}

/// Backtest run settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestConfig {
    /// CSV file with base-resolution bars
    pub data_file: String,
    /// Resolution the strategy subscribes to
    #[serde(default = "default_bin_size")]
    pub bin_size: BinSize,
    /// Emit position open/close lines
    #[serde(default)]
    pub enable_trade_log: bool,
    #[serde(default = "default_results_dir")]
    pub results_dir: String,
}

fn default_bin_size() -> BinSize {
    BinSize::OneHour
}
fn default_results_dir() -> String {
    "results".to_string()
}

impl Default for BacktestConfig {
    fn default() -> Self {
        BacktestConfig {
            data_file: "data/XBTUSD_1m.csv".to_string(),
            bin_size: default_bin_size(),
            enable_trade_log: false,
            results_dir: default_results_dir(),
        }
    }
}
