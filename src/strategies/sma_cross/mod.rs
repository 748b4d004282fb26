//! SMA Crossover Strategy
//!
//! Market entries on moving-average crosses:
//! - fast SMA crosses above slow SMA → be long
//! - fast SMA crosses below slow SMA → be short
//!
//! Uses the `when` flag of an entry instead of branching, so both intents
//! are issued every bar and only the one whose condition holds takes effect.

mod config;
mod grid_params;
mod strategy;

pub use config::SmaCrossConfig;
pub use grid_params::GridParams;
pub use strategy::SmaCrossStrategy;

use crate::strategies::Strategy;
use crate::Config;
use anyhow::Result;

/// Create strategy from config (called by registry)
pub fn create(config: &Config) -> Result<Box<dyn Strategy>> {
    let strategy_config: SmaCrossConfig = serde_json::from_value(config.strategy.clone())
        .map_err(|e| anyhow::anyhow!("Failed to parse sma_cross config: {}", e))?;
    strategy_config.validate()?;
    Ok(Box::new(SmaCrossStrategy::new(strategy_config)))
}
