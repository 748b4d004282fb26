//! Channel Breakout (stop-and-reverse) Strategy
//!
//! Always in the market once the channel is formed:
//! - a buy stop rests at the N-bar highest high
//! - a sell stop rests at the N-bar lowest low
//!
//! Whichever side breaks first fills; the opposite stop then carries the
//! reversal size, so the position flips on the next breakout.

mod config;
mod grid_params;
mod strategy;

pub use config::ChannelBreakoutConfig;
pub use grid_params::GridParams;
pub use strategy::ChannelBreakoutStrategy;

use crate::strategies::Strategy;
use crate::Config;
use anyhow::Result;

/// Create strategy from config (called by registry)
pub fn create(config: &Config) -> Result<Box<dyn Strategy>> {
    let strategy_config: ChannelBreakoutConfig = serde_json::from_value(config.strategy.clone())
        .map_err(|e| anyhow::anyhow!("Failed to parse channel_breakout config: {}", e))?;
    strategy_config.validate()?;
    Ok(Box::new(ChannelBreakoutStrategy::new(strategy_config)))
}
