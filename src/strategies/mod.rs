//! Trading Strategies Module
//!
//! Strategies are per-bar callbacks. They run after the exchange matched
//! pending orders against the bar, so they always see post-fill state.

pub mod channel_breakout;
pub mod sma_cross;

use anyhow::Result;

use crate::exchange::Exchange;
use crate::{Candle, Config};

/// Trading strategy trait
pub trait Strategy: Send {
    fn name(&self) -> &str;

    /// Called once per bar with every bar so far; the last one is current
    fn on_update(&mut self, exchange: &mut dyn Exchange, candles: &[Candle]);
}

/// Names accepted in the `strategy.name` config field
pub const AVAILABLE: &[&str] = &["channel_breakout", "sma_cross"];

/// Build the strategy named in the config
pub fn create_strategy(config: &Config) -> Result<Box<dyn Strategy>> {
    match config.strategy_name() {
        Some("channel_breakout") | Some("doten") => channel_breakout::create(config),
        Some("sma_cross") => sma_cross::create(config),
        Some(other) => anyhow::bail!(
            "Unknown strategy: {}. Available strategies: {}",
            other,
            AVAILABLE.join(", ")
        ),
        None => anyhow::bail!("'name' is required in the 'strategy' section of config"),
    }
}

/// Expand the quick or full parameter grid of the configured strategy
pub fn default_grid(config: &Config, full: bool) -> Result<Vec<Config>> {
    let configs = match config.strategy_name() {
        Some("channel_breakout") | Some("doten") => {
            let grid = if full {
                channel_breakout::GridParams::full()
            } else {
                channel_breakout::GridParams::quick()
            };
            grid.generate_configs(config)
        }
        Some("sma_cross") => {
            let grid = if full {
                sma_cross::GridParams::full()
            } else {
                sma_cross::GridParams::quick()
            };
            grid.generate_configs(config)
        }
        other => anyhow::bail!("No parameter grid for strategy {:?}", other),
    };
    Ok(configs)
}
