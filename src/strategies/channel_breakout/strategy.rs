//! Channel Breakout Strategy Implementation

use crate::exchange::Exchange;
use crate::indicators::{highest, last, lowest};
use crate::oms::OrderRequest;
use crate::strategies::Strategy;
use crate::Candle;

use super::config::ChannelBreakoutConfig;

pub struct ChannelBreakoutStrategy {
    config: ChannelBreakoutConfig,
}

impl ChannelBreakoutStrategy {
    pub fn new(config: ChannelBreakoutConfig) -> Self {
        Self { config }
    }

    /// (upper, lower) channel bounds over the configured lookback
    fn channel(&self, candles: &[Candle]) -> Option<(f64, f64)> {
        if candles.len() < self.config.length {
            return None;
        }

        let window = &candles[candles.len() - self.config.length..];
        let high: Vec<f64> = window.iter().map(|c| c.high).collect();
        let low: Vec<f64> = window.iter().map(|c| c.low).collect();

        let upper = last(&highest(&high, self.config.length))?;
        let lower = last(&lowest(&low, self.config.length))?;
        Some((upper, lower))
    }
}

impl Strategy for ChannelBreakoutStrategy {
    fn name(&self) -> &str {
        "channel_breakout"
    }

    fn on_update(&mut self, exchange: &mut dyn Exchange, candles: &[Candle]) {
        let Some((upper, lower)) = self.channel(candles) else {
            return;
        };

        // The side already held is ignored by the exchange, so both stops
        // can be refreshed every bar.
        exchange.entry(OrderRequest::long("Long", self.config.lot).stop(upper));
        exchange.entry(OrderRequest::short("Short", self.config.lot).stop(lower));
    }
}
