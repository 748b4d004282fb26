//! SMA Crossover Strategy Implementation

use crate::exchange::Exchange;
use crate::indicators::sma;
use crate::oms::OrderRequest;
use crate::strategies::Strategy;
use crate::Candle;

use super::config::SmaCrossConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cross {
    Golden,
    Dead,
    None,
}

pub struct SmaCrossStrategy {
    config: SmaCrossConfig,
}

impl SmaCrossStrategy {
    pub fn new(config: SmaCrossConfig) -> Self {
        Self { config }
    }

    /// Cross between the previous and the current bar
    pub fn detect_cross(&self, candles: &[Candle]) -> Cross {
        if candles.len() < self.config.slow_period + 1 {
            return Cross::None;
        }

        // Previous and current slow SMA need slow_period + 1 closes
        let window = &candles[candles.len() - (self.config.slow_period + 1)..];
        let close: Vec<f64> = window.iter().map(|c| c.close).collect();
        let fast = sma(&close, self.config.fast_period);
        let slow = sma(&close, self.config.slow_period);
        let n = close.len();

        let (Some(f0), Some(s0), Some(f1), Some(s1)) =
            (fast[n - 2], slow[n - 2], fast[n - 1], slow[n - 1])
        else {
            return Cross::None;
        };

        if f0 <= s0 && f1 > s1 {
            Cross::Golden
        } else if f0 >= s0 && f1 < s1 {
            Cross::Dead
        } else {
            Cross::None
        }
    }
}

impl Strategy for SmaCrossStrategy {
    fn name(&self) -> &str {
        "sma_cross"
    }

    fn on_update(&mut self, exchange: &mut dyn Exchange, candles: &[Candle]) {
        let cross = self.detect_cross(candles);
        let lot = self.config.lot;

        exchange.entry(OrderRequest::long("Long", lot).when(cross == Cross::Golden));
        exchange.entry(OrderRequest::short("Short", lot).when(cross == Cross::Dead));
    }
}
