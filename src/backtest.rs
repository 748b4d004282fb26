//! Backtesting engine
//!
//! Replays bars through a two-stage pipeline:
//! 1. matching stage: the exchange resolves pending orders against the bar
//! 2. strategy stage: the subscribed strategy sees the post-fill state
//!
//! Each run builds its own exchange, so runs never share state.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::exchange::{Exchange, SimExchange};
use crate::oms::Position;
use crate::stats::TradeStatistics;
use crate::strategies::{self, Strategy};
use crate::{data, BinSize, Candle, Config};

/// Summary of one backtest run
#[derive(Debug, Clone, Serialize)]
pub struct BacktestResult {
    pub strategy: String,
    pub bin_size: BinSize,
    pub bars: usize,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub initial_balance: f64,
    pub final_balance: f64,
    pub total_return: f64,
    pub win_rate: f64,
    pub profit_factor: f64,
    pub max_draw_down: f64,
    pub stats: TradeStatistics,
    pub final_position: Position,
    pub open_orders: usize,
}

impl BacktestResult {
    fn from_exchange(
        strategy: &str,
        bin_size: BinSize,
        bars: &[Candle],
        initial_balance: f64,
        exchange: &SimExchange,
    ) -> Self {
        let stats = exchange.stats().clone();
        let final_balance = exchange.get_balance();
        let total_return = if initial_balance > 0.0 {
            (final_balance - initial_balance) / initial_balance * 100.0
        } else {
            0.0
        };

        Self {
            strategy: strategy.to_string(),
            bin_size,
            bars: bars.len(),
            start: bars.first().map(|c| c.datetime),
            end: bars.last().map(|c| c.datetime),
            initial_balance,
            final_balance,
            total_return,
            win_rate: stats.win_rate(),
            profit_factor: stats.profit_factor(),
            max_draw_down: stats.max_draw_down_pct(),
            final_position: exchange.position(),
            open_orders: exchange.open_orders().len(),
            stats,
        }
    }

    /// Write the result as pretty JSON under `dir`; returns the file path
    pub fn save_json(&self, dir: impl AsRef<Path>) -> Result<PathBuf> {
        fs::create_dir_all(dir.as_ref()).context("Failed to create results directory")?;
        let filename = format!(
            "{}_{}_{}.json",
            self.strategy,
            self.bin_size,
            Utc::now().format("%Y%m%d_%H%M%S")
        );
        let path = dir.as_ref().join(filename);
        let json = serde_json::to_string_pretty(self).context("Failed to serialize result")?;
        fs::write(&path, json).context(format!("Failed to write {}", path.display()))?;
        Ok(path)
    }
}

/// Backtest engine
pub struct Backtester {
    config: Config,
    subscription: Option<(BinSize, Box<dyn Strategy>)>,
}

impl Backtester {
    pub fn new(config: Config) -> Self {
        Backtester {
            config,
            subscription: None,
        }
    }

    /// Build the configured strategy and subscribe it at the configured bin size
    pub fn from_config(config: Config) -> Result<Self> {
        let strategy = strategies::create_strategy(&config)?;
        let bin_size = config.backtest.bin_size;
        let mut backtester = Backtester::new(config);
        backtester.on_update(bin_size, strategy);
        Ok(backtester)
    }

    /// Register the per-bar strategy callback at a bar resolution
    pub fn on_update(&mut self, bin_size: BinSize, strategy: Box<dyn Strategy>) {
        self.subscription = Some((bin_size, strategy));
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run over base-resolution bars, resampled to the subscribed bin size
    pub fn run(&mut self, candles: &[Candle]) -> Result<BacktestResult> {
        let (bin_size, strategy) = self
            .subscription
            .as_mut()
            .context("No strategy subscribed; call on_update first")?;
        let bin_size = *bin_size;

        let bars = data::resample(candles, bin_size);
        info!(
            "Replaying {} {} bars ({} base bars) with {}",
            bars.len(),
            bin_size,
            candles.len(),
            strategy.name()
        );

        let mut exchange = SimExchange::from_config(&self.config);

        for i in 0..bars.len() {
            let bar = &bars[i];
            exchange.market_mut().set_bar(bar);

            let fills = exchange.on_bar(bar);
            if fills > 0 {
                debug!("{} fill(s) at {}", fills, bar.datetime);
            }

            strategy.on_update(&mut exchange, &bars[..=i]);
        }

        Ok(BacktestResult::from_exchange(
            strategy.name(),
            bin_size,
            &bars,
            self.config.exchange.initial_balance,
            &exchange,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oms::OrderRequest;
    use chrono::Duration;
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    fn config() -> Config {
        serde_json::from_value(json!({
            "exchange": { "commission": 0.0 },
            "backtest": { "data_file": "unused.csv", "bin_size": "1m" },
            "strategy": { "name": "sma_cross" }
        }))
        .unwrap()
    }

    fn bars(closes: &[f64]) -> Vec<Candle> {
        let start = Utc::now() - Duration::minutes(closes.len() as i64);
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| {
                Candle::new_unchecked(start + Duration::minutes(i as i64), c, c + 1.0, c - 1.0, c, 1.0)
            })
            .collect()
    }

    /// Records what it saw and places a buy limit under the first bar
    struct Probe {
        seen_sizes: Arc<Mutex<Vec<f64>>>,
    }

    impl Strategy for Probe {
        fn name(&self) -> &str {
            "probe"
        }

        fn on_update(&mut self, exchange: &mut dyn Exchange, candles: &[Candle]) {
            if let Ok(mut seen) = self.seen_sizes.lock() {
                seen.push(exchange.get_position_size());
            }
            if candles.len() == 1 {
                exchange.entry(OrderRequest::long("dip", 10.0).limit(98.5));
            }
        }
    }

    #[test]
    fn test_strategy_sees_post_fill_state() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut backtester = Backtester::new(config());
        backtester.on_update(
            BinSize::OneMinute,
            Box::new(Probe {
                seen_sizes: Arc::clone(&seen),
            }),
        );

        // third bar's low (97) crosses 98.5; the fill lands before the strategy runs
        let result = backtester.run(&bars(&[100.0, 100.0, 98.0])).unwrap();

        assert_eq!(result.bars, 3);
        assert_eq!(result.final_position.size, 10.0);
        assert_eq!(result.final_position.avg_price, 98.5);
        assert_eq!(result.stats.order_count, 1);
        assert_eq!(result.open_orders, 0);
        assert_eq!(*seen.lock().unwrap(), vec![0.0, 0.0, 10.0]);
    }

    #[test]
    fn test_run_requires_subscription() {
        let mut backtester = Backtester::new(config());
        assert!(backtester.run(&bars(&[1.0])).is_err());
    }

    #[test]
    fn test_from_config_runs() {
        let mut backtester = Backtester::from_config(config()).unwrap();
        let closes: Vec<f64> = (0..60).map(|i| 100.0 + ((i as f64) / 5.0).sin() * 5.0).collect();
        let result = backtester.run(&bars(&closes)).unwrap();

        assert_eq!(result.strategy, "sma_cross");
        assert!(result.stats.order_count > 0);
        assert!(result.final_balance.is_finite());
    }
}
