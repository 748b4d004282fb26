//! Parameter Optimization Framework
//!
//! Parallel grid search: every parameter combination gets its own
//! backtester, strategy and exchange; bar data is shared read-only.

use indicatif::ProgressBar;
use itertools::Itertools;
use rayon::prelude::*;
use serde::Serialize;
use std::collections::HashMap;
use std::str::FromStr;
use tracing::{error, info};

use crate::backtest::Backtester;
use crate::{Candle, Config};

/// Optimization result for a single parameter combination
#[derive(Debug, Clone, Serialize)]
pub struct OptimizationResult {
    pub params: HashMap<String, f64>,
    pub total_return: f64,
    pub final_balance: f64,
    pub win_rate: f64,
    pub profit_factor: f64,
    pub max_draw_down: f64,
    pub order_count: u64,
}

/// Metric used to rank optimization results
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortMetric {
    Return,
    WinRate,
    ProfitFactor,
    /// Lowest drawdown first
    Drawdown,
}

impl FromStr for SortMetric {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "return" => Ok(SortMetric::Return),
            "win_rate" => Ok(SortMetric::WinRate),
            "profit_factor" => Ok(SortMetric::ProfitFactor),
            "drawdown" => Ok(SortMetric::Drawdown),
            other => anyhow::bail!(
                "Unknown sort metric: {}. Use return, win_rate, profit_factor or drawdown",
                other
            ),
        }
    }
}

/// Numeric strategy parameters of a config, for reporting
pub fn extract_params(config: &Config) -> HashMap<String, f64> {
    config
        .strategy
        .as_object()
        .map(|obj| {
            obj.iter()
                .filter_map(|(k, v)| v.as_f64().map(|f| (k.clone(), f)))
                .collect()
        })
        .unwrap_or_default()
}

/// Expand a `grid` section (param → candidate values) into configs
pub fn configs_from_grid(
    base_config: &Config,
    grid: &HashMap<String, Vec<serde_json::Value>>,
) -> Vec<Config> {
    // Sorted keys keep the expansion order stable across runs
    let keys: Vec<&String> = grid.keys().sorted().collect();
    if keys.is_empty() {
        return vec![base_config.clone()];
    }

    keys.iter()
        .map(|k| grid[*k].iter())
        .multi_cartesian_product()
        .map(|values| {
            let mut config = base_config.clone();
            for (key, value) in keys.iter().zip(values) {
                config.set_strategy_param(key, value.clone());
            }
            config
        })
        .collect()
}

pub struct Optimizer {
    sequential: bool,
}

impl Optimizer {
    pub fn new() -> Self {
        Optimizer { sequential: false }
    }

    /// Run combinations one after another (for debugging)
    pub fn sequential(mut self, sequential: bool) -> Self {
        self.sequential = sequential;
        self
    }

    pub fn optimize(
        &self,
        candles: &[Candle],
        configs: Vec<Config>,
        progress_bar: Option<ProgressBar>,
    ) -> Vec<OptimizationResult> {
        info!("Testing {} parameter combinations", configs.len());

        let run_one = |config: &Config| -> Option<OptimizationResult> {
            let outcome = Backtester::from_config(config.clone())
                .and_then(|mut backtester| backtester.run(candles));
            if let Some(pb) = &progress_bar {
                pb.inc(1);
            }

            match outcome {
                Ok(result) => Some(OptimizationResult {
                    params: extract_params(config),
                    total_return: result.total_return,
                    final_balance: result.final_balance,
                    win_rate: result.win_rate,
                    profit_factor: result.profit_factor,
                    max_draw_down: result.max_draw_down,
                    order_count: result.stats.order_count,
                }),
                Err(e) => {
                    error!("Backtest failed for {:?}: {:#}", extract_params(config), e);
                    None
                }
            }
        };

        if self.sequential {
            configs.iter().filter_map(run_one).collect()
        } else {
            configs.par_iter().filter_map(run_one).collect()
        }
    }

    /// Sort results best-first by the chosen metric
    pub fn sort_results(results: &mut [OptimizationResult], metric: SortMetric) {
        let key = |r: &OptimizationResult| match metric {
            SortMetric::Return => r.total_return,
            SortMetric::WinRate => r.win_rate,
            SortMetric::ProfitFactor => r.profit_factor,
            SortMetric::Drawdown => -r.max_draw_down,
        };
        results.sort_by(|a, b| key(b).total_cmp(&key(a)));
    }
}

impl Default for Optimizer {
    fn default() -> Self {
        Self::new()
    }
}
