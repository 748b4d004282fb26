//! Simulated Exchange for Strategy Backtesting
//!
//! A deterministic in-process stand-in for a margin-contract exchange:
//! strategies place market and conditional orders against it, pending
//! orders are matched against historical OHLC bars, and realized PnL,
//! balance and trade statistics are tracked per run. Includes a bar
//! replay driver and a parallel parameter optimizer.

pub mod backtest;
pub mod config;
pub mod data;
pub mod exchange;
pub mod indicators;
pub mod market;
pub mod oms;
pub mod optimizer;
pub mod stats;
pub mod strategies;
pub mod types;

pub use backtest::{BacktestResult, Backtester};
pub use config::Config;
pub use exchange::{Exchange, SimExchange};
pub use market::{MarketContext, ReplayMarket};
pub use stats::TradeStatistics;
pub use strategies::Strategy;
pub use types::*;
