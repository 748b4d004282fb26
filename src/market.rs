//! Market context consumed by the simulated exchange
//!
//! The exchange never reads prices or clocks directly. It asks a
//! [`MarketContext`] for the current reference price, commission, leverage
//! override and bar time. [`ReplayMarket`] answers from the bar currently
//! being replayed.

use chrono::{DateTime, Utc};

use crate::Candle;

pub trait MarketContext {
    /// Reference price for market fills and PnL normalization
    fn market_price(&self) -> f64;

    /// Fractional commission charged on every realized close
    fn commission(&self) -> f64;

    /// Leverage override. `None` uses the account's stored leverage.
    fn leverage(&self) -> Option<f64> {
        None
    }

    /// Logical time of the current bar, for logging
    fn now_time(&self) -> Option<DateTime<Utc>>;
}

/// Market context replaying historical bars
#[derive(Debug, Clone)]
pub struct ReplayMarket {
    current: Option<Candle>,
    commission: f64,
    leverage: Option<f64>,
}

impl ReplayMarket {
    pub fn new(commission: f64) -> Self {
        Self {
            current: None,
            commission,
            leverage: None,
        }
    }

    pub fn with_leverage(mut self, leverage: Option<f64>) -> Self {
        self.leverage = leverage;
        self
    }

    /// Advance to the next bar
    pub fn set_bar(&mut self, candle: &Candle) {
        self.current = Some(candle.clone());
    }
}

impl MarketContext for ReplayMarket {
    fn market_price(&self) -> f64 {
        self.current.as_ref().map(|c| c.close).unwrap_or(0.0)
    }

    fn commission(&self) -> f64 {
        self.commission
    }

    fn leverage(&self) -> Option<f64> {
        self.leverage
    }

    fn now_time(&self) -> Option<DateTime<Utc>> {
        self.current.as_ref().map(|c| c.datetime)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replay_market_tracks_bar() {
        let mut market = ReplayMarket::new(0.00075).with_leverage(Some(3.0));
        assert_eq!(market.market_price(), 0.0);
        assert!(market.now_time().is_none());

        let bar = Candle::new_unchecked(Utc::now(), 100.0, 110.0, 90.0, 105.0, 1.0);
        market.set_bar(&bar);

        assert_eq!(market.market_price(), 105.0);
        assert_eq!(market.now_time(), Some(bar.datetime));
        assert_eq!(market.commission(), 0.00075);
        assert_eq!(market.leverage(), Some(3.0));
    }
}
