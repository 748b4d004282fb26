//! Running trade statistics
//!
//! Counters only ever grow for the lifetime of one exchange instance.

use serde::{Deserialize, Serialize};

use crate::oms::RealizedClose;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TradeStatistics {
    /// Every commit, opens included
    pub order_count: u64,
    pub win_count: u64,
    pub lose_count: u64,
    /// Sum of winning profits, in balance units
    pub win_profit_sum: f64,
    /// Sum of losing magnitudes, in balance units
    pub lose_loss_sum: f64,
    /// Worst close rate seen on a losing trade
    pub max_draw_down: f64,
}

impl TradeStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_commit(&mut self) {
        self.order_count += 1;
    }

    pub fn record_close(&mut self, close: &RealizedClose) {
        if close.is_win() {
            self.win_count += 1;
            self.win_profit_sum += close.balance_delta;
        } else {
            self.lose_count += 1;
            self.lose_loss_sum += -close.balance_delta;
            if close.close_rate > self.max_draw_down {
                self.max_draw_down = close.close_rate;
            }
        }
    }

    /// Winning closes over all commits, in percent. Opens count in the
    /// denominator.
    pub fn win_rate(&self) -> f64 {
        if self.order_count == 0 {
            0.0
        } else {
            self.win_count as f64 / self.order_count as f64 * 100.0
        }
    }

    /// Win sum over loss sum; the raw win sum when nothing was lost
    pub fn profit_factor(&self) -> f64 {
        if self.lose_loss_sum == 0.0 {
            self.win_profit_sum
        } else {
            self.win_profit_sum / self.lose_loss_sum
        }
    }

    pub fn max_draw_down_pct(&self) -> f64 {
        self.max_draw_down * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn close(close_rate: f64, profit: f64, balance_delta: f64) -> RealizedClose {
        RealizedClose {
            prior_size: 1.0,
            entry_price: 100.0,
            exit_price: 100.0,
            close_rate,
            profit,
            balance_delta,
        }
    }

    #[test]
    fn test_empty_stats_guards() {
        let stats = TradeStatistics::new();
        assert_eq!(stats.win_rate(), 0.0);
        assert_eq!(stats.profit_factor(), 0.0);
    }

    #[test]
    fn test_win_and_loss_accumulate() {
        let mut stats = TradeStatistics::new();
        for _ in 0..4 {
            stats.record_commit();
        }
        stats.record_close(&close(0.1, 10.0, 200.0));
        stats.record_close(&close(0.05, -5.0, -50.0));

        assert_eq!(stats.win_count, 1);
        assert_eq!(stats.lose_count, 1);
        assert_relative_eq!(stats.win_profit_sum, 200.0);
        assert_relative_eq!(stats.lose_loss_sum, 50.0);
        assert_relative_eq!(stats.win_rate(), 25.0);
        assert_relative_eq!(stats.profit_factor(), 4.0);
        assert_relative_eq!(stats.max_draw_down, 0.05);
    }

    #[test]
    fn test_profit_factor_without_losses() {
        let mut stats = TradeStatistics::new();
        stats.record_commit();
        stats.record_close(&close(0.2, 3.0, 30.0));
        assert_relative_eq!(stats.profit_factor(), 30.0);
    }

    #[test]
    fn test_drawdown_ignores_wins_and_never_decreases() {
        let mut stats = TradeStatistics::new();
        stats.record_close(&close(0.08, -1.0, -1.0));
        stats.record_close(&close(0.5, 2.0, 2.0));
        stats.record_close(&close(0.03, -1.0, -1.0));

        assert_relative_eq!(stats.max_draw_down, 0.08);
        assert_relative_eq!(stats.max_draw_down_pct(), 8.0);
    }
}
