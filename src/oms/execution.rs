//! Execution rules with intra-candle trigger detection
//!
//! Decides, for one pending order and one bar, whether the order fills,
//! degrades from a stop-limit bracket into a plain limit, or keeps resting.
//! All comparisons are strict: touching a price does not trigger it.

use crate::oms::types::PendingOrder;
use crate::{Candle, Side};

/// What a bar does to a pending order
#[derive(Debug, Clone, PartialEq)]
pub enum Trigger {
    /// Fill the whole order at this price
    Fill(f64),

    /// Stop leg breached without the limit condition: keep the order as
    /// limit-only
    StopToLimit,

    /// Nothing happened
    Hold,
}

/// Evaluate one pending order against the current bar
pub fn check_trigger(order: &PendingOrder, candle: &Candle) -> Trigger {
    match (order.limit_price, order.stop_price) {
        (Some(limit), Some(stop)) => {
            let stop_hit = stop_breached(order.side, stop, candle);
            let limit_ok = match order.side {
                Side::Long => candle.close < limit,
                Side::Short => candle.close > limit,
            };

            if stop_hit && limit_ok {
                Trigger::Fill(limit)
            } else if stop_hit {
                Trigger::StopToLimit
            } else {
                Trigger::Hold
            }
        }

        // Buy limit fills when the low trades through it, sell limit when the high does
        (Some(limit), None) => {
            let crossed = match order.side {
                Side::Long => candle.low < limit,
                Side::Short => candle.high > limit,
            };
            if crossed {
                Trigger::Fill(limit)
            } else {
                Trigger::Hold
            }
        }

        (None, Some(stop)) => {
            if stop_breached(order.side, stop, candle) {
                Trigger::Fill(stop)
            } else {
                Trigger::Hold
            }
        }

        // Market orders never rest in the book
        (None, None) => Trigger::Hold,
    }
}

/// Buy stop triggers above the stop, sell stop below it
fn stop_breached(side: Side, stop: f64, candle: &Candle) -> bool {
    match side {
        Side::Long => candle.high > stop,
        Side::Short => candle.low < stop,
    }
}
