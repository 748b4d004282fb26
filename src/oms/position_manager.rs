//! Account balance and net position accounting
//!
//! One account, one instrument. Fills that reduce or reverse the position
//! realize PnL into the balance; fills that open or add never touch it.

use crate::oms::types::Position;
use crate::Side;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Base units per coin (satoshi accounting for BTC-margined contracts)
pub const BASE_UNIT_SCALE: f64 = 100_000_000.0;

/// Market inputs needed to realize PnL on a closing fill
#[derive(Debug, Clone, Copy)]
pub struct CloseTerms {
    pub commission: f64,
    pub leverage: f64,
    /// Reference price used to convert profit into base units
    pub market_price: f64,
}

/// Outcome of a fill that closed (part of) the previous position
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RealizedClose {
    pub prior_size: f64,
    pub entry_price: f64,
    pub exit_price: f64,
    /// Leveraged, commission-adjusted fractional move
    pub close_rate: f64,
    /// Profit in contract terms (size × close rate)
    pub profit: f64,
    /// Profit converted into balance units
    pub balance_delta: f64,
}

impl RealizedClose {
    pub fn is_win(&self) -> bool {
        self.profit > 0.0
    }
}

/// Leveraged close rate and profit for closing `size` opened at `avg_price`
/// with a fill at `price`.
///
/// The percentage move is taken relative to the exit price when the entry
/// basis is above the fill, and relative to the entry basis otherwise, and
/// the sign of the profit follows from that branch rather than from the
/// position side. Commission is subtracted from the move in both branches.
/// This reproduces the reference accounting exactly and is kept as is.
pub fn close_rate(size: f64, avg_price: f64, price: f64, commission: f64, leverage: f64) -> (f64, f64) {
    if avg_price > price {
        let rate = ((avg_price - price) / price - commission) * leverage;
        (rate, -size * rate)
    } else {
        let rate = ((price - avg_price) / avg_price - commission) * leverage;
        (rate, size * rate)
    }
}

/// Owns the balance, stored leverage and net position of the account
#[derive(Debug, Clone)]
pub struct PositionManager {
    position: Position,
    balance: f64,
    leverage: f64,
}

impl PositionManager {
    pub fn new(balance: f64, leverage: f64) -> Self {
        Self {
            position: Position::default(),
            balance,
            leverage,
        }
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn balance(&self) -> f64 {
        self.balance
    }

    pub fn leverage(&self) -> f64 {
        self.leverage
    }

    /// Apply a complete fill and return the realized close, if the fill
    /// reduced, flattened or reversed the existing position.
    pub fn apply_fill(
        &mut self,
        side: Side,
        quantity: f64,
        price: f64,
        terms: &CloseTerms,
    ) -> Option<RealizedClose> {
        let size = self.position.size;
        let order_qty = side.sign() * quantity;
        let next_qty = size + order_qty;

        let closing = (size > 0.0 && order_qty <= 0.0) || (size < 0.0 && order_qty >= 0.0);

        let realized = if closing {
            let (rate, profit) = close_rate(
                size,
                self.position.avg_price,
                price,
                terms.commission,
                terms.leverage,
            );
            let balance_delta = to_base_units(profit, terms.market_price);
            self.balance += balance_delta;

            Some(RealizedClose {
                prior_size: size,
                entry_price: self.position.avg_price,
                exit_price: price,
                close_rate: rate,
                profit,
                balance_delta,
            })
        } else {
            None
        };

        // Whatever remains is re-based to the fill price; no blending.
        if next_qty != 0.0 {
            self.position = Position {
                size: next_qty,
                avg_price: price,
            };
        } else {
            self.position = Position::default();
        }

        realized
    }
}

/// Convert contract profit into balance units at the given market price
pub fn to_base_units(profit: f64, market_price: f64) -> f64 {
    if market_price > 0.0 && market_price.is_finite() {
        profit / market_price * BASE_UNIT_SCALE
    } else {
        warn!(
            market_price,
            profit, "No usable market price; realized profit not credited"
        );
        0.0
    }
}
