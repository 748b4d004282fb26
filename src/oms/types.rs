//! Core OMS types
//!
//! Pending conditional orders, entry requests and the net position.

use crate::Side;
use serde::{Deserialize, Serialize};

/// Caller-assigned order identifier. Unique among pending orders only.
pub type OrderId = String;

/// A conditional (limit and/or stop) order waiting for a bar to trigger it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingOrder {
    pub id: OrderId,

    pub side: Side,

    /// Effective quantity, already including any opposite position to flatten
    pub quantity: f64,

    /// Limit price (fills at this price when crossed favourably)
    pub limit_price: Option<f64>,

    /// Stop price (fills at this price when crossed adversely)
    pub stop_price: Option<f64>,
}

impl PendingOrder {
    pub fn new(
        id: impl Into<OrderId>,
        side: Side,
        quantity: f64,
        limit_price: Option<f64>,
        stop_price: Option<f64>,
    ) -> Self {
        Self {
            id: id.into(),
            side,
            quantity,
            limit_price: positive(limit_price),
            stop_price: positive(stop_price),
        }
    }
}

/// Order intent issued by a strategy
///
/// Mirrors a declarative "be long/short by this much" call: no limit and no
/// stop means a market order, `when = false` turns the call into a no-op.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderRequest {
    pub id: OrderId,
    pub side: Side,
    pub quantity: f64,
    pub limit_price: Option<f64>,
    pub stop_price: Option<f64>,
    pub when: bool,
}

impl OrderRequest {
    pub fn new(id: impl Into<OrderId>, side: Side, quantity: f64) -> Self {
        Self {
            id: id.into(),
            side,
            quantity,
            limit_price: None,
            stop_price: None,
            when: true,
        }
    }

    pub fn long(id: impl Into<OrderId>, quantity: f64) -> Self {
        Self::new(id, Side::Long, quantity)
    }

    pub fn short(id: impl Into<OrderId>, quantity: f64) -> Self {
        Self::new(id, Side::Short, quantity)
    }

    /// Set a limit price. Non-positive prices leave the leg unset.
    pub fn limit(mut self, price: f64) -> Self {
        self.limit_price = positive(Some(price));
        self
    }

    /// Set a stop price. Non-positive prices leave the leg unset.
    pub fn stop(mut self, price: f64) -> Self {
        self.stop_price = positive(Some(price));
        self
    }

    pub fn when(mut self, condition: bool) -> Self {
        self.when = condition;
        self
    }

    /// Conditional orders rest in the book; market orders fill immediately
    pub fn is_conditional(&self) -> bool {
        positive(self.limit_price).is_some() || positive(self.stop_price).is_some()
    }
}

/// Net position of the single simulated account
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Signed size: positive long, negative short, zero flat
    pub size: f64,

    /// Entry basis. Always 0 while flat.
    pub avg_price: f64,
}

impl Position {
    pub fn is_flat(&self) -> bool {
        self.size == 0.0
    }
}

fn positive(price: Option<f64>) -> Option<f64> {
    price.filter(|p| p.is_finite() && *p > 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_builder() {
        let req = OrderRequest::long("L", 100.0).limit(9500.0).when(false);
        assert_eq!(req.side, Side::Long);
        assert_eq!(req.limit_price, Some(9500.0));
        assert_eq!(req.stop_price, None);
        assert!(!req.when);
        assert!(req.is_conditional());
    }

    #[test]
    fn test_zero_prices_mean_market() {
        let req = OrderRequest::short("S", 1.0).limit(0.0).stop(-5.0);
        assert!(!req.is_conditional());

        let order = PendingOrder::new("S", Side::Short, 1.0, Some(0.0), Some(10.0));
        assert_eq!(order.limit_price, None);
        assert_eq!(order.stop_price, Some(10.0));
    }

    #[test]
    fn test_default_position_is_flat() {
        let pos = Position::default();
        assert!(pos.is_flat());
        assert_eq!(pos.avg_price, 0.0);
    }
}
