//! Pending order registry
//!
//! Holds resting conditional orders keyed by caller id. Storage is a `Vec`
//! so the per-bar evaluation walks orders in submission order and replays
//! stay deterministic.

use crate::oms::types::PendingOrder;

#[derive(Debug, Clone, Default)]
pub struct OrderBook {
    orders: Vec<PendingOrder>,
}

impl OrderBook {
    pub fn new() -> Self {
        Self { orders: Vec::new() }
    }

    /// Add an order, replacing any pending order with the same id
    pub fn add_order(&mut self, order: PendingOrder) {
        self.cancel_order(&order.id);
        self.orders.push(order);
    }

    /// Remove the order with this id. Missing ids are ignored.
    pub fn cancel_order(&mut self, id: &str) -> Option<PendingOrder> {
        let idx = self.orders.iter().position(|o| o.id == id)?;
        Some(self.orders.remove(idx))
    }

    pub fn get_order(&self, id: &str) -> Option<&PendingOrder> {
        self.orders.iter().find(|o| o.id == id)
    }

    pub fn orders(&self) -> &[PendingOrder] {
        &self.orders
    }

    /// Take every order out, leaving the book empty. Used by the bar
    /// evaluation which rebuilds the book from the survivors.
    pub fn drain(&mut self) -> Vec<PendingOrder> {
        std::mem::take(&mut self.orders)
    }

    /// Put back orders that survived a bar
    pub fn restore(&mut self, survivors: Vec<PendingOrder>) {
        // Orders added while the book was drained queue behind the survivors.
        let placed = std::mem::replace(&mut self.orders, survivors);
        for order in placed {
            self.add_order(order);
        }
    }

    pub fn clear(&mut self) {
        self.orders.clear();
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Side;

    fn limit(id: &str, price: f64) -> PendingOrder {
        PendingOrder::new(id, Side::Long, 1.0, Some(price), None)
    }

    #[test]
    fn test_add_and_cancel_order() {
        let mut book = OrderBook::new();
        book.add_order(limit("A", 9000.0));

        assert_eq!(book.len(), 1);
        assert!(book.get_order("A").is_some());

        let cancelled = book.cancel_order("A");
        assert_eq!(cancelled.map(|o| o.limit_price), Some(Some(9000.0)));
        assert!(book.is_empty());
    }

    #[test]
    fn test_cancel_missing_is_noop() {
        let mut book = OrderBook::new();
        book.add_order(limit("A", 9000.0));

        assert!(book.cancel_order("nope").is_none());
        assert_eq!(book.len(), 1);
    }

    #[test]
    fn test_same_id_replaces() {
        let mut book = OrderBook::new();
        book.add_order(limit("A", 9000.0));
        book.add_order(limit("B", 8900.0));
        book.add_order(limit("A", 9100.0));

        assert_eq!(book.len(), 2);
        let ids: Vec<&str> = book.orders().iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, vec!["B", "A"]);
        assert_eq!(book.get_order("A").and_then(|o| o.limit_price), Some(9100.0));
    }

    #[test]
    fn test_drain_and_restore_keeps_order() {
        let mut book = OrderBook::new();
        book.add_order(limit("A", 1.0));
        book.add_order(limit("B", 2.0));

        let drained = book.drain();
        assert!(book.is_empty());

        book.restore(drained);
        let ids: Vec<&str> = book.orders().iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, vec!["A", "B"]);
    }
}
