//! Simulated exchange
//!
//! Reproduces the order lifecycle and account accounting of a margin
//! exchange offline: market and conditional entries, cancellation, per-bar
//! limit/stop matching, and realized PnL with running statistics.
//!
//! Entry follows a declarative "be long / be short" convention rather than
//! delta orders:
//! - an entry in the direction already held is ignored;
//! - an entry against the held direction is sized up by the absolute
//!   position so one fill flattens it and opens the requested size.

use tracing::{debug, info, warn};

use crate::config::Config;
use crate::market::{MarketContext, ReplayMarket};
use crate::oms::{
    check_trigger, CloseTerms, OrderBook, OrderRequest, PendingOrder, Position, PositionManager,
    RealizedClose, Trigger,
};
use crate::stats::TradeStatistics;
use crate::{Candle, Side};

/// Id used by [`Exchange::close_all`]
pub const CLOSE_ORDER_ID: &str = "CLOSE";

/// Operations a strategy may call on an exchange
pub trait Exchange {
    fn get_balance(&self) -> f64;

    fn get_leverage(&self) -> f64;

    fn get_position_size(&self) -> f64;

    fn get_position_avg_price(&self) -> f64;

    /// Resting conditional orders, oldest first
    fn open_orders(&self) -> &[PendingOrder];

    /// Cancel the pending order with this id, if any
    fn cancel(&mut self, id: &str);

    fn cancel_all(&mut self);

    /// Market entry against the held position for its full size
    ///
    /// Routed through [`Exchange::entry`], so the reversal sizing rule
    /// applies on top of the size passed here.
    fn close_all(&mut self);

    fn entry(&mut self, request: OrderRequest);
}

/// Single-account, single-instrument simulated exchange
///
/// Owns all mutable state of one backtest run. Independent runs need
/// independent instances.
#[derive(Debug, Clone)]
pub struct SimExchange<M: MarketContext = ReplayMarket> {
    market: M,
    account: PositionManager,
    book: OrderBook,
    stats: TradeStatistics,
    enable_trade_log: bool,
}

impl SimExchange<ReplayMarket> {
    /// Build an exchange replaying bars with the configured account settings
    pub fn from_config(config: &Config) -> Self {
        let market = ReplayMarket::new(config.exchange.commission)
            .with_leverage(config.exchange.leverage_override);
        SimExchange::new(
            market,
            config.exchange.initial_balance,
            config.exchange.leverage,
        )
        .with_trade_log(config.backtest.enable_trade_log)
    }
}

impl<M: MarketContext> SimExchange<M> {
    pub fn new(market: M, initial_balance: f64, leverage: f64) -> Self {
        Self {
            market,
            account: PositionManager::new(initial_balance, leverage),
            book: OrderBook::new(),
            stats: TradeStatistics::new(),
            enable_trade_log: false,
        }
    }

    pub fn with_trade_log(mut self, enabled: bool) -> Self {
        self.enable_trade_log = enabled;
        self
    }

    pub fn market_mut(&mut self) -> &mut M {
        &mut self.market
    }

    pub fn stats(&self) -> &TradeStatistics {
        &self.stats
    }

    pub fn position(&self) -> Position {
        self.account.position()
    }

    /// Finalize a fill against the account and statistics
    pub fn commit(&mut self, id: &str, side: Side, quantity: f64, price: f64) {
        self.stats.record_commit();

        let terms = CloseTerms {
            commission: self.market.commission(),
            leverage: self.get_leverage(),
            market_price: self.market.market_price(),
        };

        if let Some(close) = self.account.apply_fill(side, quantity, price, &terms) {
            self.stats.record_close(&close);
            if self.enable_trade_log {
                self.log_close(&close);
            }
        }

        if self.enable_trade_log && !self.account.position().is_flat() {
            info!(
                time = ?self.market.now_time(),
                price,
                trade_count = self.stats.order_count,
                id,
                position_size = quantity,
                "Create position"
            );
        }
    }

    /// Matching stage for one bar
    ///
    /// Every pending order is evaluated exactly once against the bar; fills
    /// are committed immediately, triggered bracket stops fall back to their
    /// limit leg, everything else rests. Returns the number of fills.
    pub fn on_bar(&mut self, candle: &Candle) -> usize {
        let pending = self.book.drain();
        let mut survivors = Vec::with_capacity(pending.len());
        let mut fills = 0;

        for order in pending {
            match check_trigger(&order, candle) {
                Trigger::Fill(price) => {
                    debug!(id = %order.id, side = %order.side, price, "Pending order filled");
                    self.commit(&order.id, order.side, order.quantity, price);
                    fills += 1;
                }
                Trigger::StopToLimit => {
                    debug!(id = %order.id, "Stop triggered, resting as limit");
                    survivors.push(PendingOrder {
                        stop_price: None,
                        ..order
                    });
                }
                Trigger::Hold => survivors.push(order),
            }
        }

        self.book.restore(survivors);
        fills
    }

    fn log_close(&self, close: &RealizedClose) {
        info!(
            trade_count = self.stats.order_count,
            position_size = close.prior_size,
            entry_price = close.entry_price,
            exit_price = close.exit_price,
            profit = close.profit,
            balance = self.account.balance(),
            win_rate = self.stats.win_rate(),
            profit_factor = self.stats.profit_factor(),
            max_draw_down = self.stats.max_draw_down_pct(),
            "Close position"
        );
    }
}

impl<M: MarketContext> Exchange for SimExchange<M> {
    fn get_balance(&self) -> f64 {
        self.account.balance()
    }

    fn get_leverage(&self) -> f64 {
        self.market
            .leverage()
            .unwrap_or_else(|| self.account.leverage())
    }

    fn get_position_size(&self) -> f64 {
        self.account.position().size
    }

    fn get_position_avg_price(&self) -> f64 {
        self.account.position().avg_price
    }

    fn open_orders(&self) -> &[PendingOrder] {
        self.book.orders()
    }

    fn cancel(&mut self, id: &str) {
        self.book.cancel_order(id);
    }

    fn cancel_all(&mut self) {
        self.book.clear();
    }

    fn close_all(&mut self) {
        let size = self.get_position_size();
        if size > 0.0 {
            self.entry(OrderRequest::short(CLOSE_ORDER_ID, size.abs()));
        } else if size < 0.0 {
            self.entry(OrderRequest::long(CLOSE_ORDER_ID, size.abs()));
        }
    }

    fn entry(&mut self, request: OrderRequest) {
        if !request.when {
            return;
        }

        if !(request.quantity.is_finite() && request.quantity > 0.0) {
            debug!(id = %request.id, quantity = request.quantity, "Ignoring entry with no quantity");
            return;
        }

        let pos_size = self.get_position_size();
        match request.side {
            Side::Long if pos_size > 0.0 => return,
            Side::Short if pos_size < 0.0 => return,
            _ => {}
        }

        self.book.cancel_order(&request.id);
        let quantity = request.quantity + pos_size.abs();

        if request.is_conditional() {
            self.book.add_order(PendingOrder::new(
                request.id,
                request.side,
                quantity,
                request.limit_price,
                request.stop_price,
            ));
            return;
        }

        let price = self.market.market_price();
        if !(price.is_finite() && price > 0.0) {
            warn!(id = %request.id, price, "No market price available; market entry dropped");
            return;
        }

        self.commit(&request.id, request.side, quantity, price);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::{DateTime, Utc};
    use std::io;
    use std::sync::{Arc, Mutex};
    use tracing_subscriber::fmt::MakeWriter;

    /// Market context with a settable price
    #[derive(Debug, Clone)]
    struct FixedMarket {
        price: f64,
        commission: f64,
        leverage: Option<f64>,
    }

    impl MarketContext for FixedMarket {
        fn market_price(&self) -> f64 {
            self.price
        }

        fn commission(&self) -> f64 {
            self.commission
        }

        fn leverage(&self) -> Option<f64> {
            self.leverage
        }

        fn now_time(&self) -> Option<DateTime<Utc>> {
            None
        }
    }

    fn exchange(price: f64) -> SimExchange<FixedMarket> {
        let market = FixedMarket {
            price,
            commission: 0.0,
            leverage: None,
        };
        SimExchange::new(market, 10_000_000.0, 1.0)
    }

    fn bar(open: f64, high: f64, low: f64, close: f64) -> Candle {
        Candle::new_unchecked(Utc::now(), open, high, low, close, 1.0)
    }

    #[test]
    fn test_market_entry_opens_position() {
        let mut ex = exchange(10000.0);
        ex.entry(OrderRequest::long("A", 100.0));

        assert_eq!(ex.get_position_size(), 100.0);
        assert_eq!(ex.get_position_avg_price(), 10000.0);
        assert_eq!(ex.stats().order_count, 1);
        assert_eq!(ex.get_balance(), 10_000_000.0);
    }

    #[test]
    fn test_when_false_is_noop() {
        let mut ex = exchange(10000.0);
        ex.entry(OrderRequest::long("A", 100.0).when(false));
        ex.entry(OrderRequest::long("A", 100.0).limit(9000.0).when(false));

        assert!(ex.position().is_flat());
        assert!(ex.open_orders().is_empty());
        assert_eq!(ex.stats().order_count, 0);
    }

    #[test]
    fn test_non_positive_quantity_is_noop() {
        let mut ex = exchange(10000.0);
        ex.entry(OrderRequest::long("A", 10.0));
        ex.entry(OrderRequest::short("B", 0.0));
        ex.entry(OrderRequest::short("B", -5.0));

        assert_eq!(ex.get_position_size(), 10.0);
        assert_eq!(ex.stats().order_count, 1);
    }

    #[test]
    fn test_round_trip_realizes_profit() {
        let mut ex = exchange(10000.0);
        ex.entry(OrderRequest::long("A", 100.0));

        ex.market_mut().price = 11000.0;
        ex.entry(OrderRequest::short("A", 100.0));

        // reversal sizing: 100 requested + 100 held
        assert_eq!(ex.get_position_size(), -100.0);
        assert_eq!(ex.get_position_avg_price(), 11000.0);

        let expected = 100.0 * 0.1 / 11000.0 * 1e8;
        assert_relative_eq!(ex.get_balance(), 10_000_000.0 + expected, max_relative = 1e-12);
        assert_eq!(ex.stats().win_count, 1);
        assert_eq!(ex.stats().lose_count, 0);
        assert_eq!(ex.stats().order_count, 2);
    }

    #[test]
    fn test_close_all_realizes_through_entry() {
        let mut ex = exchange(200.0);
        ex.entry(OrderRequest::short("S", 7.0));
        ex.market_mut().price = 220.0;
        ex.close_all();

        // entry sizing adds the held 7 to the 7 passed by close_all
        assert_eq!(ex.get_position_size(), 7.0);
        assert_eq!(ex.get_position_avg_price(), 220.0);
        assert_eq!(ex.stats().lose_count, 1);
        assert!(ex.get_balance() < 10_000_000.0);
    }

    #[test]
    fn test_commit_can_flatten_exactly() {
        let mut ex = exchange(200.0);
        ex.entry(OrderRequest::short("S", 7.0));
        ex.commit(CLOSE_ORDER_ID, Side::Long, 7.0, 190.0);

        assert!(ex.position().is_flat());
        assert_eq!(ex.get_position_avg_price(), 0.0);
        assert_eq!(ex.stats().win_count, 1);
    }

    #[test]
    fn test_close_all_when_flat_is_noop() {
        let mut ex = exchange(200.0);
        ex.close_all();
        assert_eq!(ex.stats().order_count, 0);
    }

    #[test]
    fn test_conditional_entry_rests_until_bar() {
        let mut ex = exchange(10000.0);
        ex.entry(OrderRequest::long("L", 5.0).limit(9800.0));

        assert_eq!(ex.open_orders().len(), 1);
        assert!(ex.position().is_flat());

        assert_eq!(ex.on_bar(&bar(10000.0, 10100.0, 9900.0, 10050.0)), 0);
        assert_eq!(ex.on_bar(&bar(10000.0, 10100.0, 9700.0, 9900.0)), 1);

        assert_eq!(ex.get_position_size(), 5.0);
        assert_eq!(ex.get_position_avg_price(), 9800.0);
        assert!(ex.open_orders().is_empty());
    }

    #[test]
    fn test_same_id_supersedes_pending() {
        let mut ex = exchange(10000.0);
        ex.entry(OrderRequest::long("L", 5.0).limit(9800.0));
        ex.entry(OrderRequest::long("L", 8.0).stop(10200.0));

        assert_eq!(ex.open_orders().len(), 1);
        let order = &ex.open_orders()[0];
        assert_eq!(order.quantity, 8.0);
        assert_eq!(order.limit_price, None);
        assert_eq!(order.stop_price, Some(10200.0));
    }

    #[test]
    fn test_pending_quantity_includes_opposite_position() {
        let mut ex = exchange(10000.0);
        ex.entry(OrderRequest::long("A", 3.0));
        ex.entry(OrderRequest::short("B", 2.0).stop(9500.0));

        assert_eq!(ex.open_orders()[0].quantity, 5.0);
    }

    #[test]
    fn test_market_entry_without_price_is_dropped() {
        let mut ex = exchange(0.0);
        ex.entry(OrderRequest::long("A", 1.0));
        assert!(ex.position().is_flat());
        assert_eq!(ex.stats().order_count, 0);
    }

    #[test]
    fn test_leverage_override() {
        let mut ex = exchange(100.0);
        assert_eq!(ex.get_leverage(), 1.0);

        ex.market_mut().leverage = Some(5.0);
        assert_eq!(ex.get_leverage(), 5.0);
    }

    #[test]
    fn test_cancel_all_clears_book() {
        let mut ex = exchange(100.0);
        ex.entry(OrderRequest::long("A", 1.0).limit(90.0));
        ex.entry(OrderRequest::long("B", 1.0).stop(110.0));
        ex.cancel_all();
        assert!(ex.open_orders().is_empty());
    }

    /// In-memory log sink for the fmt subscriber
    #[derive(Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if let Ok(mut inner) = self.0.lock() {
                inner.extend_from_slice(buf);
            }
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for LogBuffer {
        type Writer = LogBuffer;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    /// Open at 100, close at 110, returning everything logged at INFO
    fn logged_round_trip(trade_log: bool) -> String {
        let buffer = LogBuffer::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(buffer.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::INFO)
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            let mut ex = exchange(100.0).with_trade_log(trade_log);
            ex.entry(OrderRequest::long("open", 10.0));
            ex.market_mut().price = 110.0;
            ex.commit("exit", Side::Short, 10.0, 110.0);
        });

        let bytes = buffer.0.lock().unwrap().clone();
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn test_trade_log_emits_lifecycle_events() {
        let output = logged_round_trip(true);

        let create = output
            .lines()
            .find(|l| l.contains("Create position"))
            .unwrap();
        assert!(create.contains("trade_count=1"));
        assert!(create.contains("id=\"open\""));
        assert!(create.contains("position_size=10"));

        let close = output
            .lines()
            .find(|l| l.contains("Close position"))
            .unwrap();
        assert!(close.contains("trade_count=2"));
        assert!(close.contains("profit=1"));
        assert!(close.contains("entry_price=100"));
        assert!(close.contains("exit_price=110"));

        // the closing fill leaves the account flat, so nothing is reopened
        assert_eq!(output.matches("Create position").count(), 1);
    }

    #[test]
    fn test_trade_log_disabled_is_silent() {
        let output = logged_round_trip(false);
        assert!(!output.contains("Create position"));
        assert!(!output.contains("Close position"));
    }
}
