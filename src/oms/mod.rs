//! Order Management System (OMS)
//!
//! Building blocks of the simulated exchange:
//! - Pending conditional orders keyed by caller id
//! - Intra-candle limit / stop / stop-limit trigger rules
//! - Net position accounting with leverage- and commission-adjusted PnL

pub mod execution;
pub mod orderbook;
pub mod position_manager;
pub mod types;

// Re-export core types
pub use execution::{check_trigger, Trigger};
pub use orderbook::OrderBook;
pub use position_manager::{CloseTerms, PositionManager, RealizedClose, BASE_UNIT_SCALE};
pub use types::{OrderId, OrderRequest, PendingOrder, Position};
