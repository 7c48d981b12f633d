//! Read-Model Service for the Escrow Exchange
//!
//! Consumes the append-only event log (bulk replay plus incremental
//! subscription) and derives every presented view from it: the grouped
//! order book, per-user order history, the colored trade feed, and the
//! hourly OHLC price chart. The log is the sole input; no live exchange
//! state is consulted.
//!
//! Views are rebuilt, never mutated in place: each `snapshot` call walks
//! the accumulated raw records through a pure stage-by-stage pipeline and
//! returns a complete, internally consistent result.
//!
//! # Modules
//! - `builder`: Event ingestion, replay deduplication, and snapshot assembly
//! - `decorate`: Order/trade decoration (order type, price, trend, display fields)
//! - `order_book`: Open orders grouped by side, sorted by price
//! - `my_orders`: Viewer-scoped open orders and fill history
//! - `trades`: The newest-first trade feed
//! - `chart`: Hourly OHLC candles and the last-price direction

pub mod builder;
pub mod chart;
pub mod decorate;
pub mod my_orders;
pub mod order_book;
pub mod trades;

pub use builder::{ReadModel, Snapshot, Warning};
pub use chart::{Candle, Direction, PriceChart};
pub use decorate::{DecoratedOrder, DecoratedTrade, OrderType, Trend};
pub use my_orders::{MyFill, MyOrders};
pub use order_book::OrderBook;
