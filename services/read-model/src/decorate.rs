//! Decoration: raw order/trade records to presentable view rows
//!
//! Classifies side, computes display amounts and price, and formats
//! timestamps. Price is the native-coin leg divided by the token leg in
//! display units, rounded to 5 decimal places half-up (away from zero at
//! the midpoint), matching what the feed and chart compare against.

use chrono::DateTime;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use types::asset::Asset;
use types::ids::{AccountId, OrderId};

use crate::builder::{OrderRecord, TradeRecord};

/// Decimal places of a presented price.
pub const PRICE_DP: u32 = 5;

/// Side of an order, from the maker's perspective.
///
/// A maker giving the native coin is buying tokens; a maker giving
/// tokens is selling them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderType {
    Buy,
    Sell,
}

impl OrderType {
    /// The converse side, used when presenting a fill to its taker.
    pub fn opposite(&self) -> OrderType {
        match self {
            OrderType::Buy => OrderType::Sell,
            OrderType::Sell => OrderType::Buy,
        }
    }
}

/// Price movement relative to the preceding trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
}

/// An order ready for presentation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecoratedOrder {
    pub id: OrderId,
    pub user: AccountId,
    pub order_type: OrderType,
    /// Native-coin leg in display units.
    pub ether_amount: Decimal,
    /// Token leg in display units.
    pub token_amount: Decimal,
    /// Native-coin units per token, rounded to 5 decimal places.
    pub price: Decimal,
    pub timestamp: i64,
    pub formatted_timestamp: String,
}

/// A fill ready for presentation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecoratedTrade {
    pub order_id: OrderId,
    pub maker: AccountId,
    pub taker: AccountId,
    /// Side of the maker's order.
    pub order_type: OrderType,
    pub ether_amount: Decimal,
    pub token_amount: Decimal,
    pub price: Decimal,
    pub trend: Trend,
    pub timestamp: i64,
    pub formatted_timestamp: String,
}

/// Split an order's two legs into (ether, token) display amounts.
fn legs(token_give: Asset, amount_get: Decimal, amount_give: Decimal) -> (Decimal, Decimal) {
    if token_give.is_ether() {
        (amount_give, amount_get)
    } else {
        (amount_get, amount_give)
    }
}

/// Native-coin units per token, rounded half-up to 5 decimal places.
///
/// A zero token leg yields a zero price rather than a failure; such an
/// order is degenerate but must not poison the whole view.
pub fn price(ether_amount: Decimal, token_amount: Decimal) -> Decimal {
    ether_amount
        .checked_div(token_amount)
        .unwrap_or(Decimal::ZERO)
        .round_dp_with_strategy(PRICE_DP, RoundingStrategy::MidpointAwayFromZero)
}

/// Wall-clock rendering of a unix timestamp, UTC.
pub fn format_timestamp(timestamp: i64) -> String {
    DateTime::from_timestamp(timestamp, 0)
        .map(|dt| dt.format("%H:%M:%S %d %b %Y").to_string())
        .unwrap_or_default()
}

/// Decorate one raw order record.
pub fn decorate_order(record: &OrderRecord) -> DecoratedOrder {
    let order_type = if record.token_give.is_ether() {
        OrderType::Buy
    } else {
        OrderType::Sell
    };
    let (ether_amount, token_amount) = legs(
        record.token_give,
        record.amount_get.to_units(),
        record.amount_give.to_units(),
    );
    DecoratedOrder {
        id: record.id,
        user: record.user,
        order_type,
        ether_amount,
        token_amount,
        price: price(ether_amount, token_amount),
        timestamp: record.timestamp,
        formatted_timestamp: format_timestamp(record.timestamp),
    }
}

/// Decorate fills in chronological order, tagging each with its trend.
///
/// Input must already be sorted chronologically; each trade is compared
/// against its immediate predecessor. The first trade, a trade whose
/// price is at or above its predecessor's, and a trade sharing its
/// predecessor's order id all read as `Up`.
pub fn decorate_trades(records: &[TradeRecord]) -> Vec<DecoratedTrade> {
    let mut decorated = Vec::with_capacity(records.len());
    let mut previous: Option<(OrderId, Decimal)> = None;

    for record in records {
        let order_type = if record.token_give.is_ether() {
            OrderType::Buy
        } else {
            OrderType::Sell
        };
        let (ether_amount, token_amount) = legs(
            record.token_give,
            record.amount_get.to_units(),
            record.amount_give.to_units(),
        );
        let trade_price = price(ether_amount, token_amount);

        let trend = match previous {
            None => Trend::Up,
            Some((prev_id, _)) if prev_id == record.id => Trend::Up,
            Some((_, prev_price)) if trade_price >= prev_price => Trend::Up,
            Some(_) => Trend::Down,
        };
        previous = Some((record.id, trade_price));

        decorated.push(DecoratedTrade {
            order_id: record.id,
            maker: record.maker,
            taker: record.taker,
            order_type,
            ether_amount,
            token_amount,
            price: trade_price,
            trend,
            timestamp: record.timestamp,
            formatted_timestamp: format_timestamp(record.timestamp),
        });
    }
    decorated
}
