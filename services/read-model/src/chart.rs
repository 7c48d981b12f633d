//! Hourly OHLC price chart
//!
//! Fills are bucketed by the hour containing their timestamp; each
//! bucket carries open/high/low/close over the bucket's trades in
//! chronological order. The headline last price compares the two most
//! recent trades for its direction indicator.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::decorate::DecoratedTrade;

/// Seconds per chart bucket.
pub const BUCKET_SECONDS: i64 = 3600;

/// Movement of the last price relative to the trade before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    /// Fewer than two trades exist; no comparison is possible.
    Unknown,
}

/// One hour bucket of trade prices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    /// Bucket start, truncated to the hour.
    pub hour: i64,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceChart {
    /// Price of the most recent trade, if any trade exists.
    pub last_price: Option<Decimal>,
    pub direction: Direction,
    /// Buckets in chronological order.
    pub candles: Vec<Candle>,
}

impl PriceChart {
    /// Build the chart from fills in chronological order.
    pub fn build(fills: &[DecoratedTrade]) -> Self {
        let mut buckets: BTreeMap<i64, Candle> = BTreeMap::new();
        for trade in fills {
            let hour = trade.timestamp - trade.timestamp.rem_euclid(BUCKET_SECONDS);
            buckets
                .entry(hour)
                .and_modify(|candle| {
                    candle.high = candle.high.max(trade.price);
                    candle.low = candle.low.min(trade.price);
                    candle.close = trade.price;
                })
                .or_insert(Candle {
                    hour,
                    open: trade.price,
                    high: trade.price,
                    low: trade.price,
                    close: trade.price,
                });
        }

        let last_price = fills.last().map(|trade| trade.price);
        let direction = match fills {
            [.., previous, last] => {
                if last.price >= previous.price {
                    Direction::Up
                } else {
                    Direction::Down
                }
            }
            _ => Direction::Unknown,
        };

        Self {
            last_price,
            direction,
            candles: buckets.into_values().collect(),
        }
    }
}
