//! Viewer-scoped order history
//!
//! Two sequences: the viewer's still-open orders, newest first, and the
//! fills they took part in, chronological. A fill is re-sided for the
//! viewer: the maker sees the order's own side, the taker sees the
//! converse (filling a buy is selling, and vice versa).

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use types::ids::{AccountId, OrderId};

use crate::decorate::{DecoratedOrder, DecoratedTrade, OrderType};

/// One fill from the viewer's perspective.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MyFill {
    pub order_id: OrderId,
    /// Side of the viewer's action, not of the underlying order.
    pub order_type: OrderType,
    pub ether_amount: Decimal,
    pub token_amount: Decimal,
    pub price: Decimal,
    pub timestamp: i64,
    pub formatted_timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MyOrders {
    /// The viewer's open orders, newest first.
    pub open: Vec<DecoratedOrder>,
    /// Fills where the viewer was maker or taker, chronological.
    pub filled: Vec<MyFill>,
}

impl MyOrders {
    /// Filter the open set and fill history down to `viewer`.
    ///
    /// `fills` must be in chronological order, which is preserved.
    pub fn build(open: &[DecoratedOrder], fills: &[DecoratedTrade], viewer: &AccountId) -> Self {
        let mut my_open: Vec<DecoratedOrder> = open
            .iter()
            .filter(|order| order.user == *viewer)
            .cloned()
            .collect();
        my_open.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

        let filled = fills
            .iter()
            .filter(|trade| trade.maker == *viewer || trade.taker == *viewer)
            .map(|trade| {
                let order_type = if trade.maker == *viewer {
                    trade.order_type
                } else {
                    trade.order_type.opposite()
                };
                MyFill {
                    order_id: trade.order_id,
                    order_type,
                    ether_amount: trade.ether_amount,
                    token_amount: trade.token_amount,
                    price: trade.price,
                    timestamp: trade.timestamp,
                    formatted_timestamp: trade.formatted_timestamp.clone(),
                }
            })
            .collect();

        Self {
            open: my_open,
            filled,
        }
    }
}
