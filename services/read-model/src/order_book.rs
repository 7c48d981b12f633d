//! The grouped order book
//!
//! Open orders not owned by the viewer, split by side. Each side is
//! sorted by price descending; ties keep creation order (stable sort
//! over input already in id order).

use serde::{Deserialize, Serialize};
use types::ids::AccountId;

use crate::decorate::{DecoratedOrder, OrderType};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderBook {
    pub buy: Vec<DecoratedOrder>,
    pub sell: Vec<DecoratedOrder>,
}

impl OrderBook {
    /// Group and sort the viewer-excluded open set.
    pub fn from_open_orders(open: &[DecoratedOrder], viewer: &AccountId) -> Self {
        let mut buy = Vec::new();
        let mut sell = Vec::new();
        for order in open.iter().filter(|order| order.user != *viewer) {
            match order.order_type {
                OrderType::Buy => buy.push(order.clone()),
                OrderType::Sell => sell.push(order.clone()),
            }
        }
        buy.sort_by(|a, b| b.price.cmp(&a.price));
        sell.sort_by(|a, b| b.price.cmp(&a.price));
        Self { buy, sell }
    }

    pub fn is_empty(&self) -> bool {
        self.buy.is_empty() && self.sell.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decorate::format_timestamp;
    use rust_decimal::Decimal;
    use types::ids::OrderId;

    fn open_order(id: u64, user: AccountId, order_type: OrderType, price: &str) -> DecoratedOrder {
        DecoratedOrder {
            id: OrderId::new(id),
            user,
            order_type,
            ether_amount: Decimal::ONE,
            token_amount: Decimal::ONE,
            price: Decimal::from_str_exact(price).unwrap(),
            timestamp: 1_700_000_000 + id as i64,
            formatted_timestamp: format_timestamp(1_700_000_000 + id as i64),
        }
    }

    #[test]
    fn test_groups_by_side_and_sorts_price_descending() {
        let maker = AccountId::new();
        let viewer = AccountId::new();
        let open = vec![
            open_order(1, maker, OrderType::Buy, "0.10"),
            open_order(2, maker, OrderType::Sell, "0.30"),
            open_order(3, maker, OrderType::Buy, "0.20"),
            open_order(4, maker, OrderType::Sell, "0.25"),
        ];

        let book = OrderBook::from_open_orders(&open, &viewer);
        let buy_ids: Vec<u64> = book.buy.iter().map(|o| o.id.value()).collect();
        let sell_ids: Vec<u64> = book.sell.iter().map(|o| o.id.value()).collect();
        assert_eq!(buy_ids, vec![3, 1]);
        assert_eq!(sell_ids, vec![2, 4]);
    }

    #[test]
    fn test_excludes_viewer_orders() {
        let maker = AccountId::new();
        let viewer = AccountId::new();
        let open = vec![
            open_order(1, maker, OrderType::Buy, "0.10"),
            open_order(2, viewer, OrderType::Buy, "0.20"),
        ];

        let book = OrderBook::from_open_orders(&open, &viewer);
        assert_eq!(book.buy.len(), 1);
        assert_eq!(book.buy[0].id, OrderId::new(1));
    }

    #[test]
    fn test_equal_prices_keep_creation_order() {
        let maker = AccountId::new();
        let viewer = AccountId::new();
        let open = vec![
            open_order(1, maker, OrderType::Buy, "0.10"),
            open_order(2, maker, OrderType::Buy, "0.10"),
            open_order(3, maker, OrderType::Buy, "0.10"),
        ];

        let book = OrderBook::from_open_orders(&open, &viewer);
        let ids: Vec<u64> = book.buy.iter().map(|o| o.id.value()).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }
}
