//! Event ingestion and snapshot assembly
//!
//! `ReadModel` accumulates raw records from the event log and assembles
//! complete view snapshots on demand. Ingestion is idempotent: events are
//! deduplicated by sequence number, so bulk replay and the incremental
//! subscription can overlap or repeat without double-counting.
//!
//! Bulk loads arrive per kind (cancels, then trades, then orders), so a
//! `Cancel` or `Trade` may be ingested before its `Order`. Resolution is
//! therefore deferred to snapshot time: a referencing event whose order
//! is still unknown at that point is excluded from every view and
//! surfaced as a `Warning`, never a failure.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use escrow::events::{EventKind, ExchangeEvent, SequencedEvent};
use types::amount::Amount;
use types::asset::Asset;
use types::ids::{AccountId, OrderId};

use crate::chart::PriceChart;
use crate::decorate::{decorate_order, decorate_trades, DecoratedOrder, DecoratedTrade};
use crate::my_orders::MyOrders;
use crate::order_book::OrderBook;
use crate::trades::feed;

/// A non-fatal anomaly found while deriving views.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum Warning {
    /// A `Cancel` or `Trade` references an order id with no matching
    /// `Order` event, e.g. after a partial history load.
    #[error("{kind:?} event at sequence {sequence} references unknown order {order_id}")]
    UnknownOrder {
        kind: EventKind,
        order_id: OrderId,
        sequence: u64,
    },
}

/// Raw `Order` event payload as ingested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderRecord {
    pub sequence: u64,
    pub id: OrderId,
    pub user: AccountId,
    pub token_get: Asset,
    pub amount_get: Amount,
    pub token_give: Asset,
    pub amount_give: Amount,
    pub timestamp: i64,
}

/// Raw `Cancel` event payload as ingested. Only the referenced order id
/// matters for derivation; a cancel closes the order, nothing more.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CancelRecord {
    pub sequence: u64,
    pub id: OrderId,
}

/// Raw `Trade` event payload as ingested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TradeRecord {
    pub sequence: u64,
    pub id: OrderId,
    pub maker: AccountId,
    pub taker: AccountId,
    pub token_get: Asset,
    pub amount_get: Amount,
    pub token_give: Asset,
    pub amount_give: Amount,
    pub timestamp: i64,
}

/// A complete, internally consistent set of derived views.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub order_book: OrderBook,
    pub my_orders: MyOrders,
    /// All fills, newest first.
    pub trade_feed: Vec<DecoratedTrade>,
    pub price_chart: PriceChart,
    /// Anomalies found during derivation; the affected events are
    /// excluded from the views above.
    pub warnings: Vec<Warning>,
}

/// Accumulated raw state of the read model.
#[derive(Debug, Default)]
pub struct ReadModel {
    /// Sequence numbers already ingested.
    seen: HashSet<u64>,
    orders: BTreeMap<OrderId, OrderRecord>,
    cancels: Vec<CancelRecord>,
    trades: Vec<TradeRecord>,
    /// Latest reported balance per (user, asset), keyed to the sequence
    /// that reported it so stale events never win.
    balances: HashMap<(AccountId, Asset), (u64, Amount)>,
    accepted: u64,
    duplicates: u64,
}

impl ReadModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ingest one event; returns `false` for a replayed duplicate.
    pub fn apply(&mut self, event: SequencedEvent) -> bool {
        if !self.seen.insert(event.sequence) {
            self.duplicates += 1;
            debug!(sequence = event.sequence, "duplicate event skipped");
            return false;
        }
        self.accepted += 1;

        let sequence = event.sequence;
        match event.event {
            ExchangeEvent::Deposit {
                asset,
                user,
                balance,
                ..
            }
            | ExchangeEvent::Withdraw {
                asset,
                user,
                balance,
                ..
            } => {
                let entry = self.balances.entry((user, asset)).or_insert((0, balance));
                if sequence >= entry.0 {
                    *entry = (sequence, balance);
                }
            }
            ExchangeEvent::Order {
                id,
                user,
                token_get,
                amount_get,
                token_give,
                amount_give,
                timestamp,
            } => {
                self.orders.insert(
                    id,
                    OrderRecord {
                        sequence,
                        id,
                        user,
                        token_get,
                        amount_get,
                        token_give,
                        amount_give,
                        timestamp,
                    },
                );
            }
            ExchangeEvent::Cancel { id, .. } => {
                self.cancels.push(CancelRecord { sequence, id });
            }
            ExchangeEvent::Trade {
                id,
                user,
                token_get,
                amount_get,
                token_give,
                amount_give,
                taker,
                timestamp,
            } => {
                self.trades.push(TradeRecord {
                    sequence,
                    id,
                    maker: user,
                    taker,
                    token_get,
                    amount_get,
                    token_give,
                    amount_give,
                    timestamp,
                });
            }
        }
        true
    }

    /// Bulk-ingest a batch of events, typically one per-kind scan from
    /// genesis. Returns the number of newly accepted events.
    pub fn load<I>(&mut self, events: I) -> usize
    where
        I: IntoIterator<Item = SequencedEvent>,
    {
        let before = self.accepted;
        for event in events {
            self.apply(event);
        }
        let applied = (self.accepted - before) as usize;
        info!(
            applied,
            total_accepted = self.accepted,
            duplicates = self.duplicates,
            "bulk load complete"
        );
        applied
    }

    /// Drain every event currently buffered on a subscription channel.
    pub fn drain(&mut self, rx: &mut mpsc::UnboundedReceiver<SequencedEvent>) -> usize {
        let mut applied = 0;
        while let Ok(event) = rx.try_recv() {
            if self.apply(event) {
                applied += 1;
            }
        }
        applied
    }

    /// Events accepted so far.
    pub fn accepted(&self) -> u64 {
        self.accepted
    }

    /// Replayed duplicates skipped so far.
    pub fn duplicates(&self) -> u64 {
        self.duplicates
    }

    /// Latest reported escrow balance for a user and asset.
    pub fn balance_of(&self, asset: Asset, user: &AccountId) -> Amount {
        self.balances
            .get(&(*user, asset))
            .map(|(_, balance)| *balance)
            .unwrap_or(Amount::ZERO)
    }

    /// Derive a complete snapshot of every view for `viewer`.
    pub fn snapshot(&self, viewer: &AccountId) -> Snapshot {
        let mut warnings = Vec::new();
        let mut closed: HashSet<OrderId> = HashSet::new();

        for cancel in &self.cancels {
            if self.orders.contains_key(&cancel.id) {
                closed.insert(cancel.id);
            } else {
                warn!(
                    order_id = %cancel.id,
                    sequence = cancel.sequence,
                    "cancel references unknown order, dropped"
                );
                warnings.push(Warning::UnknownOrder {
                    kind: EventKind::Cancel,
                    order_id: cancel.id,
                    sequence: cancel.sequence,
                });
            }
        }

        let mut fills: Vec<TradeRecord> = Vec::new();
        for trade in &self.trades {
            if self.orders.contains_key(&trade.id) {
                closed.insert(trade.id);
                fills.push(trade.clone());
            } else {
                warn!(
                    order_id = %trade.id,
                    sequence = trade.sequence,
                    "trade references unknown order, dropped"
                );
                warnings.push(Warning::UnknownOrder {
                    kind: EventKind::Trade,
                    order_id: trade.id,
                    sequence: trade.sequence,
                });
            }
        }
        // Chronological, with log position breaking timestamp ties.
        fills.sort_by_key(|trade| (trade.timestamp, trade.sequence));
        let fills: Vec<DecoratedTrade> = decorate_trades(&fills);

        // BTreeMap iteration gives creation (id) order.
        let open: Vec<DecoratedOrder> = self
            .orders
            .values()
            .filter(|order| !closed.contains(&order.id))
            .map(decorate_order)
            .collect();

        Snapshot {
            order_book: OrderBook::from_open_orders(&open, viewer),
            my_orders: MyOrders::build(&open, &fills, viewer),
            trade_feed: feed(&fills),
            price_chart: PriceChart::build(&fills),
            warnings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn whole(n: u64) -> Amount {
        Amount::from_whole(n).unwrap()
    }

    fn order_event(sequence: u64, id: u64, user: AccountId, timestamp: i64) -> SequencedEvent {
        SequencedEvent {
            sequence,
            event: ExchangeEvent::Order {
                id: OrderId::new(id),
                user,
                token_get: Asset::Token,
                amount_get: whole(1),
                token_give: Asset::Ether,
                amount_give: whole(1),
                timestamp,
            },
        }
    }

    fn trade_event(
        sequence: u64,
        id: u64,
        maker: AccountId,
        taker: AccountId,
        timestamp: i64,
    ) -> SequencedEvent {
        SequencedEvent {
            sequence,
            event: ExchangeEvent::Trade {
                id: OrderId::new(id),
                user: maker,
                token_get: Asset::Token,
                amount_get: whole(1),
                token_give: Asset::Ether,
                amount_give: whole(1),
                taker,
                timestamp,
            },
        }
    }

    fn cancel_event(sequence: u64, id: u64, user: AccountId, timestamp: i64) -> SequencedEvent {
        SequencedEvent {
            sequence,
            event: ExchangeEvent::Cancel {
                id: OrderId::new(id),
                user,
                token_get: Asset::Token,
                amount_get: whole(1),
                token_give: Asset::Ether,
                amount_give: whole(1),
                timestamp,
            },
        }
    }

    const T0: i64 = 1_700_000_000;

    #[test]
    fn test_duplicate_events_are_skipped() {
        let mut model = ReadModel::new();
        let maker = AccountId::new();

        assert!(model.apply(order_event(1, 1, maker, T0)));
        assert!(!model.apply(order_event(1, 1, maker, T0)));
        assert_eq!(model.accepted(), 1);
        assert_eq!(model.duplicates(), 1);
    }

    #[test]
    fn test_replay_yields_identical_snapshot() {
        let maker = AccountId::new();
        let taker = AccountId::new();
        let viewer = AccountId::new();
        let events = vec![
            order_event(1, 1, maker, T0),
            order_event(2, 2, maker, T0 + 10),
            trade_event(3, 1, maker, taker, T0 + 20),
            cancel_event(4, 2, maker, T0 + 30),
        ];

        let mut once = ReadModel::new();
        once.load(events.clone());

        let mut twice = ReadModel::new();
        twice.load(events.clone());
        twice.load(events);

        assert_eq!(once.snapshot(&viewer), twice.snapshot(&viewer));
    }

    #[test]
    fn test_open_set_excludes_cancelled_and_filled() {
        let maker = AccountId::new();
        let taker = AccountId::new();
        let viewer = AccountId::new();
        let mut model = ReadModel::new();
        model.load(vec![
            order_event(1, 1, maker, T0),
            order_event(2, 2, maker, T0 + 1),
            order_event(3, 3, maker, T0 + 2),
            cancel_event(4, 2, maker, T0 + 3),
            trade_event(5, 3, maker, taker, T0 + 4),
        ]);

        let snapshot = model.snapshot(&viewer);
        let open_ids: Vec<OrderId> = snapshot
            .order_book
            .buy
            .iter()
            .chain(snapshot.order_book.sell.iter())
            .map(|order| order.id)
            .collect();
        assert_eq!(open_ids, vec![OrderId::new(1)]);
    }

    #[test]
    fn test_per_kind_load_order_is_tolerated() {
        // Cancels and trades load before the orders they reference.
        let maker = AccountId::new();
        let taker = AccountId::new();
        let viewer = AccountId::new();
        let mut model = ReadModel::new();
        model.load(vec![cancel_event(4, 2, maker, T0 + 3)]);
        model.load(vec![trade_event(5, 3, maker, taker, T0 + 4)]);
        model.load(vec![
            order_event(1, 1, maker, T0),
            order_event(2, 2, maker, T0 + 1),
            order_event(3, 3, maker, T0 + 2),
        ]);

        let snapshot = model.snapshot(&viewer);
        assert!(snapshot.warnings.is_empty());
        assert_eq!(snapshot.trade_feed.len(), 1);
        let open: usize = snapshot.order_book.buy.len() + snapshot.order_book.sell.len();
        assert_eq!(open, 1);
    }

    #[test]
    fn test_orphan_events_produce_warnings_not_failures() {
        let maker = AccountId::new();
        let taker = AccountId::new();
        let viewer = AccountId::new();
        let mut model = ReadModel::new();
        model.load(vec![
            trade_event(1, 77, maker, taker, T0),
            cancel_event(2, 88, maker, T0 + 1),
        ]);

        let snapshot = model.snapshot(&viewer);
        assert!(snapshot.trade_feed.is_empty());
        assert_eq!(
            snapshot.warnings,
            vec![
                Warning::UnknownOrder {
                    kind: EventKind::Cancel,
                    order_id: OrderId::new(88),
                    sequence: 2,
                },
                Warning::UnknownOrder {
                    kind: EventKind::Trade,
                    order_id: OrderId::new(77),
                    sequence: 1,
                },
            ]
        );
    }

    #[test]
    fn test_balance_mirror_tracks_latest_event() {
        let user = AccountId::new();
        let viewer = AccountId::new();
        let mut model = ReadModel::new();
        model.apply(SequencedEvent {
            sequence: 1,
            event: ExchangeEvent::Deposit {
                asset: Asset::Ether,
                user,
                amount: whole(5),
                balance: whole(5),
            },
        });
        model.apply(SequencedEvent {
            sequence: 2,
            event: ExchangeEvent::Withdraw {
                asset: Asset::Ether,
                user,
                amount: whole(2),
                balance: whole(3),
            },
        });

        assert_eq!(model.balance_of(Asset::Ether, &user), whole(3));
        assert_eq!(model.balance_of(Asset::Token, &user), Amount::ZERO);
        assert_eq!(model.balance_of(Asset::Ether, &viewer), Amount::ZERO);
    }

    proptest::proptest! {
        /// For any closed set of orders with random cancels and fills,
        /// the open set is exactly all minus cancelled minus filled and
        /// no id appears on both sides of the book.
        #[test]
        fn prop_open_set_completeness(
            flags in proptest::collection::vec(0u8..3, 1..30),
        ) {
            let maker = AccountId::new();
            let taker = AccountId::new();
            let viewer = AccountId::new();
            let mut model = ReadModel::new();
            let mut sequence = 0u64;
            let mut expected_open = Vec::new();

            for (i, flag) in flags.iter().enumerate() {
                let id = i as u64 + 1;
                sequence += 1;
                model.apply(order_event(sequence, id, maker, T0 + i as i64));
                match *flag {
                    1 => {
                        sequence += 1;
                        model.apply(cancel_event(sequence, id, maker, T0 + 100));
                    }
                    2 => {
                        sequence += 1;
                        model.apply(trade_event(sequence, id, maker, taker, T0 + 100));
                    }
                    _ => expected_open.push(OrderId::new(id)),
                }
            }

            let book = model.snapshot(&viewer).order_book;
            let mut open_ids: Vec<OrderId> = book
                .buy
                .iter()
                .chain(book.sell.iter())
                .map(|order| order.id)
                .collect();
            open_ids.sort();
            proptest::prop_assert_eq!(open_ids, expected_open);
        }
    }

    #[test]
    fn test_drain_subscription_channel() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let maker = AccountId::new();
        tx.send(order_event(1, 1, maker, T0)).unwrap();
        tx.send(order_event(2, 2, maker, T0 + 1)).unwrap();
        // A replay of sequence 1 arrives on the same channel.
        tx.send(order_event(1, 1, maker, T0)).unwrap();

        let mut model = ReadModel::new();
        assert_eq!(model.drain(&mut rx), 2);
        assert_eq!(model.duplicates(), 1);
    }
}
