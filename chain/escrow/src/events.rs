//! The closed event taxonomy emitted by the exchange
//!
//! Events are immutable records of state transitions and the only input
//! the read-model builder consumes. Each variant is self-contained: it
//! carries every field needed to reconstruct the corresponding balance or
//! order change without consulting live state.
//!
//! The log wraps each event in a `SequencedEvent` whose monotonic
//! sequence number is the emission order; downstream consumers use it
//! for ordering and deduplication.

use serde::{Deserialize, Serialize};
use types::amount::Amount;
use types::asset::Asset;
use types::ids::{AccountId, OrderId};

/// Event kinds, used by the per-kind bulk query surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    Deposit,
    Withdraw,
    Order,
    Cancel,
    Trade,
}

/// A state transition recorded by the exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event_type")]
pub enum ExchangeEvent {
    /// Funds credited to a user's escrow balance.
    Deposit {
        asset: Asset,
        user: AccountId,
        amount: Amount,
        /// Balance after the deposit.
        balance: Amount,
    },

    /// Funds debited from a user's escrow balance.
    Withdraw {
        asset: Asset,
        user: AccountId,
        amount: Amount,
        /// Balance after the withdrawal.
        balance: Amount,
    },

    /// A resting order was created.
    Order {
        id: OrderId,
        user: AccountId,
        token_get: Asset,
        amount_get: Amount,
        token_give: Asset,
        amount_give: Amount,
        timestamp: i64,
    },

    /// An open order was cancelled by its owner.
    Cancel {
        id: OrderId,
        user: AccountId,
        token_get: Asset,
        amount_get: Amount,
        token_give: Asset,
        amount_give: Amount,
        timestamp: i64,
    },

    /// An open order was filled by a taker.
    Trade {
        id: OrderId,
        user: AccountId,
        token_get: Asset,
        amount_get: Amount,
        token_give: Asset,
        amount_give: Amount,
        taker: AccountId,
        timestamp: i64,
    },
}

impl ExchangeEvent {
    /// The kind of this event.
    pub fn kind(&self) -> EventKind {
        match self {
            ExchangeEvent::Deposit { .. } => EventKind::Deposit,
            ExchangeEvent::Withdraw { .. } => EventKind::Withdraw,
            ExchangeEvent::Order { .. } => EventKind::Order,
            ExchangeEvent::Cancel { .. } => EventKind::Cancel,
            ExchangeEvent::Trade { .. } => EventKind::Trade,
        }
    }

    /// The event kind as a string label for logging.
    pub fn kind_label(&self) -> &'static str {
        match self {
            ExchangeEvent::Deposit { .. } => "Deposit",
            ExchangeEvent::Withdraw { .. } => "Withdraw",
            ExchangeEvent::Order { .. } => "Order",
            ExchangeEvent::Cancel { .. } => "Cancel",
            ExchangeEvent::Trade { .. } => "Trade",
        }
    }

    /// The order id this event refers to, if any.
    pub fn order_id(&self) -> Option<OrderId> {
        match self {
            ExchangeEvent::Order { id, .. }
            | ExchangeEvent::Cancel { id, .. }
            | ExchangeEvent::Trade { id, .. } => Some(*id),
            _ => None,
        }
    }
}

/// An event together with its position in the log.
///
/// Sequence numbers start at 1 and increase by 1 per appended event, so
/// they double as the event-identity key for replay deduplication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequencedEvent {
    pub sequence: u64,
    pub event: ExchangeEvent,
}

impl Ord for SequencedEvent {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.sequence.cmp(&other.sequence)
    }
}

impl PartialOrd for SequencedEvent {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
