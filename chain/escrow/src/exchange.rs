//! Order state machine — the single writer over balances and orders
//!
//! Owns the ledger, the order table, and the event log. Every mutating
//! operation runs to completion against `&mut self` (the global-lock
//! equivalent) and either commits fully or fails with a specific error
//! and no state change.
//!
//! Order lifecycle: `Open -> Filled | Cancelled`, both terminal. Ids are
//! assigned at creation starting at 1 and never reused; creation does
//! not check balances — fills re-validate against the ledger.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use types::amount::Amount;
use types::asset::Asset;
use types::ids::{AccountId, OrderId};

use crate::errors::{ExchangeError, LedgerError};
use crate::events::{EventKind, ExchangeEvent, SequencedEvent};
use crate::ledger::{Ledger, Movement};
use crate::log::EventLog;
use crate::token::Token;

/// Lifecycle state of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    /// Resting, fillable or cancellable.
    Open,
    /// Settled by a taker (terminal).
    Filled,
    /// Withdrawn by its owner (terminal).
    Cancelled,
}

impl OrderStatus {
    /// Whether no further transitions are possible.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, OrderStatus::Open)
    }
}

/// A resting order.
///
/// The maker offers `amount_give` of `token_give` and wants `amount_get`
/// of `token_get` in return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub user: AccountId,
    pub token_get: Asset,
    pub amount_get: Amount,
    pub token_give: Asset,
    pub amount_give: Amount,
    pub timestamp: i64,
    pub status: OrderStatus,
}

/// The escrow exchange: custodial ledger plus order state machine.
#[derive(Debug)]
pub struct Exchange {
    /// Custody identity token deposits are transferred into.
    custody_account: AccountId,
    /// Receives the taker fee on every fill.
    fee_account: AccountId,
    /// Fee in whole percent, fixed at construction.
    fee_percent: u64,
    ledger: Ledger,
    orders: BTreeMap<OrderId, Order>,
    /// Highest assigned order id, 0 before the first order.
    order_count: u64,
    /// Highest event timestamp emitted, keeps timestamps non-decreasing
    /// in emission order even if the caller's clock regresses.
    last_timestamp: i64,
    log: EventLog,
}

impl Exchange {
    pub fn new(fee_account: AccountId, fee_percent: u64) -> Self {
        Self {
            custody_account: AccountId::new(),
            fee_account,
            fee_percent,
            ledger: Ledger::new(),
            orders: BTreeMap::new(),
            order_count: 0,
            last_timestamp: 0,
            log: EventLog::new(),
        }
    }

    pub fn fee_account(&self) -> AccountId {
        self.fee_account
    }

    pub fn fee_percent(&self) -> u64 {
        self.fee_percent
    }

    /// The identity users grant token allowances to before depositing.
    pub fn custody_account(&self) -> AccountId {
        self.custody_account
    }

    // ───────────────────────── Deposits & Withdrawals ─────────────────────────

    /// Credit native coin to a user's escrow balance.
    ///
    /// Returns the new balance.
    pub fn deposit_ether(
        &mut self,
        user: AccountId,
        amount: Amount,
    ) -> Result<Amount, ExchangeError> {
        let balance = self.ledger.credit(Asset::Ether, user, amount)?;
        self.log.append(ExchangeEvent::Deposit {
            asset: Asset::Ether,
            user,
            amount,
            balance,
        });
        Ok(balance)
    }

    /// Debit native coin from a user's escrow balance.
    pub fn withdraw_ether(
        &mut self,
        user: AccountId,
        amount: Amount,
    ) -> Result<Amount, ExchangeError> {
        let balance = self.ledger.debit(Asset::Ether, &user, amount)?;
        self.log.append(ExchangeEvent::Withdraw {
            asset: Asset::Ether,
            user,
            amount,
            balance,
        });
        Ok(balance)
    }

    /// Pull tokens from the user into custody and credit their balance.
    ///
    /// Requires a prior allowance grant to `custody_account()` on the
    /// token itself.
    pub fn deposit_token(
        &mut self,
        token: &mut Token,
        user: AccountId,
        amount: Amount,
    ) -> Result<Amount, ExchangeError> {
        token.transfer_from(&self.custody_account, &user, self.custody_account, amount)?;
        let balance = self.ledger.credit(Asset::Token, user, amount)?;
        self.log.append(ExchangeEvent::Deposit {
            asset: Asset::Token,
            user,
            amount,
            balance,
        });
        Ok(balance)
    }

    /// Debit the user's token balance and push the tokens back out of custody.
    pub fn withdraw_token(
        &mut self,
        token: &mut Token,
        user: AccountId,
        amount: Amount,
    ) -> Result<Amount, ExchangeError> {
        // Validate the escrow balance before touching the token, so a
        // failure leaves both sides untouched.
        let held = self.ledger.balance_of(Asset::Token, &user);
        if held < amount {
            return Err(LedgerError::InsufficientBalance {
                asset: Asset::Token.to_string(),
                required: amount.to_string(),
                available: held.to_string(),
            }
            .into());
        }
        token.transfer(&self.custody_account, user, amount)?;
        let balance = self.ledger.debit(Asset::Token, &user, amount)?;
        self.log.append(ExchangeEvent::Withdraw {
            asset: Asset::Token,
            user,
            amount,
            balance,
        });
        Ok(balance)
    }

    /// Escrow balance for an account and asset.
    pub fn balance_of(&self, asset: Asset, user: &AccountId) -> Amount {
        self.ledger.balance_of(asset, user)
    }

    /// Sum of all escrow balances for an asset, in minimal units.
    pub fn total_held(&self, asset: Asset) -> u128 {
        self.ledger.total_held(asset)
    }

    // ───────────────────────── Order Lifecycle ─────────────────────────

    /// Create a resting order and emit `Order`.
    ///
    /// No balance check happens here; a maker may post more than they can
    /// cover, and the fill re-validates against the ledger.
    pub fn make_order(
        &mut self,
        user: AccountId,
        token_get: Asset,
        amount_get: Amount,
        token_give: Asset,
        amount_give: Amount,
        now: i64,
    ) -> OrderId {
        self.order_count += 1;
        let id = OrderId::new(self.order_count);
        let timestamp = self.clamped_time(now);

        let order = Order {
            id,
            user,
            token_get,
            amount_get,
            token_give,
            amount_give,
            timestamp,
            status: OrderStatus::Open,
        };
        self.orders.insert(id, order);

        self.log.append(ExchangeEvent::Order {
            id,
            user,
            token_get,
            amount_get,
            token_give,
            amount_give,
            timestamp,
        });
        id
    }

    /// Cancel an open order. Owner only; no balance effect.
    pub fn cancel_order(
        &mut self,
        caller: AccountId,
        id: OrderId,
        now: i64,
    ) -> Result<(), ExchangeError> {
        let order = *self
            .orders
            .get(&id)
            .ok_or(ExchangeError::NotFound { order_id: id })?;

        if order.user != caller {
            return Err(ExchangeError::Unauthorized);
        }
        ensure_open(&order)?;

        if let Some(stored) = self.orders.get_mut(&id) {
            stored.status = OrderStatus::Cancelled;
        }
        let timestamp = self.clamped_time(now);
        self.log.append(ExchangeEvent::Cancel {
            id,
            user: order.user,
            token_get: order.token_get,
            amount_get: order.amount_get,
            token_give: order.token_give,
            amount_give: order.amount_give,
            timestamp,
        });
        Ok(())
    }

    /// Fill an open order as `taker`, settling all five legs atomically.
    ///
    /// The taker pays `amount_get + fee` of `token_get` (fee to the fee
    /// account, truncating integer percent) and receives `amount_give`
    /// of `token_give` from the maker. Any insufficient balance fails
    /// the whole operation and leaves every balance unchanged.
    pub fn fill_order(
        &mut self,
        taker: AccountId,
        id: OrderId,
        now: i64,
    ) -> Result<(), ExchangeError> {
        let order = *self
            .orders
            .get(&id)
            .ok_or(ExchangeError::NotFound { order_id: id })?;

        ensure_open(&order)?;
        if taker == order.user {
            return Err(ExchangeError::SelfFill);
        }

        let fee = order
            .amount_get
            .percent(self.fee_percent)
            .ok_or(LedgerError::Overflow)?;
        let taker_cost = order
            .amount_get
            .checked_add(fee)
            .ok_or(LedgerError::Overflow)?;

        let maker = order.user;
        self.ledger.settle(&[
            Movement::Debit {
                account: taker,
                asset: order.token_get,
                amount: taker_cost,
            },
            Movement::Credit {
                account: maker,
                asset: order.token_get,
                amount: order.amount_get,
            },
            Movement::Credit {
                account: self.fee_account,
                asset: order.token_get,
                amount: fee,
            },
            Movement::Debit {
                account: maker,
                asset: order.token_give,
                amount: order.amount_give,
            },
            Movement::Credit {
                account: taker,
                asset: order.token_give,
                amount: order.amount_give,
            },
        ])?;

        if let Some(stored) = self.orders.get_mut(&id) {
            stored.status = OrderStatus::Filled;
        }
        let timestamp = self.clamped_time(now);
        self.log.append(ExchangeEvent::Trade {
            id,
            user: maker,
            token_get: order.token_get,
            amount_get: order.amount_get,
            token_give: order.token_give,
            amount_give: order.amount_give,
            taker,
            timestamp,
        });
        Ok(())
    }

    /// Look up an order by id.
    pub fn order(&self, id: OrderId) -> Option<&Order> {
        self.orders.get(&id)
    }

    /// Highest assigned order id, 0 before the first order.
    pub fn order_count(&self) -> u64 {
        self.order_count
    }

    // ───────────────────────── Event Log ─────────────────────────

    /// All emitted events in emission order.
    pub fn events(&self) -> &[SequencedEvent] {
        self.log.events()
    }

    /// Bulk query: all events of one kind from genesis to latest.
    pub fn events_of_kind(&self, kind: EventKind) -> Vec<SequencedEvent> {
        self.log.events_of_kind(kind)
    }

    /// Subscribe to events appended after this call.
    pub fn subscribe(
        &mut self,
    ) -> tokio::sync::mpsc::UnboundedReceiver<SequencedEvent> {
        self.log.subscribe()
    }

    /// Clamp `now` so emitted timestamps never decrease.
    fn clamped_time(&mut self, now: i64) -> i64 {
        let timestamp = now.max(self.last_timestamp);
        self.last_timestamp = timestamp;
        timestamp
    }
}

fn ensure_open(order: &Order) -> Result<(), ExchangeError> {
    match order.status {
        OrderStatus::Open => Ok(()),
        OrderStatus::Filled => Err(ExchangeError::AlreadyFilled { order_id: order.id }),
        OrderStatus::Cancelled => Err(ExchangeError::AlreadyCancelled { order_id: order.id }),
    }
}
