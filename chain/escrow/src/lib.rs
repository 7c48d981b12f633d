//! Custody & Settlement for the Escrow Exchange
//!
//! This crate is the authoritative side of the system: it owns user
//! balances and the order lifecycle, enforces every financial invariant,
//! and records each state transition in an append-only event log. The
//! read-model service derives all of its views from that log and from
//! nothing else.
//!
//! # Modules
//! - `errors`: Error taxonomy for ledger, exchange, and token operations
//! - `events`: The closed event taxonomy (Deposit, Withdraw, Order, Cancel, Trade)
//! - `log`: Append-only event log with per-subscriber delivery channels
//! - `ledger`: Per-(account, asset) balances with atomic settlement
//! - `token`: The fungible token collaborator (allowance-based transfers)
//! - `exchange`: The order state machine tying it all together

pub mod errors;
pub mod events;
pub mod exchange;
pub mod ledger;
pub mod log;
pub mod token;

pub use exchange::{Exchange, Order, OrderStatus};
pub use events::{EventKind, ExchangeEvent, SequencedEvent};
pub use log::EventLog;
