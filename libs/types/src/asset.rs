//! The two tradable assets
//!
//! Exactly one fungible token trades against the native coin; there is no
//! dynamic asset registry. A closed enum rather than an address-like
//! identifier, so every consumer can match exhaustively.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An asset held in the custodial ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Asset {
    /// The native coin.
    Ether,
    /// The single fungible token traded against the native coin.
    Token,
}

impl Asset {
    /// Whether this is the native coin.
    pub fn is_ether(&self) -> bool {
        matches!(self, Asset::Ether)
    }

    /// The other asset of the pair.
    pub fn counterpart(&self) -> Self {
        match self {
            Asset::Ether => Asset::Token,
            Asset::Token => Asset::Ether,
        }
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Asset::Ether => write!(f, "ETH"),
            Asset::Token => write!(f, "TOKEN"),
        }
    }
}
