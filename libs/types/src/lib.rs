//! Types library for the escrow exchange
//!
//! Core type definitions shared by the custody layer and the read-model
//! service. Leaf crate: no dependency on the rest of the workspace.
//!
//! # Modules
//! - `ids`: Unique identifiers (AccountId, OrderId)
//! - `asset`: The two tradable assets (native coin and the one token)
//! - `amount`: 18-decimal fixed-point amounts in minimal units

pub mod amount;
pub mod asset;
pub mod ids;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::amount::*;
    pub use crate::asset::*;
    pub use crate::ids::*;
}
