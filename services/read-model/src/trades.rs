//! The public trade feed
//!
//! Fills are decorated in chronological order (so each carries a trend
//! relative to its predecessor) and presented newest first.

use crate::decorate::DecoratedTrade;

/// Reverse a chronological fill sequence into the presented feed.
pub fn feed(fills: &[DecoratedTrade]) -> Vec<DecoratedTrade> {
    let mut presented = fills.to_vec();
    presented.reverse();
    presented
}
