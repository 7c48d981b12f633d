//! Fixed-point amounts in 18-decimal minimal units
//!
//! Every balance and order leg is an integer count of minimal units
//! (10^-18 of a display unit). `Amount` normalizes minimal units into
//! `rust_decimal` display units for comparison and presentation; the
//! ledger itself never leaves integer arithmetic.
//!
//! The representable range is capped at 2^96 - 1 minimal units, the
//! largest value that converts to a `Decimal` without loss. Arithmetic
//! is checked against that cap, so overflow surfaces as `None` instead
//! of wrapping.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Decimal places of a display unit.
pub const DECIMALS: u32 = 18;

/// Minimal units per display unit (10^18).
pub const UNIT: u128 = 1_000_000_000_000_000_000;

const MAX_RAW: u128 = (1u128 << 96) - 1;

/// Raw value outside the representable range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("amount exceeds representable range")]
pub struct AmountOutOfRange;

/// A non-negative quantity of an asset in minimal units.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(try_from = "u128", into = "u128")]
pub struct Amount(u128);

impl Amount {
    pub const ZERO: Amount = Amount(0);

    /// Largest representable amount: 2^96 - 1 minimal units.
    pub const MAX: Amount = Amount(MAX_RAW);

    /// Construct from minimal units, rejecting values beyond the cap.
    pub fn new(raw: u128) -> Option<Self> {
        if raw <= MAX_RAW {
            Some(Self(raw))
        } else {
            None
        }
    }

    /// Construct from a whole number of display units.
    pub fn from_whole(units: u64) -> Option<Self> {
        (units as u128).checked_mul(UNIT).and_then(Self::new)
    }

    /// Construct from display units (e.g. `1.1` tokens).
    ///
    /// Returns `None` for negative values, values with more than 18
    /// fractional digits, or values beyond the cap.
    pub fn from_units(units: Decimal) -> Option<Self> {
        if units.is_sign_negative() {
            return None;
        }
        let scaled = units.checked_mul(Decimal::from(UNIT as u64))?;
        if !scaled.fract().is_zero() {
            return None;
        }
        scaled.trunc().to_u128().and_then(Self::new)
    }

    /// Minimal units.
    pub fn raw(&self) -> u128 {
        self.0
    }

    /// Display units.
    pub fn to_units(&self) -> Decimal {
        // raw <= 2^96 - 1, always within Decimal's 96-bit mantissa
        Decimal::from_i128_with_scale(self.0 as i128, DECIMALS)
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checked addition against the representable cap.
    pub fn checked_add(self, rhs: Amount) -> Option<Amount> {
        self.0.checked_add(rhs.0).and_then(Self::new)
    }

    /// Checked subtraction; `None` if `rhs` exceeds `self`.
    pub fn checked_sub(self, rhs: Amount) -> Option<Amount> {
        self.0.checked_sub(rhs.0).map(Self)
    }

    /// `self * percent / 100` with truncating integer division.
    pub fn percent(self, percent: u64) -> Option<Amount> {
        self.0
            .checked_mul(percent as u128)
            .map(|v| v / 100)
            .and_then(Self::new)
    }
}

impl TryFrom<u128> for Amount {
    type Error = AmountOutOfRange;

    fn try_from(raw: u128) -> Result<Self, Self::Error> {
        Self::new(raw).ok_or(AmountOutOfRange)
    }
}

impl From<Amount> for u128 {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_units())
    }
}
