//! Error taxonomy for the custody layer
//!
//! Every failed operation reports its specific kind; callers never see a
//! generic failure. No operation leaves partial state behind on error.

use thiserror::Error;
use types::ids::OrderId;

/// Ledger-level errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("insufficient balance for {asset}: required {required}, available {available}")]
    InsufficientBalance {
        asset: String,
        required: String,
        available: String,
    },

    #[error("arithmetic overflow in balance calculation")]
    Overflow,
}

/// Order state machine errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExchangeError {
    #[error("order not found: {order_id}")]
    NotFound { order_id: OrderId },

    #[error("unauthorized: caller is not the order owner")]
    Unauthorized,

    #[error("taker cannot fill their own order")]
    SelfFill,

    #[error("order already filled: {order_id}")]
    AlreadyFilled { order_id: OrderId },

    #[error("order already cancelled: {order_id}")]
    AlreadyCancelled { order_id: OrderId },

    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("token error: {0}")]
    Token(#[from] TokenError),
}

/// Fungible token errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("insufficient token balance: required {required}, available {available}")]
    InsufficientBalance { required: String, available: String },

    #[error("insufficient allowance: required {required}, approved {approved}")]
    InsufficientAllowance { required: String, approved: String },

    #[error("arithmetic overflow in token balance")]
    Overflow,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ledger_error_display() {
        let err = LedgerError::InsufficientBalance {
            asset: "ETH".to_string(),
            required: "1.5".to_string(),
            available: "1".to_string(),
        };
        assert!(err.to_string().contains("ETH"));
        assert!(err.to_string().contains("1.5"));
    }

    #[test]
    fn test_exchange_error_from_ledger() {
        let ledger_err = LedgerError::Overflow;
        let exchange_err: ExchangeError = ledger_err.into();
        assert!(matches!(exchange_err, ExchangeError::Ledger(_)));
    }

    #[test]
    fn test_not_found_display() {
        let err = ExchangeError::NotFound {
            order_id: OrderId::new(99999),
        };
        assert_eq!(err.to_string(), "order not found: 99999");
    }
}
