//! Error types for the exchange core
//!
//! Rejection reasons, ledger failures and storage failures, using thiserror.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why an order was refused before it could touch the book
///
/// Validation reasons come from the business validator, resource reasons
/// from the ledger's reservation step.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RejectReason {
    #[error("invalid symbol")]
    InvalidSymbol,

    #[error("invalid quantity")]
    InvalidQuantity,

    #[error("invalid price")]
    InvalidPrice,

    #[error("price below the minimum allowed for the symbol")]
    PriceTooLow,

    #[error("market closed")]
    MarketClosed,

    #[error("order value exceeds the user's profile limit")]
    ExceedsLimit,

    #[error("insufficient balance")]
    InsufficientBalance,

    #[error("insufficient position")]
    InsufficientPosition,

    #[error("user not found")]
    UserNotFound,

    #[error("user is not active")]
    UserInactive,
}

impl RejectReason {
    /// True for reasons raised by the business validator
    pub fn is_validation(&self) -> bool {
        !matches!(
            self,
            RejectReason::InsufficientBalance | RejectReason::InsufficientPosition
        )
    }
}

/// Portfolio ledger errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LedgerError {
    #[error("Insufficient balance: required {required}, available {available}")]
    InsufficientBalance { required: Decimal, available: Decimal },

    #[error("Insufficient position in {symbol}: required {required}, available {available}")]
    InsufficientPosition {
        symbol: String,
        required: u64,
        available: u64,
    },

    #[error("Position in {symbol} cannot hold {incoming} more shares on top of {held}")]
    PositionOverflow {
        symbol: String,
        held: u64,
        incoming: u64,
    },

    #[error("User not found: {user_id}")]
    UserNotFound { user_id: String },
}

impl From<&LedgerError> for RejectReason {
    fn from(err: &LedgerError) -> Self {
        match err {
            LedgerError::InsufficientBalance { .. } => RejectReason::InsufficientBalance,
            LedgerError::InsufficientPosition { .. } => RejectReason::InsufficientPosition,
            LedgerError::PositionOverflow { .. } => RejectReason::InvalidQuantity,
            LedgerError::UserNotFound { .. } => RejectReason::UserNotFound,
        }
    }
}

/// Storage collaborator errors
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("{kind} not found: {key}")]
    NotFound { kind: &'static str, key: String },

    #[error("{kind} already exists: {key}")]
    AlreadyExists { kind: &'static str, key: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

impl StoreError {
    pub fn not_found(kind: &'static str, key: impl ToString) -> Self {
        StoreError::NotFound {
            kind,
            key: key.to_string(),
        }
    }

    pub fn already_exists(kind: &'static str, key: impl ToString) -> Self {
        StoreError::AlreadyExists {
            kind,
            key: key.to_string(),
        }
    }
}
