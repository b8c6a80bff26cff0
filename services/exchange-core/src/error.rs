use thiserror::Error;
use types::errors::{LedgerError, StoreError};
use types::ids::{OrderId, Symbol, UserId};

/// Errors returned by engine operations
///
/// Order rejections are not errors: they come back as a REJECTED order in
/// a `MatchResult`.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Order not found or no longer resting: {order_id}")]
    OrderNotFound { order_id: OrderId },

    #[error("User not found: {user_id}")]
    UserNotFound { user_id: UserId },

    #[error("Unknown symbol: {symbol}")]
    UnknownSymbol { symbol: Symbol },

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Configuration error: {0}")]
    Config(String),
}
