//! Types library for the stock exchange core
//!
//! Core type definitions shared by the matching engine, the ledger and the
//! storage collaborators.
//!
//! # Modules
//! - `ids`: Identifiers (OrderId, TradeId, UserId, Symbol)
//! - `numeric`: Price and Quantity
//! - `order`: Order lifecycle types
//! - `trade`: Trade execution types
//! - `portfolio`: Portfolio snapshots and price oracles
//! - `stock`: Listed stock reference data
//! - `user`: Users and profile limits
//! - `errors`: Error taxonomy

pub mod ids;
pub mod numeric;
pub mod order;
pub mod trade;
pub mod portfolio;
pub mod stock;
pub mod user;
pub mod errors;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::ids::*;
    pub use crate::numeric::*;
    pub use crate::order::*;
    pub use crate::trade::*;
    pub use crate::portfolio::*;
    pub use crate::stock::*;
    pub use crate::user::*;
    pub use crate::errors::*;
}
