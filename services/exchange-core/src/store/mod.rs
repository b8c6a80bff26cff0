//! Storage collaborators
//!
//! The engine persists orders and trades and reads users and stocks
//! through these traits. Implementations must be safe to call from many
//! threads at once; the in-memory versions in [`memory`] back the tests
//! and the JSON seed loaders.

pub mod memory;

pub use memory::{InMemoryOrderStore, InMemoryStockStore, InMemoryTradeStore, InMemoryUserStore};

use types::errors::StoreError;
use types::ids::{OrderId, Symbol, TradeId, UserId};
use types::order::Order;
use types::stock::Stock;
use types::trade::Trade;
use types::user::User;

/// Order records, keyed by order id
pub trait OrderStore: Send + Sync {
    fn create(&self, order: &Order) -> Result<(), StoreError>;
    fn get(&self, order_id: &OrderId) -> Result<Option<Order>, StoreError>;
    fn update(&self, order: &Order) -> Result<(), StoreError>;
    fn delete(&self, order_id: &OrderId) -> Result<(), StoreError>;
    /// All orders in arrival order
    fn list(&self) -> Result<Vec<Order>, StoreError>;

    fn list_by_user(&self, user_id: &UserId) -> Result<Vec<Order>, StoreError> {
        Ok(self
            .list()?
            .into_iter()
            .filter(|order| &order.user_id == user_id)
            .collect())
    }
}

/// Append-only trade log
pub trait TradeStore: Send + Sync {
    fn create(&self, trade: &Trade) -> Result<(), StoreError>;
    fn get(&self, trade_id: &TradeId) -> Result<Option<Trade>, StoreError>;
    /// All trades in execution order
    fn list(&self) -> Result<Vec<Trade>, StoreError>;

    fn list_by_symbol(&self, symbol: &Symbol) -> Result<Vec<Trade>, StoreError> {
        Ok(self
            .list()?
            .into_iter()
            .filter(|trade| &trade.symbol == symbol)
            .collect())
    }
}

pub trait UserStore: Send + Sync {
    fn create(&self, user: &User) -> Result<(), StoreError>;
    fn get(&self, user_id: &UserId) -> Result<Option<User>, StoreError>;
    fn update(&self, user: &User) -> Result<(), StoreError>;
    fn delete(&self, user_id: &UserId) -> Result<(), StoreError>;
    fn list(&self) -> Result<Vec<User>, StoreError>;
}

pub trait StockStore: Send + Sync {
    fn create(&self, stock: &Stock) -> Result<(), StoreError>;
    fn get(&self, symbol: &Symbol) -> Result<Option<Stock>, StoreError>;
    fn update(&self, stock: &Stock) -> Result<(), StoreError>;
    fn delete(&self, symbol: &Symbol) -> Result<(), StoreError>;
    fn list(&self) -> Result<Vec<Stock>, StoreError>;
}
