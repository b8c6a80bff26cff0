//! In-memory stores and JSON seed loaders

use parking_lot::RwLock;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::fmt::Display;
use std::fs;
use std::hash::Hash;
use std::path::Path;
use types::errors::StoreError;
use types::ids::{OrderId, Symbol, TradeId, UserId};
use types::numeric::Price;
use types::order::Order;
use types::stock::Stock;
use types::trade::Trade;
use types::user::User;

use super::{OrderStore, StockStore, TradeStore, UserStore};

/// Keyed rows behind a read-write lock
#[derive(Debug)]
struct Table<K, V> {
    kind: &'static str,
    rows: RwLock<HashMap<K, V>>,
}

impl<K, V> Table<K, V>
where
    K: Eq + Hash + Clone + Display,
    V: Clone,
{
    fn new(kind: &'static str) -> Self {
        Self {
            kind,
            rows: RwLock::new(HashMap::new()),
        }
    }

    fn create(&self, key: &K, value: &V) -> Result<(), StoreError> {
        let mut rows = self.rows.write();
        if rows.contains_key(key) {
            return Err(StoreError::already_exists(self.kind, key));
        }
        rows.insert(key.clone(), value.clone());
        Ok(())
    }

    fn get(&self, key: &K) -> Option<V> {
        self.rows.read().get(key).cloned()
    }

    fn update(&self, key: &K, value: &V) -> Result<(), StoreError> {
        match self.rows.write().get_mut(key) {
            Some(row) => {
                *row = value.clone();
                Ok(())
            }
            None => Err(StoreError::not_found(self.kind, key)),
        }
    }

    fn delete(&self, key: &K) -> Result<(), StoreError> {
        self.rows
            .write()
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| StoreError::not_found(self.kind, key))
    }

    fn values(&self) -> Vec<V> {
        self.rows.read().values().cloned().collect()
    }

    fn len(&self) -> usize {
        self.rows.read().len()
    }
}

#[derive(Debug)]
pub struct InMemoryOrderStore {
    orders: Table<OrderId, Order>,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self {
            orders: Table::new("order"),
        }
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryOrderStore {
    fn default() -> Self {
        Self::new()
    }
}

impl OrderStore for InMemoryOrderStore {
    fn create(&self, order: &Order) -> Result<(), StoreError> {
        self.orders.create(&order.order_id, order)
    }

    fn get(&self, order_id: &OrderId) -> Result<Option<Order>, StoreError> {
        Ok(self.orders.get(order_id))
    }

    fn update(&self, order: &Order) -> Result<(), StoreError> {
        self.orders.update(&order.order_id, order)
    }

    fn delete(&self, order_id: &OrderId) -> Result<(), StoreError> {
        self.orders.delete(order_id)
    }

    fn list(&self) -> Result<Vec<Order>, StoreError> {
        let mut orders = self.orders.values();
        orders.sort_by_key(|order| order.sequence);
        Ok(orders)
    }
}

#[derive(Debug)]
pub struct InMemoryTradeStore {
    trades: Table<TradeId, Trade>,
}

impl InMemoryTradeStore {
    pub fn new() -> Self {
        Self {
            trades: Table::new("trade"),
        }
    }
}

impl Default for InMemoryTradeStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TradeStore for InMemoryTradeStore {
    fn create(&self, trade: &Trade) -> Result<(), StoreError> {
        self.trades.create(&trade.trade_id, trade)
    }

    fn get(&self, trade_id: &TradeId) -> Result<Option<Trade>, StoreError> {
        Ok(self.trades.get(trade_id))
    }

    fn list(&self) -> Result<Vec<Trade>, StoreError> {
        let mut trades = self.trades.values();
        trades.sort_by_key(|trade| trade.sequence);
        Ok(trades)
    }
}

#[derive(Debug, Deserialize)]
struct UserSeed {
    users: Vec<User>,
}

#[derive(Debug)]
pub struct InMemoryUserStore {
    users: Table<UserId, User>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self {
            users: Table::new("user"),
        }
    }

    /// Later duplicates replace earlier ones
    pub fn with_users(users: impl IntoIterator<Item = User>) -> Self {
        let store = Self::new();
        {
            let mut rows = store.users.rows.write();
            for user in users {
                rows.insert(user.id.clone(), user);
            }
        }
        store
    }

    /// Load `{"users": [...]}`
    pub fn from_json_str(json: &str) -> Result<Self, StoreError> {
        let seed: UserSeed = serde_json::from_str(json)?;
        Ok(Self::with_users(seed.users))
    }

    pub fn from_json_path(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        Self::from_json_str(&fs::read_to_string(path)?)
    }
}

impl Default for InMemoryUserStore {
    fn default() -> Self {
        Self::new()
    }
}

impl UserStore for InMemoryUserStore {
    fn create(&self, user: &User) -> Result<(), StoreError> {
        self.users.create(&user.id, user)
    }

    fn get(&self, user_id: &UserId) -> Result<Option<User>, StoreError> {
        Ok(self.users.get(user_id))
    }

    fn update(&self, user: &User) -> Result<(), StoreError> {
        self.users.update(&user.id, user)
    }

    fn delete(&self, user_id: &UserId) -> Result<(), StoreError> {
        self.users.delete(user_id)
    }

    fn list(&self) -> Result<Vec<User>, StoreError> {
        let mut users = self.users.values();
        users.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(users)
    }
}

/// Stock entry in the seed file; the symbol is the map key
#[derive(Debug, Deserialize)]
struct StockEntry {
    #[serde(default)]
    company: String,
    #[serde(default)]
    sector: String,
    min_price: Decimal,
    #[serde(default)]
    market_cap: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct StockSeed {
    stocks: BTreeMap<String, StockEntry>,
}

#[derive(Debug)]
pub struct InMemoryStockStore {
    stocks: Table<Symbol, Stock>,
}

impl InMemoryStockStore {
    pub fn new() -> Self {
        Self {
            stocks: Table::new("stock"),
        }
    }

    pub fn with_stocks(stocks: impl IntoIterator<Item = Stock>) -> Self {
        let store = Self::new();
        {
            let mut rows = store.stocks.rows.write();
            for stock in stocks {
                rows.insert(stock.symbol.clone(), stock);
            }
        }
        store
    }

    /// Load `{"stocks": {"AAPL": {...}, ...}}`
    pub fn from_json_str(json: &str) -> Result<Self, StoreError> {
        let seed: StockSeed = serde_json::from_str(json)?;
        let stocks = seed.stocks.into_iter().map(|(symbol, entry)| Stock {
            symbol: Symbol::new(symbol),
            company: entry.company,
            sector: entry.sector,
            min_price: Price::new(entry.min_price),
            market_cap: entry.market_cap,
            description: entry.description,
        });
        Ok(Self::with_stocks(stocks))
    }

    pub fn from_json_path(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        Self::from_json_str(&fs::read_to_string(path)?)
    }
}

impl Default for InMemoryStockStore {
    fn default() -> Self {
        Self::new()
    }
}

impl StockStore for InMemoryStockStore {
    fn create(&self, stock: &Stock) -> Result<(), StoreError> {
        self.stocks.create(&stock.symbol, stock)
    }

    fn get(&self, symbol: &Symbol) -> Result<Option<Stock>, StoreError> {
        Ok(self.stocks.get(symbol))
    }

    fn update(&self, stock: &Stock) -> Result<(), StoreError> {
        self.stocks.update(&stock.symbol, stock)
    }

    fn delete(&self, symbol: &Symbol) -> Result<(), StoreError> {
        self.stocks.delete(symbol)
    }

    fn list(&self) -> Result<Vec<Stock>, StoreError> {
        let mut stocks = self.stocks.values();
        stocks.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        Ok(stocks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::ids::TradeId;
    use types::numeric::Quantity;
    use types::order::Side;

    const STOCKS: &str = r#"{
        "stocks": {
            "AAPL": {"company": "Apple Inc.", "sector": "Technology", "min_price": "10.00"},
            "msft": {"company": "Microsoft", "min_price": "5.50", "market_cap": "3T"}
        }
    }"#;

    const USERS: &str = r#"{
        "users": [
            {"id": "bruno", "name": "Bruno", "cash": "500.00"},
            {"id": "ana", "name": "Ana", "cash": "100000.00", "max_order_value": "50000",
             "initial_positions": {"AAPL": 100}}
        ]
    }"#;

    fn order(user: &str, seq: u64) -> Order {
        Order::new(
            UserId::new(user),
            Symbol::new("AAPL"),
            Side::BUY,
            Price::from_u64(150),
            Quantity::new(10),
            seq,
            0,
        )
    }

    #[test]
    fn test_stock_seed_uses_map_key_as_symbol() {
        let store = InMemoryStockStore::from_json_str(STOCKS).unwrap();
        let stocks = store.list().unwrap();

        assert_eq!(stocks.len(), 2);
        assert_eq!(stocks[0].symbol, Symbol::new("AAPL"));
        assert_eq!(stocks[0].company, "Apple Inc.");
        let msft = store.get(&Symbol::new("MSFT")).unwrap().unwrap();
        assert_eq!(msft.min_price, "5.5".parse::<Price>().unwrap());
        assert_eq!(msft.market_cap, "3T");
    }

    #[test]
    fn test_user_seed() {
        let store = InMemoryUserStore::from_json_str(USERS).unwrap();
        let users = store.list().unwrap();

        assert_eq!(users[0].id, UserId::new("ana"));
        assert_eq!(users[0].initial_positions.get(&Symbol::new("AAPL")), Some(&100));
        assert_eq!(users[0].max_order_value, Some(Decimal::from(50_000)));
        assert_eq!(users[1].cash, Decimal::new(50000, 2));
        assert!(store.get(&UserId::new("nobody")).unwrap().is_none());
    }

    #[test]
    fn test_bad_seed_is_parse_error() {
        let err = InMemoryUserStore::from_json_str("{\"users\": 3}").unwrap_err();
        assert!(matches!(err, StoreError::Parse(_)));
    }

    #[test]
    fn test_missing_seed_file_is_io_error() {
        let err = InMemoryStockStore::from_json_path("/nonexistent/stocks.json").unwrap_err();
        assert!(matches!(err, StoreError::Io(_)));
    }

    #[test]
    fn test_order_store_lifecycle() {
        let store = InMemoryOrderStore::new();
        let mut first = order("ana", 2);
        let second = order("bruno", 1);

        store.create(&first).unwrap();
        store.create(&second).unwrap();
        assert!(matches!(store.create(&first), Err(StoreError::AlreadyExists { .. })));

        first.add_fill(Quantity::new(4), 1);
        store.update(&first).unwrap();
        let stored = store.get(&first.order_id).unwrap().unwrap();
        assert_eq!(stored.remaining_quantity, Quantity::new(6));

        let sequences: Vec<u64> = store.list().unwrap().iter().map(|o| o.sequence).collect();
        assert_eq!(sequences, vec![1, 2]);
        assert_eq!(store.list_by_user(&UserId::new("ana")).unwrap().len(), 1);

        store.delete(&second.order_id).unwrap();
        assert_eq!(store.len(), 1);
        assert!(matches!(store.delete(&second.order_id), Err(StoreError::NotFound { .. })));
    }

    #[test]
    fn test_order_store_update_missing() {
        let store = InMemoryOrderStore::new();
        assert!(matches!(store.update(&order("ana", 1)), Err(StoreError::NotFound { .. })));
    }

    #[test]
    fn test_trade_store_get_unknown() {
        let store = InMemoryTradeStore::new();
        assert!(store.get(&TradeId::new()).unwrap().is_none());
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn test_user_store_crud() {
        let store = InMemoryUserStore::new();
        let user = User::new("ana", "Ana", Decimal::ONE);
        store.create(&user).unwrap();
        assert!(store.create(&user).is_err());

        store.update(&user.clone().with_max_order_value(Decimal::TEN)).unwrap();
        assert_eq!(store.get(&user.id).unwrap().unwrap().max_order_value, Some(Decimal::TEN));

        store.delete(&user.id).unwrap();
        assert!(store.get(&user.id).unwrap().is_none());
    }
}
