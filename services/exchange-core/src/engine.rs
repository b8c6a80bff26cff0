//! Matching engine core
//!
//! Main coordinator for validation, reservation, matching and settlement.
//! Each symbol's book sits behind its own mutex: one order per symbol is
//! matched at a time while different symbols proceed in parallel.
//! Portfolio locks are taken inside the book lock, never the other way
//! round.

use dashmap::DashMap;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};
use types::errors::{LedgerError, RejectReason};
use types::ids::{OrderId, Symbol, UserId};
use types::numeric::{Price, Quantity};
use types::order::{Order, OrderStatus, Side};
use types::portfolio::{PortfolioSnapshot, PriceOracle};
use types::trade::Trade;
use types::user::User;

use crate::book::{DepthSnapshot, OrderBook, OrderBookSnapshot};
use crate::catalog::StockCatalog;
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::ledger::PortfolioLedger;
use crate::matching::{crossing, MatchExecutor};
use crate::store::{
    InMemoryOrderStore, InMemoryStockStore, InMemoryTradeStore, InMemoryUserStore, OrderStore,
    StockStore, TradeStore, UserStore,
};
use crate::validator::{BusinessValidator, MarketClock, MarketSession, SystemClock};

/// Storage collaborators the engine reads from and records to
#[derive(Clone)]
pub struct Stores {
    pub orders: Arc<dyn OrderStore>,
    pub trades: Arc<dyn TradeStore>,
    pub users: Arc<dyn UserStore>,
    pub stocks: Arc<dyn StockStore>,
}

impl Stores {
    /// Empty in-memory stores
    pub fn in_memory() -> Self {
        Self {
            orders: Arc::new(InMemoryOrderStore::new()),
            trades: Arc::new(InMemoryTradeStore::new()),
            users: Arc::new(InMemoryUserStore::new()),
            stocks: Arc::new(InMemoryStockStore::new()),
        }
    }

    pub fn with_users(mut self, users: Arc<dyn UserStore>) -> Self {
        self.users = users;
        self
    }

    pub fn with_stocks(mut self, stocks: Arc<dyn StockStore>) -> Self {
        self.stocks = stocks;
        self
    }
}

/// Outcome of processing one order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchResult {
    /// The order's state when processing finished
    pub order: Order,
    /// Fills in execution order; empty if nothing crossed or rejected
    pub trades: Vec<Trade>,
    pub status: OrderStatus,
}

impl MatchResult {
    pub fn is_rejected(&self) -> bool {
        matches!(self.status, OrderStatus::Rejected(_))
    }

    pub fn reject_reason(&self) -> Option<RejectReason> {
        match self.status {
            OrderStatus::Rejected(reason) => Some(reason),
            _ => None,
        }
    }

    pub fn filled_quantity(&self) -> Quantity {
        self.trades
            .iter()
            .fold(Quantity::zero(), |acc, trade| acc + trade.quantity)
    }
}

/// Main matching engine
pub struct MatchingEngine {
    /// One book per listed symbol, fixed at construction
    books: HashMap<Symbol, Mutex<OrderBook>>,
    catalog: Arc<StockCatalog>,
    validator: BusinessValidator,
    ledger: PortfolioLedger,
    /// Trade execution with global trade sequence
    executor: MatchExecutor,
    stores: Stores,
    clock: Arc<dyn MarketClock>,
    order_sequence: AtomicU64,
    last_prices: DashMap<Symbol, Price>,
}

impl MatchingEngine {
    pub fn new(
        config: &EngineConfig,
        stores: Stores,
        clock: Arc<dyn MarketClock>,
    ) -> Result<Self, EngineError> {
        config.validate()?;

        let catalog = Arc::new(StockCatalog::from_store(stores.stocks.as_ref())?);
        if catalog.is_empty() {
            warn!("Stock catalog is empty; every order will be rejected");
        }

        let books = catalog
            .symbols()
            .into_iter()
            .map(|symbol| (symbol.clone(), Mutex::new(OrderBook::new(symbol))))
            .collect();

        let validator = BusinessValidator::new(
            Arc::clone(&catalog),
            MarketSession::from_config(&config.market)?,
            Arc::clone(&clock),
            config.default_max_order_value,
        );

        info!(symbols = catalog.len(), "Matching engine started");

        Ok(Self {
            books,
            catalog,
            validator,
            ledger: PortfolioLedger::new(Arc::clone(&stores.users)),
            executor: MatchExecutor::new(1),
            stores,
            clock,
            order_sequence: AtomicU64::new(1),
            last_prices: DashMap::new(),
        })
    }

    /// Build an engine over in-memory stores seeded from the configured
    /// JSON files, on the system clock
    pub fn from_config(config: &EngineConfig) -> Result<Self, EngineError> {
        let stocks = match &config.stocks_path {
            Some(path) => InMemoryStockStore::from_json_path(path)?,
            None => InMemoryStockStore::new(),
        };
        let users = match &config.users_path {
            Some(path) => InMemoryUserStore::from_json_path(path)?,
            None => InMemoryUserStore::new(),
        };

        let stores = Stores::in_memory()
            .with_stocks(Arc::new(stocks))
            .with_users(Arc::new(users));
        Self::new(config, stores, Arc::new(SystemClock))
    }

    /// Submit a limit order
    ///
    /// This is the main entry point. Rejections come back as a REJECTED
    /// order in the result, never as an error.
    pub fn submit_order(
        &self,
        user_id: UserId,
        symbol: &str,
        side: Side,
        quantity: u64,
        price: Decimal,
    ) -> MatchResult {
        let order = Order::new(
            user_id,
            Symbol::new(symbol),
            side,
            Price::new(price),
            Quantity::new(quantity),
            0,
            self.clock.now_nanos(),
        );
        self.process_order(order)
    }

    /// Validate, reserve, match and rest one order
    ///
    /// The order's arrival sequence is stamped here, under the book lock,
    /// so it agrees with time priority in the book.
    pub fn process_order(&self, mut order: Order) -> MatchResult {
        let Some(book) = self.books.get(&order.symbol) else {
            order.sequence = self.next_order_sequence();
            let now = self.clock.now_nanos();
            return self.reject(order, RejectReason::InvalidSymbol, now);
        };

        let mut book = book.lock();
        order.sequence = self.next_order_sequence();
        let now = self.clock.now_nanos();

        let user = self.lookup_user(&order.user_id);
        if let Err(reason) = self.validator.validate(&order, user.as_ref()) {
            return self.reject(order, reason, now);
        }

        if let Err(err) = self.ledger.reserve(&order, now) {
            return self.reject(order, RejectReason::from(&err), now);
        }

        self.record_order(&order);
        debug!(
            order_id = %order.order_id,
            user_id = %order.user_id,
            symbol = %order.symbol,
            side = ?order.side,
            price = %order.price,
            quantity = %order.quantity,
            "Order accepted"
        );

        let trades = self.match_order(&mut book, &mut order, now);

        if !order.remaining_quantity.is_zero() {
            book.insert(order.clone());
        }
        if !trades.is_empty() {
            self.record_order_update(&order);
        }

        assert!(!book.is_crossed(), "Order book for {} left crossed", order.symbol);
        drop(book);

        info!(
            order_id = %order.order_id,
            symbol = %order.symbol,
            status = order.status.as_str(),
            trades = trades.len(),
            remaining = %order.remaining_quantity,
            "Order processed"
        );

        MatchResult {
            status: order.status,
            order,
            trades,
        }
    }

    /// Fill `order` against the opposite side while prices cross
    fn match_order(&self, book: &mut OrderBook, order: &mut Order, now: i64) -> Vec<Trade> {
        let mut trades = Vec::new();

        while !order.remaining_quantity.is_zero() {
            let Some(resting) = book.peek_best_opposite(order.side) else {
                break;
            };
            if !crossing::incoming_can_match(order.side, order.price, resting.price) {
                break;
            }

            let quantity = order.remaining_quantity.min(resting.remaining_quantity);
            let settlement = self.executor.settlement(resting, order, quantity);

            // Both legs were reserved on acceptance
            if let Err(err) = self.ledger.settle_fill(&settlement, now) {
                unreachable!("Settlement of a reserved fill failed: {}", err);
            }

            let Some(maker) = book.fill_best_opposite(order.side, quantity, now) else {
                unreachable!("Best opposite order vanished under the book lock");
            };
            order.add_fill(quantity, now);

            let trade = self.executor.execute_trade(&maker, order, quantity, now);
            self.last_prices.insert(trade.symbol.clone(), trade.price);

            if maker.is_filled() {
                self.release(&maker, now);
            }

            debug!(
                trade_id = %trade.trade_id,
                symbol = %trade.symbol,
                price = %trade.price,
                quantity = %trade.quantity,
                buyer = %trade.buyer_id,
                seller = %trade.seller_id,
                "Trade executed"
            );

            self.record_order_update(&maker);
            self.record_trade(&trade);
            trades.push(trade);
        }

        trades
    }

    /// Cancel a resting order and release its reservation
    ///
    /// Orders that are filled, cancelled, rejected or unknown give
    /// `OrderNotFound`, so a repeated cancel never releases twice.
    pub fn cancel_order(&self, order_id: &OrderId) -> Result<Order, EngineError> {
        let not_found = || EngineError::OrderNotFound { order_id: *order_id };

        let symbol = self.locate(order_id).ok_or_else(not_found)?;
        let book = self.books.get(&symbol).ok_or_else(not_found)?;

        let mut book = book.lock();
        let mut order = book.remove(order_id).ok_or_else(not_found)?;
        let now = self.clock.now_nanos();

        self.ledger.release_order(&order, now)?;
        order.cancel(now);
        drop(book);

        self.record_order_update(&order);
        info!(
            order_id = %order.order_id,
            symbol = %order.symbol,
            remaining = %order.remaining_quantity,
            "Order cancelled"
        );
        Ok(order)
    }

    /// Every resting order of `symbol`, best first on each side
    pub fn get_order_book_snapshot(&self, symbol: &str) -> Result<OrderBookSnapshot, EngineError> {
        Ok(self.book(symbol)?.lock().snapshot())
    }

    /// Aggregated quantity at the top `levels` prices of each side
    pub fn get_order_book_depth(
        &self,
        symbol: &str,
        levels: usize,
    ) -> Result<DepthSnapshot, EngineError> {
        Ok(self.book(symbol)?.lock().depth(levels))
    }

    pub fn get_portfolio(&self, user_id: &UserId) -> Result<PortfolioSnapshot, EngineError> {
        self.ledger.snapshot(user_id).map_err(ledger_lookup_error)
    }

    /// Cash plus positions marked at the last traded prices
    pub fn get_total_value(&self, user_id: &UserId) -> Result<Decimal, EngineError> {
        self.ledger
            .total_value(user_id, self)
            .map_err(ledger_lookup_error)
    }

    /// Profile of a user: limits, status and seed balances
    pub fn get_user(&self, user_id: &UserId) -> Result<User, EngineError> {
        self.stores
            .users
            .get(user_id)?
            .ok_or_else(|| EngineError::UserNotFound {
                user_id: user_id.clone(),
            })
    }

    pub fn get_order(&self, order_id: &OrderId) -> Result<Order, EngineError> {
        self.stores
            .orders
            .get(order_id)?
            .ok_or(EngineError::OrderNotFound { order_id: *order_id })
    }

    pub fn list_orders(&self, user_id: &UserId) -> Result<Vec<Order>, EngineError> {
        Ok(self.stores.orders.list_by_user(user_id)?)
    }

    /// Trades in execution order, optionally for one symbol
    pub fn list_trades(&self, symbol: Option<&str>) -> Result<Vec<Trade>, EngineError> {
        let trades = match symbol {
            Some(symbol) => self.stores.trades.list_by_symbol(&Symbol::new(symbol))?,
            None => self.stores.trades.list()?,
        };
        Ok(trades)
    }

    /// Last traded price per symbol
    pub fn last_prices(&self) -> HashMap<Symbol, Price> {
        self.last_prices
            .iter()
            .map(|entry| (entry.key().clone(), *entry.value()))
            .collect()
    }

    /// Whether the session is open at the clock's current time
    pub fn market_open(&self) -> bool {
        self.validator.is_market_open()
    }

    pub fn catalog(&self) -> &StockCatalog {
        &self.catalog
    }

    pub fn ledger(&self) -> &PortfolioLedger {
        &self.ledger
    }

    fn book(&self, symbol: &str) -> Result<&Mutex<OrderBook>, EngineError> {
        let symbol = Symbol::new(symbol);
        match self.books.get(&symbol) {
            Some(book) => Ok(book),
            None => Err(EngineError::UnknownSymbol { symbol }),
        }
    }

    fn next_order_sequence(&self) -> u64 {
        self.order_sequence.fetch_add(1, Ordering::Relaxed)
    }

    /// Symbol of an order, from the store or else by scanning the books
    fn locate(&self, order_id: &OrderId) -> Option<Symbol> {
        match self.stores.orders.get(order_id) {
            Ok(Some(order)) => return Some(order.symbol),
            Ok(None) => {}
            Err(err) => warn!(order_id = %order_id, error = %err, "Order lookup failed"),
        }
        self.books
            .iter()
            .find(|(_, book)| book.lock().contains(order_id))
            .map(|(symbol, _)| symbol.clone())
    }

    fn lookup_user(&self, user_id: &UserId) -> Option<User> {
        match self.stores.users.get(user_id) {
            Ok(user) => user,
            Err(err) => {
                warn!(user_id = %user_id, error = %err, "User lookup failed");
                None
            }
        }
    }

    fn reject(&self, mut order: Order, reason: RejectReason, now: i64) -> MatchResult {
        order.reject(reason, now);
        self.record_order(&order);
        warn!(
            order_id = %order.order_id,
            user_id = %order.user_id,
            symbol = %order.symbol,
            reason = %reason,
            "Order rejected"
        );
        MatchResult {
            status: order.status,
            order,
            trades: Vec::new(),
        }
    }

    /// Release whatever reservation is left on an order that left the book
    fn release(&self, order: &Order, now: i64) {
        if let Err(err) = self.ledger.release_order(order, now) {
            warn!(order_id = %order.order_id, error = %err, "Reservation release failed");
        }
    }

    fn record_order(&self, order: &Order) {
        if let Err(err) = self.stores.orders.create(order) {
            warn!(order_id = %order.order_id, error = %err, "Failed to record order");
        }
    }

    fn record_order_update(&self, order: &Order) {
        if let Err(err) = self.stores.orders.update(order) {
            warn!(order_id = %order.order_id, error = %err, "Failed to record order update");
        }
    }

    fn record_trade(&self, trade: &Trade) {
        if let Err(err) = self.stores.trades.create(trade) {
            warn!(trade_id = %trade.trade_id, error = %err, "Failed to record trade");
        }
    }
}

impl PriceOracle for MatchingEngine {
    fn price_of(&self, symbol: &Symbol) -> Option<Price> {
        self.last_prices.get(symbol).map(|price| *price.value())
    }
}

fn ledger_lookup_error(err: LedgerError) -> EngineError {
    match err {
        LedgerError::UserNotFound { user_id } => EngineError::UserNotFound {
            user_id: UserId::new(user_id),
        },
        other => EngineError::Ledger(other),
    }
}
