//! Order book infrastructure module
//!
//! Contains price levels, bid book, ask book, and the per-symbol
//! [`OrderBook`] that pairs them. A book does no locking of its own: the
//! matching engine serializes all access to one symbol's book.

pub mod price_level;
pub mod bid_book;
pub mod ask_book;

pub use price_level::PriceLevel;
pub use bid_book::BidBook;
pub use ask_book::AskBook;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use types::ids::{OrderId, Symbol, UserId};
use types::numeric::{Price, Quantity};
use types::order::{Order, Side};

/// Bid and ask queues for a single symbol
#[derive(Debug, Clone)]
pub struct OrderBook {
    symbol: Symbol,
    bids: BidBook,
    asks: AskBook,
    /// Where each resting order lives, for cancellation by id
    index: HashMap<OrderId, (Side, Price)>,
}

impl OrderBook {
    pub fn new(symbol: Symbol) -> Self {
        Self {
            symbol,
            bids: BidBook::new(),
            asks: AskBook::new(),
            index: HashMap::new(),
        }
    }

    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    /// Append a resting order at the tail of its price level
    ///
    /// # Panics
    /// Panics if the order belongs to another symbol, is not in a resting
    /// status, or is already in the book.
    pub fn insert(&mut self, order: Order) {
        assert_eq!(order.symbol, self.symbol, "Order inserted into wrong book");
        assert!(order.status.is_resting(), "Only live orders may rest");
        assert!(
            !order.remaining_quantity.is_zero(),
            "Cannot rest an order with nothing remaining"
        );

        let previous = self.index.insert(order.order_id, (order.side, order.price));
        assert!(previous.is_none(), "Order already resting");

        match order.side {
            Side::BUY => self.bids.insert(order),
            Side::SELL => self.asks.insert(order),
        }
    }

    /// Remove a resting order by id
    pub fn remove(&mut self, order_id: &OrderId) -> Option<Order> {
        let (side, price) = self.index.remove(order_id)?;
        let removed = match side {
            Side::BUY => self.bids.remove(order_id, price),
            Side::SELL => self.asks.remove(order_id, price),
        };
        debug_assert!(removed.is_some(), "Book index out of sync");
        removed
    }

    pub fn contains(&self, order_id: &OrderId) -> bool {
        self.index.contains_key(order_id)
    }

    /// Best resting order an incoming order of `side` would trade against
    ///
    /// Lowest ask for a BUY, highest bid for a SELL.
    pub fn peek_best_opposite(&self, side: Side) -> Option<&Order> {
        match side {
            Side::BUY => self.asks.best_order(),
            Side::SELL => self.bids.best_order(),
        }
    }

    /// Fill the best opposite order by `quantity`
    ///
    /// Returns the resting order after the fill; once its remaining
    /// quantity reaches zero it is no longer in the book.
    pub fn fill_best_opposite(
        &mut self,
        side: Side,
        quantity: Quantity,
        timestamp: i64,
    ) -> Option<Order> {
        let order = match side {
            Side::BUY => self.asks.fill_best(quantity, timestamp),
            Side::SELL => self.bids.fill_best(quantity, timestamp),
        }?;
        if order.remaining_quantity.is_zero() {
            self.index.remove(&order.order_id);
        }
        Some(order)
    }

    /// True when no orders rest on `side`
    pub fn is_empty(&self, side: Side) -> bool {
        match side {
            Side::BUY => self.bids.is_empty(),
            Side::SELL => self.asks.is_empty(),
        }
    }

    pub fn best_bid(&self) -> Option<Price> {
        self.bids.best_bid_price()
    }

    pub fn best_ask(&self) -> Option<Price> {
        self.asks.best_ask_price()
    }

    /// Both sides non-empty and best bid >= best ask
    ///
    /// Must never hold once the engine releases the book.
    pub fn is_crossed(&self) -> bool {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => bid >= ask,
            _ => false,
        }
    }

    pub fn order_count(&self) -> usize {
        self.index.len()
    }

    /// Point-in-time copy of every resting order, best first on each side
    pub fn snapshot(&self) -> OrderBookSnapshot {
        OrderBookSnapshot {
            symbol: self.symbol.clone(),
            bids: self.bids.orders().map(BookEntry::from).collect(),
            asks: self.asks.orders().map(BookEntry::from).collect(),
        }
    }

    /// Aggregated quantity for the top `levels` prices on each side
    pub fn depth(&self, levels: usize) -> DepthSnapshot {
        DepthSnapshot {
            symbol: self.symbol.clone(),
            bids: self.bids.depth_snapshot(levels),
            asks: self.asks.depth_snapshot(levels),
        }
    }
}

/// One resting order as shown in a book snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookEntry {
    pub order_id: OrderId,
    pub user_id: UserId,
    pub price: Price,
    pub remaining_quantity: Quantity,
    pub sequence: u64,
    pub created_at: i64,
}

impl From<&Order> for BookEntry {
    fn from(order: &Order) -> Self {
        Self {
            order_id: order.order_id,
            user_id: order.user_id.clone(),
            price: order.price,
            remaining_quantity: order.remaining_quantity,
            sequence: order.sequence,
            created_at: order.created_at,
        }
    }
}

/// Order book snapshot for display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderBookSnapshot {
    pub symbol: Symbol,
    /// Descending price, FIFO within a price
    pub bids: Vec<BookEntry>,
    /// Ascending price, FIFO within a price
    pub asks: Vec<BookEntry>,
}

/// Aggregated price levels for market data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepthSnapshot {
    pub symbol: Symbol,
    pub bids: Vec<(Price, Quantity)>,
    pub asks: Vec<(Price, Quantity)>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::order::OrderStatus;

    fn order(user: &str, side: Side, price: u64, qty: u64, seq: u64) -> Order {
        Order::new(
            UserId::new(user),
            Symbol::new("AAPL"),
            side,
            Price::from_u64(price),
            Quantity::new(qty),
            seq,
            seq as i64,
        )
    }

    #[test]
    fn test_peek_best_opposite() {
        let mut book = OrderBook::new(Symbol::new("AAPL"));
        book.insert(order("ana", Side::BUY, 148, 10, 1));
        book.insert(order("bruno", Side::SELL, 152, 10, 2));
        book.insert(order("caio", Side::SELL, 151, 10, 3));

        assert_eq!(book.peek_best_opposite(Side::BUY).unwrap().price, Price::from_u64(151));
        assert_eq!(book.peek_best_opposite(Side::SELL).unwrap().price, Price::from_u64(148));
        assert!(!book.is_crossed());
    }

    #[test]
    fn test_remove_by_id() {
        let mut book = OrderBook::new(Symbol::new("AAPL"));
        let resting = order("ana", Side::SELL, 150, 10, 1);
        let id = resting.order_id;
        book.insert(resting);

        assert!(book.contains(&id));
        assert_eq!(book.remove(&id).unwrap().order_id, id);
        assert!(book.is_empty(Side::SELL));
        assert!(book.remove(&id).is_none());
    }

    #[test]
    fn test_fill_best_opposite_updates_index() {
        let mut book = OrderBook::new(Symbol::new("AAPL"));
        let resting = order("ana", Side::SELL, 150, 10, 1);
        let id = resting.order_id;
        book.insert(resting);

        let partial = book.fill_best_opposite(Side::BUY, Quantity::new(4), 2).unwrap();
        assert_eq!(partial.status, OrderStatus::Partial);
        assert!(book.contains(&id));

        let done = book.fill_best_opposite(Side::BUY, Quantity::new(6), 3).unwrap();
        assert_eq!(done.status, OrderStatus::Filled);
        assert!(!book.contains(&id));
        assert_eq!(book.order_count(), 0);
    }

    #[test]
    fn test_snapshot_ordering() {
        let mut book = OrderBook::new(Symbol::new("AAPL"));
        book.insert(order("ana", Side::BUY, 149, 1, 1));
        book.insert(order("bruno", Side::BUY, 150, 1, 2));
        book.insert(order("caio", Side::BUY, 150, 1, 3));
        book.insert(order("dora", Side::SELL, 152, 1, 4));
        book.insert(order("eli", Side::SELL, 151, 1, 5));

        let snapshot = book.snapshot();
        let bid_users: Vec<&str> = snapshot.bids.iter().map(|e| e.user_id.as_str()).collect();
        let ask_users: Vec<&str> = snapshot.asks.iter().map(|e| e.user_id.as_str()).collect();
        assert_eq!(bid_users, vec!["bruno", "caio", "ana"]);
        assert_eq!(ask_users, vec!["eli", "dora"]);

        let depth = book.depth(1);
        assert_eq!(depth.bids, vec![(Price::from_u64(150), Quantity::new(2))]);
        assert_eq!(depth.asks, vec![(Price::from_u64(151), Quantity::new(1))]);
    }

    #[test]
    fn test_crossed_detection() {
        let mut book = OrderBook::new(Symbol::new("AAPL"));
        book.insert(order("ana", Side::BUY, 150, 1, 1));
        book.insert(order("bruno", Side::SELL, 150, 1, 2));
        assert!(book.is_crossed());
    }

    #[test]
    #[should_panic(expected = "Order inserted into wrong book")]
    fn test_insert_wrong_symbol_panics() {
        let mut book = OrderBook::new(Symbol::new("MSFT"));
        book.insert(order("ana", Side::BUY, 150, 1, 1));
    }
}
