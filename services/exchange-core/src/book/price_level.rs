//! Price level implementation with FIFO queue
//!
//! A price level contains all resting orders at one price point, in
//! arrival order, to enforce time priority.

use std::collections::VecDeque;
use types::ids::OrderId;
use types::numeric::Quantity;
use types::order::Order;

/// A price level containing orders at a specific price
///
/// Maintains strict FIFO ordering for time-priority matching.
#[derive(Debug, Clone)]
pub struct PriceLevel {
    /// Queue of orders at this price level (FIFO order)
    orders: VecDeque<Order>,
    /// Total remaining quantity at this level
    total_quantity: Quantity,
}

impl PriceLevel {
    /// Create a new empty price level
    pub fn new() -> Self {
        Self {
            orders: VecDeque::new(),
            total_quantity: Quantity::zero(),
        }
    }

    /// Insert an order at the back of the queue (time priority)
    pub fn insert(&mut self, order: Order) {
        self.total_quantity = self.total_quantity + order.remaining_quantity;
        self.orders.push_back(order);
    }

    /// Remove an order from the queue by OrderId
    ///
    /// Returns the removed order, or None if not found
    pub fn remove(&mut self, order_id: &OrderId) -> Option<Order> {
        let position = self.orders.iter().position(|order| &order.order_id == order_id)?;
        let order = self.orders.remove(position)?;
        self.total_quantity = self.total_quantity - order.remaining_quantity;
        Some(order)
    }

    /// Peek at the front order without removing it
    pub fn front(&self) -> Option<&Order> {
        self.orders.front()
    }

    /// Fill the front order by `quantity`
    ///
    /// Returns the order after the fill. An order whose remaining quantity
    /// reaches zero is popped from the queue.
    ///
    /// # Panics
    /// Panics if the level is empty or the fill exceeds the front order.
    pub fn fill_front(&mut self, quantity: Quantity, timestamp: i64) -> Order {
        let front = self
            .orders
            .front_mut()
            .expect("fill against an empty price level");

        front.add_fill(quantity, timestamp);
        self.total_quantity = self.total_quantity - quantity;

        let filled = front.clone();
        if filled.remaining_quantity.is_zero() {
            self.orders.pop_front();
        }
        filled
    }

    /// Iterate orders in priority order
    pub fn iter(&self) -> impl Iterator<Item = &Order> {
        self.orders.iter()
    }

    /// Check if the price level is empty
    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    /// Get the total quantity at this price level
    pub fn total_quantity(&self) -> Quantity {
        self.total_quantity
    }

    /// Get the number of orders at this level
    pub fn order_count(&self) -> usize {
        self.orders.len()
    }
}

impl Default for PriceLevel {
    fn default() -> Self {
        Self::new()
    }
}
