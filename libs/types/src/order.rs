//! Order lifecycle types
//!
//! An order is created PENDING on intake, moves to PARTIAL/FILLED as fills
//! arrive, and ends FILLED, CANCELLED or REJECTED. Only the matching engine
//! mutates orders.

use crate::errors::RejectReason;
use crate::ids::{OrderId, Symbol, UserId};
use crate::numeric::{Price, Quantity};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Order side (buyer or seller)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    /// Buy order (bid)
    BUY,
    /// Sell order (ask)
    SELL,
}

impl Side {
    /// Get the opposite side
    pub fn opposite(&self) -> Self {
        match self {
            Side::BUY => Side::SELL,
            Side::SELL => Side::BUY,
        }
    }
}

/// Order status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "state", content = "reason")]
pub enum OrderStatus {
    /// Accepted, nothing filled yet
    #[serde(rename = "PENDING")]
    Pending,

    /// Some quantity filled, remainder resting
    #[serde(rename = "PARTIAL")]
    Partial,

    /// Completely matched (terminal)
    #[serde(rename = "FILLED")]
    Filled,

    /// Removed from the book on request (terminal)
    #[serde(rename = "CANCELLED")]
    Cancelled,

    /// Refused before entering the book (terminal)
    #[serde(rename = "REJECTED")]
    Rejected(RejectReason),
}

impl OrderStatus {
    /// Check if status is terminal (no further transitions possible)
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::Filled | OrderStatus::Cancelled | OrderStatus::Rejected(_)
        )
    }

    /// Statuses an order may have while it sits in a book
    pub fn is_resting(&self) -> bool {
        matches!(self, OrderStatus::Pending | OrderStatus::Partial)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Partial => "PARTIAL",
            OrderStatus::Filled => "FILLED",
            OrderStatus::Cancelled => "CANCELLED",
            OrderStatus::Rejected(_) => "REJECTED",
        }
    }
}

/// Funds or shares held in escrow for the unfilled part of an order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reservation {
    Cash(Decimal),
    Shares(Quantity),
}

impl Reservation {
    pub fn is_zero(&self) -> bool {
        match self {
            Reservation::Cash(amount) => amount.is_zero(),
            Reservation::Shares(qty) => qty.is_zero(),
        }
    }
}

/// A limit order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub order_id: OrderId,
    pub user_id: UserId,
    pub symbol: Symbol,
    pub side: Side,
    pub price: Price,
    pub quantity: Quantity,
    pub remaining_quantity: Quantity,
    pub status: OrderStatus,
    /// Arrival sequence assigned on intake; FIFO tie-break within a price
    pub sequence: u64,
    pub created_at: i64, // Unix nanos
    pub updated_at: i64, // Unix nanos
    pub version: u64,
}

impl Order {
    /// Create a new pending order
    pub fn new(
        user_id: UserId,
        symbol: Symbol,
        side: Side,
        price: Price,
        quantity: Quantity,
        sequence: u64,
        timestamp: i64,
    ) -> Self {
        Self {
            order_id: OrderId::new(),
            user_id,
            symbol,
            side,
            price,
            quantity,
            remaining_quantity: quantity,
            status: OrderStatus::Pending,
            sequence,
            created_at: timestamp,
            updated_at: timestamp,
            version: 0,
        }
    }

    pub fn filled_quantity(&self) -> Quantity {
        self.quantity - self.remaining_quantity
    }

    /// Check the quantity/status invariants
    pub fn check_invariant(&self) -> bool {
        if self.remaining_quantity > self.quantity {
            return false;
        }
        match self.status {
            OrderStatus::Pending => self.remaining_quantity == self.quantity,
            OrderStatus::Partial => {
                !self.remaining_quantity.is_zero() && self.remaining_quantity < self.quantity
            }
            OrderStatus::Filled => self.remaining_quantity.is_zero() && self.has_fills(),
            OrderStatus::Cancelled => !self.remaining_quantity.is_zero(),
            OrderStatus::Rejected(_) => self.remaining_quantity == self.quantity,
        }
    }

    /// Check if order is completely filled
    pub fn is_filled(&self) -> bool {
        self.remaining_quantity.is_zero() && self.has_fills()
    }

    /// Check if order has any fills
    pub fn has_fills(&self) -> bool {
        self.remaining_quantity < self.quantity
    }

    /// Value of the full order at its limit price
    pub fn notional(&self) -> Decimal {
        self.price.notional(self.quantity)
    }

    /// Value of the full order, or `None` if it does not fit a `Decimal`
    pub fn checked_notional(&self) -> Option<Decimal> {
        self.price.checked_notional(self.quantity)
    }

    /// Escrow still held for the unfilled remainder
    ///
    /// BUY orders reserve cash at their limit price, SELL orders reserve
    /// shares. Zero once the order has left the book.
    pub fn outstanding_reservation(&self) -> Reservation {
        let remaining = if self.status.is_resting() {
            self.remaining_quantity
        } else {
            Quantity::zero()
        };
        match self.side {
            Side::BUY => Reservation::Cash(self.price.notional(remaining)),
            Side::SELL => Reservation::Shares(remaining),
        }
    }

    /// Apply a fill and adjust status
    ///
    /// # Panics
    /// Panics if the order is not live or the fill would exceed the
    /// remaining quantity.
    pub fn add_fill(&mut self, fill_quantity: Quantity, timestamp: i64) {
        assert!(self.status.is_resting(), "Cannot fill a terminal order");
        assert!(!fill_quantity.is_zero(), "Fill quantity must be positive");

        self.remaining_quantity = self
            .remaining_quantity
            .checked_sub(fill_quantity)
            .expect("Fill would exceed order quantity");

        self.status = if self.remaining_quantity.is_zero() {
            OrderStatus::Filled
        } else {
            OrderStatus::Partial
        };

        self.updated_at = timestamp;
        self.version += 1;

        assert!(self.check_invariant(), "Invariant violated after fill");
    }

    /// Cancel the order
    ///
    /// # Panics
    /// Panics if order is already in terminal state
    pub fn cancel(&mut self, timestamp: i64) {
        assert!(!self.status.is_terminal(), "Cannot cancel terminal order");

        self.status = OrderStatus::Cancelled;
        self.updated_at = timestamp;
        self.version += 1;
    }

    /// Reject the order
    ///
    /// # Panics
    /// Panics if the order has already been filled against
    pub fn reject(&mut self, reason: RejectReason, timestamp: i64) {
        assert!(
            self.status == OrderStatus::Pending && !self.has_fills(),
            "Only a fresh order can be rejected"
        );

        self.status = OrderStatus::Rejected(reason);
        self.updated_at = timestamp;
        self.version += 1;
    }
}
