//! Trade execution types
//!
//! A trade is one fill between a resting (maker) order and the incoming
//! (aggressor) order. Immutable once created.

use crate::ids::{OrderId, Symbol, TradeId, UserId};
use crate::numeric::{Price, Quantity};
use crate::order::{Order, Side};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Executed trade
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub trade_id: TradeId,
    pub sequence: u64, // Global monotonic sequence
    pub symbol: Symbol,

    // Order references
    pub buy_order_id: OrderId,
    pub sell_order_id: OrderId,

    // Counterparties
    pub buyer_id: UserId,
    pub seller_id: UserId,

    /// Side of the incoming order that caused the fill
    pub aggressor_side: Side,
    /// Execution price (the resting order's price)
    pub price: Price,
    pub quantity: Quantity,
    /// quantity × price
    pub value: Decimal,

    pub executed_at: i64, // Unix nanos
}

impl Trade {
    /// Build a trade from the two orders of a fill
    ///
    /// Buyer and seller are resolved from the orders' sides; the execution
    /// price is the maker's.
    ///
    /// # Panics
    /// Panics if both orders are on the same side.
    pub fn between(
        sequence: u64,
        maker: &Order,
        taker: &Order,
        quantity: Quantity,
        executed_at: i64,
    ) -> Self {
        assert_ne!(maker.side, taker.side, "Trade requires opposite sides");

        let (buy, sell) = match taker.side {
            Side::BUY => (taker, maker),
            Side::SELL => (maker, taker),
        };

        Self {
            trade_id: TradeId::new(),
            sequence,
            symbol: maker.symbol.clone(),
            buy_order_id: buy.order_id,
            sell_order_id: sell.order_id,
            buyer_id: buy.user_id.clone(),
            seller_id: sell.user_id.clone(),
            aggressor_side: taker.side,
            price: maker.price,
            quantity,
            value: maker.price.notional(quantity),
            executed_at,
        }
    }

    /// Order id of the resting side
    pub fn maker_order_id(&self) -> OrderId {
        match self.aggressor_side {
            Side::BUY => self.sell_order_id,
            Side::SELL => self.buy_order_id,
        }
    }

    /// Validate value = quantity × price
    pub fn check_invariant(&self) -> bool {
        !self.quantity.is_zero()
            && self.price.as_decimal() > Decimal::ZERO
            && self.value == self.price.notional(self.quantity)
    }
}
