//! Trade execution logic
//!
//! Turns one fill between a resting and an incoming order into the
//! settlement terms for the ledger and the resulting trade record.

use std::sync::atomic::{AtomicU64, Ordering};
use types::numeric::Quantity;
use types::order::{Order, Side};
use types::trade::Trade;

use crate::ledger::Settlement;

use super::crossing;

/// Match executor for handling trade generation
///
/// Shared by every symbol's book, so the trade sequence is global.
#[derive(Debug)]
pub struct MatchExecutor {
    sequence_counter: AtomicU64,
}

impl MatchExecutor {
    /// Create a new match executor with starting sequence number
    pub fn new(starting_sequence: u64) -> Self {
        Self {
            sequence_counter: AtomicU64::new(starting_sequence),
        }
    }

    /// Get next sequence number (monotonically increasing)
    fn next_sequence(&self) -> u64 {
        self.sequence_counter.fetch_add(1, Ordering::Relaxed)
    }

    /// Settlement terms for filling `quantity` of `maker` against `taker`
    ///
    /// The execution price is the maker's; the buyer's reservation is
    /// consumed at the buy order's own limit.
    pub fn settlement(&self, maker: &Order, taker: &Order, quantity: Quantity) -> Settlement {
        let (buy, sell) = match taker.side {
            Side::BUY => (taker, maker),
            Side::SELL => (maker, taker),
        };
        Settlement {
            symbol: maker.symbol.clone(),
            buyer: buy.user_id.clone(),
            seller: sell.user_id.clone(),
            quantity,
            price: maker.price,
            buyer_limit: buy.price,
        }
    }

    /// Record a fill between maker and taker as a trade
    ///
    /// # Panics
    /// Panics if the orders do not cross or the quantity is zero; the
    /// engine only calls this for valid fills.
    pub fn execute_trade(
        &self,
        maker: &Order,
        taker: &Order,
        quantity: Quantity,
        timestamp: i64,
    ) -> Trade {
        assert!(!quantity.is_zero(), "Trade quantity must be positive");
        assert!(
            crossing::incoming_can_match(taker.side, taker.price, maker.price),
            "Trade between non-crossing orders"
        );

        let trade = Trade::between(self.next_sequence(), maker, taker, quantity, timestamp);
        debug_assert!(trade.check_invariant());
        trade
    }
}
