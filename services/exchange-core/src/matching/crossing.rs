//! Crossing detection logic
//!
//! Determines when a bid and ask can match based on price compatibility

use types::numeric::Price;
use types::order::Side;

/// A bid crosses an ask when bid >= ask
pub fn can_match(bid_price: Price, ask_price: Price) -> bool {
    bid_price >= ask_price
}

/// Check if an incoming order can trade against a resting order
///
/// An incoming BUY needs its limit at or above the resting ask; an incoming
/// SELL needs its limit at or below the resting bid.
pub fn incoming_can_match(incoming_side: Side, incoming_price: Price, resting_price: Price) -> bool {
    match incoming_side {
        Side::BUY => can_match(incoming_price, resting_price),
        Side::SELL => can_match(resting_price, incoming_price),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_can_match_exact() {
        let price = Price::from_u64(150);
        assert!(can_match(price, price), "Equal prices should match");
    }

    #[test]
    fn test_can_match_no_cross() {
        let bid = "149.99".parse::<Price>().unwrap();
        let ask = Price::from_u64(150);
        assert!(!can_match(bid, ask), "Bid < ask should not match");
    }

    #[test]
    fn test_incoming_buy() {
        let limit = Price::from_u64(150);
        assert!(incoming_can_match(Side::BUY, limit, Price::from_u64(149)));
        assert!(!incoming_can_match(Side::BUY, limit, "150.01".parse::<Price>().unwrap()));
    }

    #[test]
    fn test_incoming_sell() {
        let limit = Price::from_u64(150);
        assert!(incoming_can_match(Side::SELL, limit, Price::from_u64(151)));
        assert!(!incoming_can_match(Side::SELL, limit, "149.99".parse::<Price>().unwrap()));
    }
}
