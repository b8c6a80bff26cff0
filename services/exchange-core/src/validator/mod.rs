//! Business validation
//!
//! Pure checks run before an order may touch the book or the ledger.
//! The first failing check decides the rejection reason:
//! 1. Symbol is listed
//! 2. Quantity is positive
//! 3. Price is a valid currency amount and not below the symbol minimum
//! 4. Market session is open
//! 5. User exists, is active, and the order value is within their limit

pub mod session;

pub use session::{FixedClock, MarketClock, MarketSession, SystemClock};

use rust_decimal::Decimal;
use std::sync::Arc;
use types::errors::RejectReason;
use types::ids::Symbol;
use types::numeric::Price;
use types::order::Order;
use types::user::User;

use crate::catalog::StockCatalog;

pub struct BusinessValidator {
    catalog: Arc<StockCatalog>,
    session: MarketSession,
    clock: Arc<dyn MarketClock>,
    default_max_order_value: Option<Decimal>,
}

impl BusinessValidator {
    pub fn new(
        catalog: Arc<StockCatalog>,
        session: MarketSession,
        clock: Arc<dyn MarketClock>,
        default_max_order_value: Option<Decimal>,
    ) -> Self {
        Self {
            catalog,
            session,
            clock,
            default_max_order_value,
        }
    }

    /// Validate an order for the given user (`None` if the user is unknown)
    pub fn validate(&self, order: &Order, user: Option<&User>) -> Result<(), RejectReason> {
        self.validate_symbol(&order.symbol)?;

        if order.quantity.is_zero() {
            return Err(RejectReason::InvalidQuantity);
        }

        self.validate_price(&order.symbol, order.price)?;

        if !self.is_market_open() {
            return Err(RejectReason::MarketClosed);
        }

        let user = user.ok_or(RejectReason::UserNotFound)?;
        if !user.is_active() {
            return Err(RejectReason::UserInactive);
        }
        self.validate_order_value(order, user)
    }

    pub fn validate_symbol(&self, symbol: &Symbol) -> Result<(), RejectReason> {
        if self.catalog.contains(symbol) {
            Ok(())
        } else {
            Err(RejectReason::InvalidSymbol)
        }
    }

    pub fn validate_price(&self, symbol: &Symbol, price: Price) -> Result<(), RejectReason> {
        if !price.is_valid() {
            return Err(RejectReason::InvalidPrice);
        }
        match self.catalog.min_price(symbol) {
            Some(min) if price < min => Err(RejectReason::PriceTooLow),
            Some(_) => Ok(()),
            None => Err(RejectReason::InvalidSymbol),
        }
    }

    pub fn is_market_open(&self) -> bool {
        self.session.is_open(self.clock.now())
    }

    /// Order value against the user's limit, falling back to the default
    ///
    /// A value too large to represent is rejected even without a limit:
    /// it could be neither reserved nor settled.
    fn validate_order_value(&self, order: &Order, user: &User) -> Result<(), RejectReason> {
        let limit = user.max_order_value.or(self.default_max_order_value);
        match (order.checked_notional(), limit) {
            (None, Some(_)) => Err(RejectReason::ExceedsLimit),
            (None, None) => Err(RejectReason::InvalidQuantity),
            (Some(value), Some(limit)) if value > limit => Err(RejectReason::ExceedsLimit),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MarketSessionConfig;
    use chrono::{TimeZone, Utc};
    use types::ids::UserId;
    use types::numeric::Quantity;
    use types::order::Side;
    use types::stock::Stock;
    use types::user::UserStatus;

    fn validator_at(hour_utc: u32) -> BusinessValidator {
        let catalog = StockCatalog::from_stocks(vec![Stock::new("AAPL", Price::from_u64(10))]);
        let clock = FixedClock::new(Utc.with_ymd_and_hms(2026, 10, 19, hour_utc, 0, 0).unwrap());
        BusinessValidator::new(
            Arc::new(catalog),
            MarketSession::from_config(&MarketSessionConfig::default()).unwrap(),
            Arc::new(clock),
            Some(Decimal::from(10_000)),
        )
    }

    fn order(symbol: &str, price: &str, qty: u64) -> Order {
        Order::new(
            UserId::new("ana"),
            Symbol::new(symbol),
            Side::BUY,
            price.parse::<Price>().unwrap(),
            Quantity::new(qty),
            1,
            0,
        )
    }

    fn user() -> User {
        User::new("ana", "Ana", Decimal::from(100_000))
    }

    #[test]
    fn test_valid_order() {
        let validator = validator_at(15);
        assert_eq!(validator.validate(&order("AAPL", "150.00", 10), Some(&user())), Ok(()));
    }

    #[test]
    fn test_check_order() {
        let validator = validator_at(15);
        let cases = [
            (order("XYZ", "0", 0), RejectReason::InvalidSymbol),
            (order("AAPL", "0", 0), RejectReason::InvalidQuantity),
            (order("AAPL", "0", 1), RejectReason::InvalidPrice),
            (order("AAPL", "10.001", 1), RejectReason::InvalidPrice),
            (order("AAPL", "9.99", 1), RejectReason::PriceTooLow),
        ];
        for (order, expected) in cases {
            assert_eq!(validator.validate(&order, Some(&user())), Err(expected));
        }
    }

    #[test]
    fn test_market_closed() {
        // 22:00 UTC is 17:00 local
        let validator = validator_at(22);
        let result = validator.validate(&order("AAPL", "150", 1), Some(&user()));
        assert_eq!(result, Err(RejectReason::MarketClosed));
        assert!(!validator.is_market_open());
    }

    #[test]
    fn test_min_price_is_inclusive() {
        let validator = validator_at(15);
        assert_eq!(validator.validate(&order("AAPL", "10.00", 1), Some(&user())), Ok(()));
    }

    #[test]
    fn test_user_checks() {
        let validator = validator_at(15);
        let o = order("AAPL", "150", 10);

        assert_eq!(validator.validate(&o, None), Err(RejectReason::UserNotFound));

        let suspended = user().with_status(UserStatus::Suspended);
        assert_eq!(validator.validate(&o, Some(&suspended)), Err(RejectReason::UserInactive));
    }

    #[test]
    fn test_order_value_limits() {
        let validator = validator_at(15);

        // Default limit 10_000: 100 x 100.01 exceeds it, 100 x 100 does not
        assert_eq!(
            validator.validate(&order("AAPL", "100.01", 100), Some(&user())),
            Err(RejectReason::ExceedsLimit)
        );
        assert_eq!(validator.validate(&order("AAPL", "100", 100), Some(&user())), Ok(()));

        // A user's own limit takes precedence over the default
        let whale = user().with_max_order_value(Decimal::from(1_000_000));
        assert_eq!(validator.validate(&order("AAPL", "100.01", 100), Some(&whale)), Ok(()));
    }

    #[test]
    fn test_unrepresentable_order_value() {
        let huge = order("AAPL", "5000000000", u64::MAX);
        assert_eq!(huge.checked_notional(), None);

        let validator = validator_at(15);
        assert_eq!(validator.validate(&huge, Some(&user())), Err(RejectReason::ExceedsLimit));

        let unlimited = BusinessValidator::new(
            Arc::new(StockCatalog::from_stocks(vec![Stock::new("AAPL", Price::from_u64(10))])),
            MarketSession::from_config(&MarketSessionConfig::default()).unwrap(),
            Arc::new(FixedClock::new(Utc.with_ymd_and_hms(2026, 10, 19, 15, 0, 0).unwrap())),
            None,
        );
        assert_eq!(unlimited.validate(&huge, Some(&user())), Err(RejectReason::InvalidQuantity));

        // Large but representable values pass when nothing limits them
        let large = order("AAPL", "1000000", u64::MAX);
        assert_eq!(unlimited.validate(&large, Some(&user())), Ok(()));
    }
}
