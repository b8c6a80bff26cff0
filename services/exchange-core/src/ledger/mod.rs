//! Portfolio ledger
//!
//! Holds every user's cash, positions and reservations. Portfolios are
//! opened lazily from the user store on first touch and each one sits
//! behind its own mutex. A settlement touches two portfolios; they are
//! always locked in ascending user-id order so that concurrent fills on
//! different symbols with the roles reversed cannot deadlock.

pub mod portfolio;

pub use portfolio::Portfolio;

use dashmap::DashMap;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{debug, info, warn};
use types::errors::LedgerError;
use types::ids::{Symbol, UserId};
use types::numeric::{Price, Quantity};
use types::order::{Order, Reservation, Side};
use types::portfolio::{PortfolioSnapshot, PriceOracle};
use types::user::User;

use crate::store::UserStore;

/// Terms of one fill, as the ledger applies it
#[derive(Debug, Clone, PartialEq)]
pub struct Settlement {
    pub symbol: Symbol,
    pub buyer: UserId,
    pub seller: UserId,
    pub quantity: Quantity,
    /// Execution price
    pub price: Price,
    /// Limit price of the buy order; its reservation was taken at this price
    pub buyer_limit: Price,
}

impl Settlement {
    /// Cash paid by the buyer and received by the seller
    pub fn cost(&self) -> Decimal {
        self.price.notional(self.quantity)
    }

    /// Portion of the buyer's reservation this fill consumes
    pub fn reserved_cash(&self) -> Decimal {
        self.buyer_limit.notional(self.quantity)
    }
}

pub struct PortfolioLedger {
    portfolios: DashMap<UserId, Arc<Mutex<Portfolio>>>,
    users: Arc<dyn UserStore>,
}

impl PortfolioLedger {
    pub fn new(users: Arc<dyn UserStore>) -> Self {
        Self {
            portfolios: DashMap::new(),
            users,
        }
    }

    /// Handle to a user's portfolio, opening it from the user store if needed
    fn portfolio(&self, user_id: &UserId) -> Result<Arc<Mutex<Portfolio>>, LedgerError> {
        if let Some(entry) = self.portfolios.get(user_id) {
            return Ok(Arc::clone(entry.value()));
        }

        let user = match self.users.get(user_id) {
            Ok(Some(user)) => user,
            Ok(None) => {
                return Err(LedgerError::UserNotFound {
                    user_id: user_id.to_string(),
                })
            }
            Err(err) => {
                warn!(user_id = %user_id, error = %err, "User lookup failed");
                return Err(LedgerError::UserNotFound {
                    user_id: user_id.to_string(),
                });
            }
        };

        // Another thread may have opened it meanwhile; the first one wins
        let entry = self
            .portfolios
            .entry(user_id.clone())
            .or_insert_with(|| {
                info!(user_id = %user_id, cash = %user.cash, "Opening portfolio");
                Arc::new(Mutex::new(Portfolio::open(&user, opened_at(&user))))
            });
        Ok(Arc::clone(entry.value()))
    }

    /// Reserve `amount` of available cash
    pub fn reserve_for_buy(
        &self,
        user_id: &UserId,
        amount: Decimal,
        timestamp: i64,
    ) -> Result<(), LedgerError> {
        let portfolio = self.portfolio(user_id)?;
        let mut portfolio = portfolio.lock();
        portfolio.reserve_cash(amount, timestamp)?;
        debug!(user_id = %user_id, amount = %amount, "Reserved cash");
        Ok(())
    }

    /// Reserve `quantity` available shares of `symbol`
    pub fn reserve_for_sell(
        &self,
        user_id: &UserId,
        symbol: &Symbol,
        quantity: Quantity,
        timestamp: i64,
    ) -> Result<(), LedgerError> {
        let portfolio = self.portfolio(user_id)?;
        let mut portfolio = portfolio.lock();
        portfolio.reserve_shares(symbol, quantity, timestamp)?;
        debug!(user_id = %user_id, symbol = %symbol, quantity = %quantity, "Reserved shares");
        Ok(())
    }

    /// Reserve what a new order needs: limit x quantity of cash for a BUY,
    /// the shares for a SELL
    ///
    /// A BUY also counts its shares as pending, and is refused if the
    /// position could not hold them once filled.
    pub fn reserve(&self, order: &Order, timestamp: i64) -> Result<(), LedgerError> {
        match order.side {
            Side::BUY => {
                let portfolio = self.portfolio(&order.user_id)?;
                let mut portfolio = portfolio.lock();
                let Some(amount) = order.checked_notional() else {
                    return Err(LedgerError::InsufficientBalance {
                        required: Decimal::MAX,
                        available: portfolio.available_cash(),
                    });
                };
                portfolio.reserve_buy(&order.symbol, order.quantity, amount, timestamp)?;
                debug!(
                    user_id = %order.user_id,
                    symbol = %order.symbol,
                    amount = %amount,
                    quantity = %order.quantity,
                    "Reserved cash for buy"
                );
                Ok(())
            }
            Side::SELL => {
                self.reserve_for_sell(&order.user_id, &order.symbol, order.quantity, timestamp)
            }
        }
    }

    /// Release what an order reserved through [`PortfolioLedger::reserve`]
    /// for its unfilled remainder
    ///
    /// Call before the order leaves the book's live states; a filled or
    /// already terminal order releases nothing.
    pub fn release_order(&self, order: &Order, timestamp: i64) -> Result<(), LedgerError> {
        let reservation = order.outstanding_reservation();
        if reservation.is_zero() {
            return Ok(());
        }

        let portfolio = self.portfolio(&order.user_id)?;
        let mut portfolio = portfolio.lock();
        match reservation {
            Reservation::Cash(amount) => {
                portfolio.release_buy(&order.symbol, order.remaining_quantity, amount, timestamp)
            }
            Reservation::Shares(quantity) => {
                portfolio.release_shares(&order.symbol, quantity, timestamp)
            }
        }
        debug!(order_id = %order.order_id, reservation = ?reservation, "Released order reservation");
        Ok(())
    }

    /// Apply one fill to both sides atomically
    ///
    /// Buyer: reservation shrinks by quantity x limit, cash by quantity x
    /// price, shares grow by quantity. Seller: reserved and held shares
    /// shrink by quantity, cash grows by quantity x price. Either both legs
    /// apply or, on error, neither does.
    pub fn settle_fill(&self, settlement: &Settlement, timestamp: i64) -> Result<(), LedgerError> {
        let cost = settlement.cost();
        let reserved = settlement.reserved_cash();
        let symbol = &settlement.symbol;
        let quantity = settlement.quantity;

        if settlement.buyer == settlement.seller {
            let portfolio = self.portfolio(&settlement.buyer)?;
            let mut portfolio = portfolio.lock();
            check_buy_leg(&portfolio, symbol, quantity, reserved, cost)?;
            check_sell_leg(&portfolio, symbol, quantity)?;

            portfolio.settle_buy(symbol, quantity, reserved, cost, timestamp);
            portfolio.settle_sell(symbol, quantity, cost, timestamp);
        } else {
            let buyer_handle = self.portfolio(&settlement.buyer)?;
            let seller_handle = self.portfolio(&settlement.seller)?;

            let (mut buyer, mut seller) = if settlement.buyer < settlement.seller {
                let b = buyer_handle.lock();
                let s = seller_handle.lock();
                (b, s)
            } else {
                let s = seller_handle.lock();
                let b = buyer_handle.lock();
                (b, s)
            };

            check_buy_leg(&buyer, symbol, quantity, reserved, cost)?;
            check_sell_leg(&seller, symbol, quantity)?;

            buyer.settle_buy(symbol, quantity, reserved, cost, timestamp);
            seller.settle_sell(symbol, quantity, cost, timestamp);
        }

        debug!(
            buyer = %settlement.buyer,
            seller = %settlement.seller,
            symbol = %symbol,
            quantity = %quantity,
            price = %settlement.price,
            "Settled fill"
        );
        Ok(())
    }

    /// Return an order's outstanding reservation to available
    ///
    /// A zero reservation is a no-op. Pending buy shares are left alone;
    /// orders reserved through [`PortfolioLedger::reserve`] are released
    /// with [`PortfolioLedger::release_order`].
    pub fn release_reservation(
        &self,
        user_id: &UserId,
        symbol: &Symbol,
        reservation: Reservation,
        timestamp: i64,
    ) -> Result<(), LedgerError> {
        if reservation.is_zero() {
            return Ok(());
        }

        let portfolio = self.portfolio(user_id)?;
        let mut portfolio = portfolio.lock();
        match reservation {
            Reservation::Cash(amount) => portfolio.release_cash(amount, timestamp),
            Reservation::Shares(quantity) => portfolio.release_shares(symbol, quantity, timestamp),
        }
        debug!(user_id = %user_id, symbol = %symbol, reservation = ?reservation, "Released reservation");
        Ok(())
    }

    pub fn available_cash(&self, user_id: &UserId) -> Result<Decimal, LedgerError> {
        Ok(self.portfolio(user_id)?.lock().available_cash())
    }

    pub fn available_position(&self, user_id: &UserId, symbol: &Symbol) -> Result<u64, LedgerError> {
        Ok(self.portfolio(user_id)?.lock().available_position(symbol))
    }

    /// Cash plus positions marked at the oracle's prices
    ///
    /// Positions the oracle has no price for contribute nothing.
    pub fn total_value(
        &self,
        user_id: &UserId,
        oracle: &dyn PriceOracle,
    ) -> Result<Decimal, LedgerError> {
        Ok(self.snapshot(user_id)?.total_value(oracle))
    }

    pub fn snapshot(&self, user_id: &UserId) -> Result<PortfolioSnapshot, LedgerError> {
        Ok(self.portfolio(user_id)?.lock().snapshot())
    }

    /// Snapshots of every portfolio opened so far, by user id
    pub fn snapshots(&self) -> Vec<PortfolioSnapshot> {
        let handles: Vec<Arc<Mutex<Portfolio>>> = self
            .portfolios
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();
        let mut snapshots: Vec<PortfolioSnapshot> =
            handles.iter().map(|p| p.lock().snapshot()).collect();
        snapshots.sort_by(|a, b| a.user_id.cmp(&b.user_id));
        snapshots
    }
}

fn opened_at(user: &User) -> i64 {
    user.created_at
        .and_then(|created| created.timestamp_nanos_opt())
        .unwrap_or(0)
}

fn check_buy_leg(
    portfolio: &Portfolio,
    symbol: &Symbol,
    quantity: Quantity,
    reserved: Decimal,
    cost: Decimal,
) -> Result<(), LedgerError> {
    if portfolio.can_settle_buy(symbol, quantity, reserved, cost) {
        return Ok(());
    }
    let held = portfolio.position(symbol);
    if held.checked_add(quantity.as_u64()).is_none() {
        return Err(LedgerError::PositionOverflow {
            symbol: symbol.to_string(),
            held,
            incoming: quantity.as_u64(),
        });
    }
    Err(LedgerError::InsufficientBalance {
        required: reserved,
        available: portfolio.reserved_cash(),
    })
}

fn check_sell_leg(portfolio: &Portfolio, symbol: &Symbol, quantity: Quantity) -> Result<(), LedgerError> {
    if portfolio.can_settle_sell(symbol, quantity) {
        Ok(())
    } else {
        Err(LedgerError::InsufficientPosition {
            symbol: symbol.to_string(),
            required: quantity.as_u64(),
            available: portfolio.reserved_position(symbol),
        })
    }
}
