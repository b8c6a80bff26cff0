//! Per-user cash and position accounting
//!
//! Invariants: `reserved_cash <= cash`, and for every symbol
//! `reserved_positions[s] <= positions[s]` and
//! `positions[s] + pending_buys[s] <= u64::MAX`. No map ever holds a zero
//! entry.
//! Mutators are crate-private: only the ledger changes a portfolio.

use rust_decimal::Decimal;
use std::collections::BTreeMap;
use types::errors::LedgerError;
use types::ids::{Symbol, UserId};
use types::numeric::Quantity;
use types::portfolio::PortfolioSnapshot;
use types::user::User;

#[derive(Debug, Clone, PartialEq)]
pub struct Portfolio {
    user_id: UserId,
    cash: Decimal,
    reserved_cash: Decimal,
    positions: BTreeMap<Symbol, u64>,
    reserved_positions: BTreeMap<Symbol, u64>,
    /// Shares still to arrive from accepted buy orders
    pending_buys: BTreeMap<Symbol, u64>,
    updated_at: i64,
    version: u64,
}

impl Portfolio {
    /// Open a portfolio from the user's seed cash and positions
    pub fn open(user: &User, timestamp: i64) -> Self {
        assert!(user.cash >= Decimal::ZERO, "Seed cash must be non-negative");
        Self {
            user_id: user.id.clone(),
            cash: user.cash,
            reserved_cash: Decimal::ZERO,
            positions: user
                .initial_positions
                .iter()
                .filter(|(_, qty)| **qty > 0)
                .map(|(symbol, qty)| (symbol.clone(), *qty))
                .collect(),
            reserved_positions: BTreeMap::new(),
            pending_buys: BTreeMap::new(),
            updated_at: timestamp,
            version: 0,
        }
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn cash(&self) -> Decimal {
        self.cash
    }

    pub fn reserved_cash(&self) -> Decimal {
        self.reserved_cash
    }

    pub fn available_cash(&self) -> Decimal {
        self.cash - self.reserved_cash
    }

    pub fn position(&self, symbol: &Symbol) -> u64 {
        self.positions.get(symbol).copied().unwrap_or(0)
    }

    pub fn reserved_position(&self, symbol: &Symbol) -> u64 {
        self.reserved_positions.get(symbol).copied().unwrap_or(0)
    }

    pub fn available_position(&self, symbol: &Symbol) -> u64 {
        self.position(symbol) - self.reserved_position(symbol)
    }

    pub fn pending_buy(&self, symbol: &Symbol) -> u64 {
        self.pending_buys.get(symbol).copied().unwrap_or(0)
    }

    /// Check the balance invariants
    pub fn check_invariant(&self) -> bool {
        self.reserved_cash >= Decimal::ZERO
            && self.reserved_cash <= self.cash
            && self.positions.values().all(|qty| *qty > 0)
            && self.reserved_positions.values().all(|qty| *qty > 0)
            && self.pending_buys.values().all(|qty| *qty > 0)
            && self
                .reserved_positions
                .iter()
                .all(|(symbol, reserved)| *reserved <= self.position(symbol))
            && self
                .pending_buys
                .iter()
                .all(|(symbol, pending)| self.position(symbol).checked_add(*pending).is_some())
    }

    pub fn snapshot(&self) -> PortfolioSnapshot {
        PortfolioSnapshot {
            user_id: self.user_id.clone(),
            cash: self.cash,
            reserved_cash: self.reserved_cash,
            available_cash: self.available_cash(),
            positions: self.positions.clone(),
            reserved_positions: self.reserved_positions.clone(),
            updated_at: self.updated_at,
        }
    }

    /// Move `amount` from available to reserved cash
    pub(crate) fn reserve_cash(&mut self, amount: Decimal, timestamp: i64) -> Result<(), LedgerError> {
        assert!(amount >= Decimal::ZERO, "Reserve amount must be non-negative");
        let available = self.available_cash();
        if amount > available {
            return Err(LedgerError::InsufficientBalance {
                required: amount,
                available,
            });
        }

        self.reserved_cash += amount;
        self.touch(timestamp);
        Ok(())
    }

    /// Return reserved cash to available
    ///
    /// # Panics
    /// Panics if `amount` exceeds the reservation
    pub(crate) fn release_cash(&mut self, amount: Decimal, timestamp: i64) {
        assert!(amount >= Decimal::ZERO, "Release amount must be non-negative");
        assert!(amount <= self.reserved_cash, "Insufficient reserved cash");

        self.reserved_cash -= amount;
        self.touch(timestamp);
    }

    /// Reserve cash for a buy order and count its shares as pending
    ///
    /// Refused when the position plus everything already on order could
    /// not hold `quantity` more shares, so every later fill can settle.
    pub(crate) fn reserve_buy(
        &mut self,
        symbol: &Symbol,
        quantity: Quantity,
        amount: Decimal,
        timestamp: i64,
    ) -> Result<(), LedgerError> {
        let held = self.position(symbol);
        let pending = self.pending_buy(symbol);
        let headroom = held
            .checked_add(pending)
            .and_then(|committed| committed.checked_add(quantity.as_u64()));
        if headroom.is_none() {
            return Err(LedgerError::PositionOverflow {
                symbol: symbol.to_string(),
                held,
                incoming: pending.saturating_add(quantity.as_u64()),
            });
        }

        self.reserve_cash(amount, timestamp)?;
        adjust(&mut self.pending_buys, symbol, quantity.as_u64() as i128);
        Ok(())
    }

    /// Undo [`Portfolio::reserve_buy`] for the unfilled remainder of an order
    ///
    /// # Panics
    /// Panics if either amount exceeds what is reserved
    pub(crate) fn release_buy(
        &mut self,
        symbol: &Symbol,
        quantity: Quantity,
        amount: Decimal,
        timestamp: i64,
    ) {
        assert!(quantity.as_u64() <= self.pending_buy(symbol), "Insufficient pending buy");
        adjust(&mut self.pending_buys, symbol, -(quantity.as_u64() as i128));
        self.release_cash(amount, timestamp);
    }

    /// Move `quantity` shares from available to reserved
    pub(crate) fn reserve_shares(
        &mut self,
        symbol: &Symbol,
        quantity: Quantity,
        timestamp: i64,
    ) -> Result<(), LedgerError> {
        let available = self.available_position(symbol);
        if quantity.as_u64() > available {
            return Err(LedgerError::InsufficientPosition {
                symbol: symbol.to_string(),
                required: quantity.as_u64(),
                available,
            });
        }

        adjust(&mut self.reserved_positions, symbol, quantity.as_u64() as i128);
        self.touch(timestamp);
        Ok(())
    }

    /// Return reserved shares to available
    ///
    /// # Panics
    /// Panics if `quantity` exceeds the reservation
    pub(crate) fn release_shares(&mut self, symbol: &Symbol, quantity: Quantity, timestamp: i64) {
        assert!(
            quantity.as_u64() <= self.reserved_position(symbol),
            "Insufficient reserved position"
        );

        adjust(&mut self.reserved_positions, symbol, -(quantity.as_u64() as i128));
        self.touch(timestamp);
    }

    /// Whether the buy leg of a fill can be applied
    pub(crate) fn can_settle_buy(
        &self,
        symbol: &Symbol,
        quantity: Quantity,
        reserved: Decimal,
        cost: Decimal,
    ) -> bool {
        reserved <= self.reserved_cash
            && cost <= reserved
            && cost <= self.cash
            && self.position(symbol).checked_add(quantity.as_u64()).is_some()
    }

    /// Whether the sell leg of a fill can be applied
    pub(crate) fn can_settle_sell(&self, symbol: &Symbol, quantity: Quantity) -> bool {
        quantity.as_u64() <= self.reserved_position(symbol)
    }

    /// Buy leg: consume `reserved` of the reservation, pay `cost`, receive shares
    ///
    /// `reserved - cost` is price improvement and goes back to available.
    /// Shares bought against a bare cash reservation were never pending, so
    /// the pending count only drops by what it holds.
    pub(crate) fn settle_buy(
        &mut self,
        symbol: &Symbol,
        quantity: Quantity,
        reserved: Decimal,
        cost: Decimal,
        timestamp: i64,
    ) {
        assert!(
            self.can_settle_buy(symbol, quantity, reserved, cost),
            "Buy settlement exceeds reservation"
        );

        self.reserved_cash -= reserved;
        self.cash -= cost;
        let arrived = quantity.as_u64().min(self.pending_buy(symbol));
        adjust(&mut self.pending_buys, symbol, -(arrived as i128));
        adjust(&mut self.positions, symbol, quantity.as_u64() as i128);
        self.touch(timestamp);

        assert!(self.check_invariant(), "Invariant violated after buy settlement");
    }

    /// Sell leg: deliver reserved shares, receive `proceeds`
    pub(crate) fn settle_sell(
        &mut self,
        symbol: &Symbol,
        quantity: Quantity,
        proceeds: Decimal,
        timestamp: i64,
    ) {
        assert!(self.can_settle_sell(symbol, quantity), "Sell settlement exceeds reservation");

        let delta = -(quantity.as_u64() as i128);
        adjust(&mut self.reserved_positions, symbol, delta);
        adjust(&mut self.positions, symbol, delta);
        self.cash += proceeds;
        self.touch(timestamp);

        assert!(self.check_invariant(), "Invariant violated after sell settlement");
    }

    fn touch(&mut self, timestamp: i64) {
        self.updated_at = timestamp;
        self.version += 1;
    }
}

/// Add `delta` to a share map entry, dropping it when it reaches zero
fn adjust(map: &mut BTreeMap<Symbol, u64>, symbol: &Symbol, delta: i128) {
    let current = map.get(symbol).copied().unwrap_or(0) as i128;
    let next = current + delta;
    assert!(next >= 0, "Share balance would go negative");
    let next = u64::try_from(next).expect("Share balance would overflow");

    if next == 0 {
        map.remove(symbol);
    } else {
        map.insert(symbol.clone(), next);
    }
}
