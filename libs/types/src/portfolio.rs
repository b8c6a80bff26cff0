//! Read-only portfolio views and price lookup

use crate::ids::{Symbol, UserId};
use crate::numeric::Price;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Point-in-time copy of a user's portfolio
///
/// Invariants: `available_cash = cash - reserved_cash >= 0` and, per symbol,
/// `reserved <= position`. Positions never hold zero entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSnapshot {
    pub user_id: UserId,
    pub cash: Decimal,
    pub reserved_cash: Decimal,
    pub available_cash: Decimal,
    pub positions: BTreeMap<Symbol, u64>,
    pub reserved_positions: BTreeMap<Symbol, u64>,
    pub updated_at: i64,
}

impl PortfolioSnapshot {
    pub fn position(&self, symbol: &Symbol) -> u64 {
        self.positions.get(symbol).copied().unwrap_or(0)
    }

    pub fn available_position(&self, symbol: &Symbol) -> u64 {
        self.position(symbol) - self.reserved_positions.get(symbol).copied().unwrap_or(0)
    }

    /// Cash plus positions marked at the oracle's prices
    ///
    /// Symbols the oracle cannot price contribute nothing.
    pub fn total_value(&self, oracle: &dyn PriceOracle) -> Decimal {
        self.positions
            .iter()
            .filter_map(|(symbol, qty)| {
                oracle
                    .price_of(symbol)
                    .map(|price| price.as_decimal() * Decimal::from(*qty))
            })
            .fold(self.cash, |total, value| total + value)
    }
}

/// Source of marking prices for portfolio valuation
pub trait PriceOracle {
    fn price_of(&self, symbol: &Symbol) -> Option<Price>;
}

impl PriceOracle for HashMap<Symbol, Price> {
    fn price_of(&self, symbol: &Symbol) -> Option<Price> {
        self.get(symbol).copied()
    }
}

impl PriceOracle for BTreeMap<Symbol, Price> {
    fn price_of(&self, symbol: &Symbol) -> Option<Price> {
        self.get(symbol).copied()
    }
}
