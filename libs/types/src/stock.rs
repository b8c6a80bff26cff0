//! Listed stock reference data

use crate::ids::Symbol;
use crate::numeric::Price;
use serde::{Deserialize, Serialize};

/// A tradable stock
///
/// Immutable once the catalog is loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stock {
    pub symbol: Symbol,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub sector: String,
    /// Orders priced below this are rejected
    pub min_price: Price,
    #[serde(default)]
    pub market_cap: String,
    #[serde(default)]
    pub description: String,
}

impl Stock {
    pub fn new(symbol: impl AsRef<str>, min_price: Price) -> Self {
        Self {
            symbol: Symbol::new(symbol),
            company: String::new(),
            sector: String::new(),
            min_price,
            market_cap: String::new(),
            description: String::new(),
        }
    }

    pub fn with_company(mut self, company: impl Into<String>, sector: impl Into<String>) -> Self {
        self.company = company.into();
        self.sector = sector.into();
        self
    }
}
