//! Stock catalog
//!
//! The set of tradable symbols and their reference data. Loaded once at
//! startup and read-only afterwards, so it is shared without locking.

use std::collections::HashMap;
use tracing::info;
use types::errors::StoreError;
use types::ids::Symbol;
use types::numeric::Price;
use types::stock::Stock;

use crate::store::StockStore;

#[derive(Debug, Clone, Default)]
pub struct StockCatalog {
    stocks: HashMap<Symbol, Stock>,
}

impl StockCatalog {
    pub fn from_stocks(stocks: impl IntoIterator<Item = Stock>) -> Self {
        let stocks: HashMap<Symbol, Stock> = stocks
            .into_iter()
            .map(|stock| (stock.symbol.clone(), stock))
            .collect();
        Self { stocks }
    }

    pub fn from_store(store: &dyn StockStore) -> Result<Self, StoreError> {
        let catalog = Self::from_stocks(store.list()?);
        info!(symbols = catalog.len(), "Loaded stock catalog");
        Ok(catalog)
    }

    pub fn get(&self, symbol: &Symbol) -> Option<&Stock> {
        self.stocks.get(symbol)
    }

    pub fn contains(&self, symbol: &Symbol) -> bool {
        self.stocks.contains_key(symbol)
    }

    pub fn min_price(&self, symbol: &Symbol) -> Option<Price> {
        self.get(symbol).map(|stock| stock.min_price)
    }

    /// Listed symbols, sorted
    pub fn symbols(&self) -> Vec<Symbol> {
        let mut symbols: Vec<Symbol> = self.stocks.keys().cloned().collect();
        symbols.sort();
        symbols
    }

    pub fn len(&self) -> usize {
        self.stocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stocks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStockStore;

    #[test]
    fn test_catalog_from_store() {
        let store = InMemoryStockStore::with_stocks(vec![
            Stock::new("MSFT", Price::from_u64(5)),
            Stock::new("AAPL", Price::from_u64(10)).with_company("Apple Inc.", "Technology"),
        ]);
        let catalog = StockCatalog::from_store(&store).unwrap();

        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.symbols(), vec![Symbol::new("AAPL"), Symbol::new("MSFT")]);
        assert_eq!(catalog.min_price(&Symbol::new("AAPL")), Some(Price::from_u64(10)));
        assert!(!catalog.contains(&Symbol::new("XYZ")));
    }
}
