//! Exchange Core
//!
//! Order matching and settlement for a single stock exchange: limit orders
//! are validated, escrowed against the user's portfolio, matched with
//! price-time priority and settled at the resting order's price.
//!
//! **Key Invariants:**
//! - Price-time priority strictly enforced, FIFO within a price
//! - A book is never left crossed once an order has been processed
//! - Every resting order is fully backed by reserved cash or shares
//! - Conservation of cash and shares across settlement
//!
//! **Concurrency:** one lock per symbol book, one per portfolio. Two
//! portfolios are always locked in ascending user-id order.

pub mod book;
pub mod catalog;
pub mod config;
pub mod engine;
pub mod error;
pub mod ledger;
pub mod matching;
pub mod store;
pub mod validator;

pub use catalog::StockCatalog;
pub use config::{EngineConfig, MarketSessionConfig};
pub use engine::{MatchResult, MatchingEngine, Stores};
pub use error::EngineError;
pub use ledger::{PortfolioLedger, Settlement};
pub use validator::{BusinessValidator, FixedClock, MarketClock, SystemClock};
