//! Shared fixtures for the integration tests
#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use exchange_core::store::{InMemoryStockStore, InMemoryUserStore};
use exchange_core::{EngineConfig, FixedClock, MatchingEngine, Stores};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::sync::Arc;
use types::ids::{Symbol, UserId};
use types::numeric::Price;
use types::stock::Stock;
use types::user::{User, UserStatus};

pub const SYMBOLS: [&str; 3] = ["AAPL", "MSFT", "GOOG"];

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// Monday 2026-10-19 10:00 at UTC-5
pub fn session_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 19, 15, 0, 0).unwrap()
}

pub fn stocks() -> Vec<Stock> {
    vec![
        Stock::new("AAPL", Price::from_u64(10)).with_company("Apple Inc.", "Technology"),
        Stock::new("MSFT", Price::from_u64(5)).with_company("Microsoft", "Technology"),
        Stock::new("GOOG", Price::from_u64(20)).with_company("Alphabet", "Communication"),
    ]
}

pub fn scenario_users() -> Vec<User> {
    vec![
        User::new("alice", "Alice", Decimal::from(10_000)),
        User::new("bob", "Bob", Decimal::ZERO).with_position("AAPL", 100),
        User::new("carol", "Carol", Decimal::from(100)),
        User::new("xavier", "Xavier", Decimal::from(10_000)),
        User::new("yara", "Yara", Decimal::from(10_000)),
        User::new("whale", "Whale", Decimal::from(1_000_000))
            .with_position("AAPL", 1_000)
            .with_position("MSFT", 1_000)
            .with_position("GOOG", 1_000),
        User::new("limited", "Limited", Decimal::from(100_000))
            .with_max_order_value(Decimal::from(1_000)),
        User::new("dormant", "Dormant", Decimal::from(10_000)).with_status(UserStatus::Suspended),
    ]
}

/// `count` traders named `trader-N`, each with the same cash and shares
/// in every listed symbol
pub fn traders(count: usize, cash: i64, shares: u64) -> Vec<User> {
    (0..count)
        .map(|i| {
            SYMBOLS.iter().fold(
                User::new(format!("trader-{}", i), format!("Trader {}", i), Decimal::from(cash)),
                |user, symbol| user.with_position(symbol, shares),
            )
        })
        .collect()
}

pub fn engine_with(users: Vec<User>) -> (MatchingEngine, Arc<FixedClock>) {
    init_tracing();
    let stores = Stores::in_memory()
        .with_stocks(Arc::new(InMemoryStockStore::with_stocks(stocks())))
        .with_users(Arc::new(InMemoryUserStore::with_users(users)));
    let clock = Arc::new(FixedClock::new(session_time()));
    let engine = MatchingEngine::new(&EngineConfig::default(), stores, clock.clone())
        .expect("engine should start");
    (engine, clock)
}

pub fn scenario_engine() -> (MatchingEngine, Arc<FixedClock>) {
    engine_with(scenario_users())
}

pub fn uid(id: &str) -> UserId {
    UserId::new(id)
}

pub fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

/// Total cash and total shares per symbol over `users`
pub fn totals(engine: &MatchingEngine, users: &[UserId]) -> (Decimal, BTreeMap<Symbol, u64>) {
    let mut cash = Decimal::ZERO;
    let mut shares = BTreeMap::new();
    for user in users {
        let portfolio = engine.get_portfolio(user).unwrap();
        cash += portfolio.cash;
        for (symbol, qty) in &portfolio.positions {
            *shares.entry(symbol.clone()).or_insert(0) += qty;
        }
    }
    (cash, shares)
}

/// Every portfolio's reservation equals what its resting orders need:
/// limit x remaining for bids, remaining shares for asks
pub fn assert_reservations_match_books(engine: &MatchingEngine, users: &[UserId]) {
    let mut expected_cash: BTreeMap<UserId, Decimal> = BTreeMap::new();
    let mut expected_shares: BTreeMap<(UserId, Symbol), u64> = BTreeMap::new();

    for symbol in SYMBOLS {
        let snapshot = engine.get_order_book_snapshot(symbol).unwrap();
        for bid in &snapshot.bids {
            *expected_cash.entry(bid.user_id.clone()).or_insert(Decimal::ZERO) +=
                bid.price.notional(bid.remaining_quantity);
        }
        for ask in &snapshot.asks {
            *expected_shares
                .entry((ask.user_id.clone(), snapshot.symbol.clone()))
                .or_insert(0) += ask.remaining_quantity.as_u64();
        }
    }

    for user in users {
        let portfolio = engine.get_portfolio(user).unwrap();
        assert_eq!(
            portfolio.reserved_cash,
            expected_cash.get(user).copied().unwrap_or(Decimal::ZERO),
            "reserved cash of {}",
            user
        );
        for symbol in SYMBOLS {
            let symbol = Symbol::new(symbol);
            assert_eq!(
                portfolio.reserved_positions.get(&symbol).copied().unwrap_or(0),
                expected_shares
                    .get(&(user.clone(), symbol.clone()))
                    .copied()
                    .unwrap_or(0),
                "reserved {} of {}",
                symbol,
                user
            );
        }
        assert!(portfolio.reserved_cash <= portfolio.cash);
        assert!(portfolio.available_cash >= Decimal::ZERO);
    }
}

/// Best bid strictly below best ask on every book
pub fn assert_books_uncrossed(engine: &MatchingEngine) {
    for symbol in SYMBOLS {
        let depth = engine.get_order_book_depth(symbol, 1).unwrap();
        if let (Some((bid, _)), Some((ask, _))) = (depth.bids.first(), depth.asks.first()) {
            assert!(bid < ask, "{} crossed: bid {} >= ask {}", symbol, bid, ask);
        }
    }
}
