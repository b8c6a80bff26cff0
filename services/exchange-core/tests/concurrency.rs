//! Concurrency test
//!
//! Many threads submit and cancel against a shared engine. Books of
//! different symbols match in parallel; portfolios shared across symbols
//! must settle without deadlock and without losing cash or shares.

mod common;

use common::*;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::thread;
use types::ids::{Symbol, UserId};
use types::order::Side;

#[test]
fn test_concurrent_symbols_conserve_value() {
    let users = traders(4, 1_000_000, 10_000);
    let ids: Vec<UserId> = users.iter().map(|u| u.id.clone()).collect();
    let (engine, _) = engine_with(users);
    let engine = Arc::new(engine);
    let (cash_before, shares_before) = totals(&engine, &ids);

    // Two threads per symbol swap the buyer/seller roles, so the same pair
    // of portfolios settles in both lock orders at once
    let mut handles = Vec::new();
    for symbol in SYMBOLS {
        let pairs = [("trader-0", "trader-1"), ("trader-1", "trader-0"), ("trader-2", "trader-3")];
        for (buyer, seller) in pairs {
            let engine = Arc::clone(&engine);
            handles.push(thread::spawn(move || {
                let mut trades = 0;
                for i in 0..200u64 {
                    let price = Decimal::from(100 + (i % 7));
                    let sell = engine.submit_order(uid(seller), symbol, Side::SELL, 3, price);
                    let buy = engine.submit_order(uid(buyer), symbol, Side::BUY, 3, price);
                    assert!(!sell.is_rejected() && !buy.is_rejected());
                    trades += sell.trades.len() + buy.trades.len();
                }
                trades
            }));
        }
    }

    let trades: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
    assert!(trades > 0);

    let (cash_after, shares_after) = totals(&engine, &ids);
    assert_eq!(cash_after, cash_before);
    assert_eq!(shares_after, shares_before);
    assert_books_uncrossed(&engine);
    assert_reservations_match_books(&engine, &ids);
    assert_eq!(engine.list_trades(None).unwrap().len(), trades);
}

#[test]
fn test_cancels_race_with_matching() {
    let users = traders(2, 1_000_000, 10_000);
    let ids: Vec<UserId> = users.iter().map(|u| u.id.clone()).collect();
    let (engine, _) = engine_with(users);
    let engine = Arc::new(engine);
    let (cash_before, shares_before) = totals(&engine, &ids);

    let bidder = {
        let engine = Arc::clone(&engine);
        thread::spawn(move || {
            let mut cancelled = 0;
            for _ in 0..300 {
                let bid = engine.submit_order(uid("trader-0"), "AAPL", Side::BUY, 5, Decimal::from(50));
                // The bid may have been filled before the cancel lands
                if engine.cancel_order(&bid.order.order_id).is_ok() {
                    cancelled += 1;
                }
            }
            cancelled
        })
    };
    let seller = {
        let engine = Arc::clone(&engine);
        thread::spawn(move || {
            for _ in 0..300 {
                engine.submit_order(uid("trader-1"), "AAPL", Side::SELL, 2, Decimal::from(50));
            }
        })
    };

    bidder.join().unwrap();
    seller.join().unwrap();

    let (cash_after, shares_after) = totals(&engine, &ids);
    assert_eq!(cash_after, cash_before);
    assert_eq!(shares_after, shares_before);
    assert_books_uncrossed(&engine);
    assert_reservations_match_books(&engine, &ids);

    // Every trade moved exactly its value from buyer to seller
    let trades = engine.list_trades(Some("AAPL")).unwrap();
    let traded_value: Decimal = trades.iter().map(|t| t.value).sum();
    let traded_shares: u64 = trades.iter().map(|t| t.quantity.as_u64()).sum();
    let buyer = engine.get_portfolio(&uid("trader-0")).unwrap();
    assert_eq!(buyer.cash, Decimal::from(1_000_000) - traded_value);
    assert_eq!(buyer.position(&Symbol::new("AAPL")), 10_000 + traded_shares);
}

#[test]
fn test_trade_sequences_unique_across_symbols() {
    let users = traders(2, 1_000_000, 10_000);
    let (engine, _) = engine_with(users);
    let engine = Arc::new(engine);

    let handles: Vec<_> = SYMBOLS
        .into_iter()
        .map(|symbol| {
            let engine = Arc::clone(&engine);
            thread::spawn(move || {
                for _ in 0..100 {
                    engine.submit_order(uid("trader-0"), symbol, Side::SELL, 1, Decimal::from(100));
                    engine.submit_order(uid("trader-1"), symbol, Side::BUY, 1, Decimal::from(100));
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let trades = engine.list_trades(None).unwrap();
    assert_eq!(trades.len(), 300);
    let mut sequences: Vec<u64> = trades.iter().map(|t| t.sequence).collect();
    sequences.dedup();
    assert_eq!(sequences.len(), 300);
}
