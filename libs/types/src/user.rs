//! Trading users and their profile limits

use crate::ids::{Symbol, UserId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Account status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    /// Can trade
    #[default]
    Active,
    /// Orders are refused
    Suspended,
}

/// A registered user and the seed data for their portfolio
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    #[serde(default)]
    pub email: String,
    /// Risk profile label (e.g. "conservative", "aggressive")
    #[serde(default)]
    pub profile: String,
    /// Starting cash balance
    pub cash: Decimal,
    /// Largest single-order value allowed for this profile; `None` uses
    /// the engine-wide default
    #[serde(default)]
    pub max_order_value: Option<Decimal>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: UserStatus,
    /// Shares held when the portfolio is first opened
    #[serde(default)]
    pub initial_positions: BTreeMap<Symbol, u64>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl User {
    pub fn new(id: impl Into<String>, name: impl Into<String>, cash: Decimal) -> Self {
        Self {
            id: UserId::new(id),
            name: name.into(),
            email: String::new(),
            profile: String::new(),
            cash,
            max_order_value: None,
            description: String::new(),
            status: UserStatus::Active,
            initial_positions: BTreeMap::new(),
            created_at: None,
        }
    }

    pub fn with_max_order_value(mut self, limit: Decimal) -> Self {
        self.max_order_value = Some(limit);
        self
    }

    pub fn with_position(mut self, symbol: impl AsRef<str>, quantity: u64) -> Self {
        self.initial_positions.insert(Symbol::new(symbol), quantity);
        self
    }

    pub fn with_status(mut self, status: UserStatus) -> Self {
        self.status = status;
        self
    }

    pub fn is_active(&self) -> bool {
        matches!(self.status, UserStatus::Active)
    }
}
