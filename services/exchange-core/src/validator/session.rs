//! Market session calendar and clocks

use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveTime, Utc, Weekday};
use parking_lot::Mutex;
use std::collections::HashSet;

use crate::config::MarketSessionConfig;
use crate::error::EngineError;

/// Source of the current time for session checks and timestamps
pub trait MarketClock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    /// Current time as Unix nanoseconds
    fn now_nanos(&self) -> i64 {
        let now = self.now();
        now.timestamp_nanos_opt()
            .unwrap_or_else(|| now.timestamp().saturating_mul(1_000_000_000))
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl MarketClock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually driven clock
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self { now: Mutex::new(now) }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock() = now;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock();
        *now += by;
    }
}

impl MarketClock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}

/// When the market accepts orders
#[derive(Debug, Clone)]
pub struct MarketSession {
    offset: FixedOffset,
    open: NaiveTime,
    close: NaiveTime,
    trading_days: HashSet<Weekday>,
    holidays: HashSet<NaiveDate>,
}

impl MarketSession {
    pub fn from_config(config: &MarketSessionConfig) -> Result<Self, EngineError> {
        let offset = FixedOffset::east_opt(config.utc_offset_minutes * 60).ok_or_else(|| {
            EngineError::Config(format!(
                "utc offset out of range: {} minutes",
                config.utc_offset_minutes
            ))
        })?;

        Ok(Self {
            offset,
            open: config.open,
            close: config.close,
            trading_days: config.trading_days.iter().copied().collect(),
            holidays: config.holidays.iter().copied().collect(),
        })
    }

    /// True on a trading day that is not a holiday, with `open <= t < close`
    /// in exchange local time
    pub fn is_open(&self, at: DateTime<Utc>) -> bool {
        let local = at.with_timezone(&self.offset);
        let date = local.date_naive();
        let time = local.time();

        self.trading_days.contains(&date.weekday())
            && !self.holidays.contains(&date)
            && time >= self.open
            && time < self.close
    }
}
