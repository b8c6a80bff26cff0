//! Engine configuration
//!
//! Loaded from JSON; every field has a default so a partial file works.

use chrono::{NaiveDate, NaiveTime, Weekday};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::EngineError;

/// Trading session calendar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketSessionConfig {
    /// Exchange local time as an offset from UTC
    pub utc_offset_minutes: i32,
    /// Session open, inclusive
    pub open: NaiveTime,
    /// Session close, exclusive
    pub close: NaiveTime,
    pub trading_days: Vec<Weekday>,
    /// Local dates on which the market stays closed
    pub holidays: Vec<NaiveDate>,
}

impl Default for MarketSessionConfig {
    fn default() -> Self {
        Self {
            utc_offset_minutes: -5 * 60,
            open: NaiveTime::from_hms_opt(9, 30, 0).unwrap_or(NaiveTime::MIN),
            close: NaiveTime::from_hms_opt(16, 0, 0).unwrap_or(NaiveTime::MIN),
            trading_days: vec![
                Weekday::Mon,
                Weekday::Tue,
                Weekday::Wed,
                Weekday::Thu,
                Weekday::Fri,
                Weekday::Sat,
            ],
            holidays: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub market: MarketSessionConfig,
    /// Stock seed file, `{"stocks": {...}}`
    pub stocks_path: Option<PathBuf>,
    /// User seed file, `{"users": [...]}`
    pub users_path: Option<PathBuf>,
    /// Order value limit for users without their own; `None` means unlimited
    pub default_max_order_value: Option<Decimal>,
}

impl EngineConfig {
    pub fn from_json_str(json: &str) -> Result<Self, EngineError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| EngineError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_path(path: impl AsRef<Path>) -> Result<Self, EngineError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)
            .map_err(|e| EngineError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        let market = &self.market;
        if market.open >= market.close {
            return Err(EngineError::Config(format!(
                "market open {} must be before close {}",
                market.open, market.close
            )));
        }
        if market.utc_offset_minutes.abs() >= 24 * 60 {
            return Err(EngineError::Config(format!(
                "utc offset out of range: {} minutes",
                market.utc_offset_minutes
            )));
        }
        if let Some(limit) = self.default_max_order_value {
            if limit <= Decimal::ZERO {
                return Err(EngineError::Config(format!(
                    "default max order value must be positive, got {}",
                    limit
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_session() {
        let config = EngineConfig::default();
        assert_eq!(config.market.utc_offset_minutes, -300);
        assert_eq!(config.market.open, NaiveTime::from_hms_opt(9, 30, 0).unwrap());
        assert_eq!(config.market.trading_days.len(), 6);
        assert!(!config.market.trading_days.contains(&Weekday::Sun));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let json = r#"{
            "market": {"holidays": ["2026-12-25"], "trading_days": ["Mon", "Tue", "Wed", "Thu", "Fri"]},
            "default_max_order_value": "100000"
        }"#;
        let config = EngineConfig::from_json_str(json).unwrap();

        assert_eq!(config.market.holidays, vec![NaiveDate::from_ymd_opt(2026, 12, 25).unwrap()]);
        assert_eq!(config.market.trading_days.len(), 5);
        assert_eq!(config.market.close, NaiveTime::from_hms_opt(16, 0, 0).unwrap());
        assert_eq!(config.default_max_order_value, Some(Decimal::from(100_000)));
        assert!(config.stocks_path.is_none());
    }

    #[test]
    fn test_inverted_session_rejected() {
        let json = r#"{"market": {"open": "16:00:00", "close": "09:30:00"}}"#;
        assert!(matches!(EngineConfig::from_json_str(json), Err(EngineError::Config(_))));
    }

    #[test]
    fn test_missing_file() {
        let err = EngineConfig::from_json_path("/nonexistent/config.json").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/config.json"));
    }
}
