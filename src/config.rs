// src/config.rs

use std::path::Path;

use chrono::NaiveTime;
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};

use crate::error::{CrossoverError, Result};

/// Calendar days of daily history averaged before each target date.
pub const LOOKBACK_DAYS: i64 = 30;

/// Width of the trailing intraday volume window.
pub const ROLLING_WINDOW_MINUTES: i64 = 60;

pub const DEFAULT_OUTPUT_FILE: &str = "crossover_timestamps.csv";

pub const MILLIS_PER_MINUTE: i64 = 60 * 1000;
pub const MILLIS_PER_DAY: i64 = 24 * 60 * MILLIS_PER_MINUTE;

lazy_static! {
    /// Market open boundary; ticks before it are pre-market and ignored.
    pub static ref MARKET_OPEN: NaiveTime = NaiveTime::from_hms_opt(9, 15, 0).unwrap();
}

/// Tunable boundaries of the crossover scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanSettings {
    pub lookback_days: i64,
    pub rolling_window_minutes: i64,
    pub market_open: NaiveTime,
}

impl Default for ScanSettings {
    fn default() -> Self {
        ScanSettings {
            lookback_days: LOOKBACK_DAYS,
            rolling_window_minutes: ROLLING_WINDOW_MINUTES,
            market_open: *MARKET_OPEN,
        }
    }
}

impl ScanSettings {
    /// Loads settings from a JSON file. Fields left out keep their defaults.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let settings: ScanSettings = serde_json::from_str(&content)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.lookback_days <= 0 {
            return Err(CrossoverError::InvalidSettings(format!(
                "lookback_days must be positive, got {}",
                self.lookback_days
            )));
        }
        if self.rolling_window_minutes <= 0 {
            return Err(CrossoverError::InvalidSettings(format!(
                "rolling_window_minutes must be positive, got {}",
                self.rolling_window_minutes
            )));
        }
        Ok(())
    }

    pub fn window_millis(&self) -> i64 {
        self.rolling_window_minutes * MILLIS_PER_MINUTE
    }
}
