// src/records.rs

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

pub const DATE_COLUMN: &str = "date";
pub const STOCK_COLUMN: &str = "stock";
pub const VOLUME_COLUMN: &str = "volume";
pub const TIMESTAMP_COLUMN: &str = "timestamp";
pub const QUANTITY_COLUMN: &str = "quantity";

/// One trading day of volume for one stock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyRecord {
    pub date: NaiveDate,
    pub stock: String,
    pub volume: f64,
}

impl DailyRecord {
    pub fn new(date: NaiveDate, stock: &str, volume: f64) -> Self {
        DailyRecord {
            date,
            stock: stock.to_string(),
            volume,
        }
    }
}

/// A single intraday trade print.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntradayTick {
    pub timestamp: NaiveDateTime,
    pub stock: String,
    pub quantity: f64,
}

impl IntradayTick {
    pub fn new(timestamp: NaiveDateTime, stock: &str, quantity: f64) -> Self {
        IntradayTick {
            timestamp,
            stock: stock.to_string(),
            quantity,
        }
    }
}

/// First moment a stock's rolling volume exceeded its trailing average on a date.
/// `first_crossover` is `None` when no crossover happened or no average existed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossoverResult {
    pub stock: String,
    pub target_date: NaiveDate,
    pub first_crossover: Option<NaiveDateTime>,
}

pub fn date_to_millis(date: NaiveDate) -> i64 {
    datetime_to_millis(date.and_time(chrono::NaiveTime::MIN))
}

pub fn datetime_to_millis(timestamp: NaiveDateTime) -> i64 {
    timestamp.and_utc().timestamp_millis()
}

pub fn millis_to_datetime(millis: i64) -> Option<NaiveDateTime> {
    DateTime::from_timestamp_millis(millis).map(|dt| dt.naive_utc())
}

/// Builds a canonical daily frame (`date`, `stock`, `volume`).
pub fn daily_frame(records: &[DailyRecord]) -> Result<DataFrame, PolarsError> {
    let dates: Vec<i64> = records.iter().map(|r| date_to_millis(r.date)).collect();
    let stocks: Vec<&str> = records.iter().map(|r| r.stock.as_str()).collect();
    let volumes: Vec<f64> = records.iter().map(|r| r.volume).collect();

    DataFrame::new(vec![
        Series::new(DATE_COLUMN, dates),
        Series::new(STOCK_COLUMN, stocks),
        Series::new(VOLUME_COLUMN, volumes),
    ])
}

/// Builds a canonical intraday frame (`timestamp`, `stock`, `quantity`).
pub fn intraday_frame(ticks: &[IntradayTick]) -> Result<DataFrame, PolarsError> {
    let timestamps: Vec<i64> = ticks.iter().map(|t| datetime_to_millis(t.timestamp)).collect();
    let stocks: Vec<&str> = ticks.iter().map(|t| t.stock.as_str()).collect();
    let quantities: Vec<f64> = ticks.iter().map(|t| t.quantity).collect();

    DataFrame::new(vec![
        Series::new(TIMESTAMP_COLUMN, timestamps),
        Series::new(STOCK_COLUMN, stocks),
        Series::new(QUANTITY_COLUMN, quantities),
    ])
}
