// src/averager.rs

use std::collections::HashMap;
use std::fmt;

use chrono::{Duration, NaiveDate};
use polars::prelude::*;
use tracing::{debug, info};

use crate::config::ScanSettings;
use crate::error::{CrossoverError, Result};
use crate::records::{date_to_millis, DATE_COLUMN, STOCK_COLUMN, VOLUME_COLUMN};

const AVERAGE_COLUMN: &str = "average_volume";

/// Trailing average daily volume keyed by (target date, stock).
///
/// A stock with no daily record inside a date's lookback window has no entry
/// for that date; it is never reported as an average of zero.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AverageVolumeTable {
    dates: Vec<NaiveDate>,
    averages: HashMap<NaiveDate, Vec<(String, f64)>>,
    index: HashMap<NaiveDate, HashMap<String, f64>>,
}

impl AverageVolumeTable {
    pub fn get(&self, date: NaiveDate, stock: &str) -> Option<f64> {
        self.index.get(&date)?.get(stock).copied()
    }

    /// Per-stock averages for one date, in first-appearance order of the daily data.
    pub fn for_date(&self, date: NaiveDate) -> &[(String, f64)] {
        self.averages.get(&date).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Number of (date, stock) entries.
    pub fn len(&self) -> usize {
        self.averages.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Long-format frame: `target_date`, `stock`, `average_volume`.
    pub fn to_frame(&self) -> Result<DataFrame> {
        let mut target_dates = Vec::with_capacity(self.len());
        let mut stocks = Vec::with_capacity(self.len());
        let mut averages = Vec::with_capacity(self.len());

        for date in &self.dates {
            for (stock, average) in self.for_date(*date) {
                target_dates.push(date.format("%Y-%m-%d").to_string());
                stocks.push(stock.as_str());
                averages.push(*average);
            }
        }

        Ok(DataFrame::new(vec![
            Series::new("target_date", target_dates),
            Series::new(STOCK_COLUMN, stocks),
            Series::new(AVERAGE_COLUMN, averages),
        ])?)
    }

    fn insert(&mut self, date: NaiveDate, averages: Vec<(String, f64)>) -> Result<()> {
        if self.averages.contains_key(&date) {
            return Err(CrossoverError::DuplicateTargetDate(date));
        }
        self.dates.push(date);
        self.index.insert(date, averages.iter().cloned().collect());
        self.averages.insert(date, averages);
        Ok(())
    }
}

impl fmt::Display for AverageVolumeTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_frame() {
            Ok(df) => write!(f, "{}", df),
            Err(_) => write!(f, "AverageVolumeTable({} entries)", self.len()),
        }
    }
}

/// Computes the trailing average volume of every stock for every target date.
///
/// For a target date `T` only records with `T - lookback <= date < T` count;
/// `T` itself is excluded so the average never looks ahead. A date given twice
/// is rejected with [`CrossoverError::DuplicateTargetDate`].
pub fn compute_averages(
    daily: &DataFrame,
    target_dates: &[NaiveDate],
    settings: &ScanSettings,
) -> Result<AverageVolumeTable> {
    let mut table = AverageVolumeTable::default();

    for &target_date in target_dates {
        let window = LookbackFilter::new(daily, target_date, settings.lookback_days);
        let slice = window.filter()?;
        let averages = mean_volume_by_stock(&slice)?;

        debug!(
            %target_date,
            records = slice.height(),
            stocks = averages.len(),
            "computed trailing averages"
        );
        table.insert(target_date, averages)?;
    }

    info!("trailing average volume by target date:\n{}", table);
    Ok(table)
}

fn mean_volume_by_stock(slice: &DataFrame) -> Result<Vec<(String, f64)>> {
    if slice.height() == 0 {
        return Ok(Vec::new());
    }

    let grouped = slice
        .clone()
        .lazy()
        .group_by_stable([col(STOCK_COLUMN)])
        .agg([col(VOLUME_COLUMN).cast(DataType::Float64).mean().alias(AVERAGE_COLUMN)])
        .collect()?;

    let stocks = grouped.column(STOCK_COLUMN)?.str()?;
    let averages = grouped.column(AVERAGE_COLUMN)?.f64()?;

    Ok(stocks
        .into_iter()
        .zip(averages.into_iter())
        .filter_map(|(stock, average)| Some((stock?.to_string(), average?)))
        .collect())
}

/// Keeps the daily rows inside the half-open lookback window of one target date.
pub struct LookbackFilter<'a> {
    df: &'a DataFrame,
    target_date: NaiveDate,
    lookback_days: i64,
}

impl<'a> LookbackFilter<'a> {
    pub fn new(df: &'a DataFrame, target_date: NaiveDate, lookback_days: i64) -> Self {
        LookbackFilter { df, target_date, lookback_days }
    }

    /// Window bounds in epoch milliseconds, lower inclusive and upper exclusive.
    pub fn bounds_millis(&self) -> (i64, i64) {
        let start = self.target_date - Duration::days(self.lookback_days);
        (date_to_millis(start), date_to_millis(self.target_date))
    }

    pub fn filter(&self) -> Result<DataFrame> {
        let (start, end) = self.bounds_millis();

        let date_column = self.df.column(DATE_COLUMN)?.i64()?;
        let mask = date_column
            .into_iter()
            .map(|opt_date| opt_date.map(|date| date >= start && date < end).unwrap_or(false))
            .collect::<BooleanChunked>();

        Ok(self.df.filter(&mask)?)
    }
}
