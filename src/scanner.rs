// src/scanner.rs

use std::collections::{HashMap, VecDeque};

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use polars::prelude::*;
use rayon::prelude::*;
use tracing::debug;

use crate::averager::AverageVolumeTable;
use crate::config::{ScanSettings, MILLIS_PER_DAY};
use crate::error::Result;
use crate::records::{
    date_to_millis, datetime_to_millis, millis_to_datetime, CrossoverResult, QUANTITY_COLUMN,
    STOCK_COLUMN, TIMESTAMP_COLUMN,
};

/// Finds, per stock, the first tick whose trailing rolling volume is strictly
/// greater than the stock's average for `target_date`.
///
/// Every stock present in the session-filtered ticks gets a row, in order of
/// first appearance; `first_crossover` is `None` when there is no crossover or
/// the stock has no average for the date.
pub fn find_crossovers(
    ticks: &DataFrame,
    averages: &AverageVolumeTable,
    target_date: NaiveDate,
    settings: &ScanSettings,
) -> Result<Vec<CrossoverResult>> {
    let session = SessionFilter::new(ticks, target_date, settings.market_open);
    let filtered = session.filter()?;
    let partitions = partition_by_stock(&filtered)?;
    let window_millis = settings.window_millis();

    let results = partitions
        .into_par_iter()
        .map(|(stock, series)| {
            let first_crossover = match averages.get(target_date, &stock) {
                Some(average) => first_crossing(series, average, window_millis),
                None => {
                    debug!(%stock, %target_date, "no trailing average, skipping scan");
                    None
                }
            };
            CrossoverResult { stock, target_date, first_crossover }
        })
        .collect();

    Ok(results)
}

/// Keeps ticks on the target calendar date at or after the market open.
pub struct SessionFilter<'a> {
    df: &'a DataFrame,
    target_date: NaiveDate,
    market_open: NaiveTime,
}

impl<'a> SessionFilter<'a> {
    pub fn new(df: &'a DataFrame, target_date: NaiveDate, market_open: NaiveTime) -> Self {
        SessionFilter { df, target_date, market_open }
    }

    /// Session bounds in epoch milliseconds: from the open (inclusive) to the
    /// following midnight (exclusive).
    pub fn session_millis(&self) -> (i64, i64) {
        let open = datetime_to_millis(NaiveDateTime::new(self.target_date, self.market_open));
        let end_of_day = date_to_millis(self.target_date) + MILLIS_PER_DAY;
        (open, end_of_day)
    }

    pub fn filter(&self) -> Result<DataFrame> {
        let (start_ts, end_ts) = self.session_millis();

        let time_column = self.df.column(TIMESTAMP_COLUMN)?.i64()?;
        let mask = time_column
            .into_iter()
            .map(|opt_time| opt_time.map(|time| time >= start_ts && time < end_ts).unwrap_or(false))
            .collect::<BooleanChunked>();

        Ok(self.df.filter(&mask)?)
    }
}

/// Splits ticks into per-stock `(timestamp, quantity)` series, keeping the
/// order in which stocks first appear.
fn partition_by_stock(df: &DataFrame) -> Result<Vec<(String, Vec<(i64, f64)>)>> {
    let stocks = df.column(STOCK_COLUMN)?.str()?;
    let timestamps = df.column(TIMESTAMP_COLUMN)?.i64()?;
    let quantities = df.column(QUANTITY_COLUMN)?.cast(&DataType::Float64)?;
    let quantities = quantities.f64()?;

    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut partitions: Vec<(String, Vec<(i64, f64)>)> = Vec::new();

    for ((stock, timestamp), quantity) in stocks.into_iter().zip(timestamps).zip(quantities) {
        let (Some(stock), Some(timestamp)) = (stock, timestamp) else {
            continue;
        };
        let slot = *index.entry(stock).or_insert_with(|| {
            partitions.push((stock.to_string(), Vec::new()));
            partitions.len() - 1
        });
        partitions[slot].1.push((timestamp, quantity.unwrap_or_default()));
    }

    Ok(partitions)
}

fn first_crossing(mut series: Vec<(i64, f64)>, average: f64, window_millis: i64) -> Option<NaiveDateTime> {
    series.sort_by_key(|(timestamp, _)| *timestamp);

    let mut rolling = RollingVolume::new(window_millis);
    series
        .into_iter()
        .find(|&(timestamp, quantity)| rolling.push(timestamp, quantity) > average)
        .and_then(|(timestamp, _)| millis_to_datetime(timestamp))
}

/// Sum of quantities over a trailing time span.
///
/// A tick at `t` covers everything with `t - window < timestamp <= t`; ticks
/// must be pushed in ascending timestamp order.
#[derive(Debug)]
pub struct RollingVolume {
    window_millis: i64,
    ticks: VecDeque<(i64, f64)>,
    sum: f64,
}

impl RollingVolume {
    pub fn new(window_millis: i64) -> Self {
        RollingVolume {
            window_millis,
            ticks: VecDeque::new(),
            sum: 0.0,
        }
    }

    /// Adds a tick and returns the rolling sum at its timestamp.
    ///
    /// The sum is rebuilt from the ticks still in the window, so it never
    /// carries rounding residue from expired quantities.
    pub fn push(&mut self, timestamp: i64, quantity: f64) -> f64 {
        self.ticks.push_back((timestamp, quantity));

        let cutoff = timestamp - self.window_millis;
        while let Some(&(oldest, _)) = self.ticks.front() {
            if oldest > cutoff {
                break;
            }
            self.ticks.pop_front();
        }

        self.sum = self.ticks.iter().map(|(_, quantity)| quantity).sum();
        self.sum
    }

    pub fn sum(&self) -> f64 {
        self.sum
    }

    pub fn len(&self) -> usize {
        self.ticks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ticks.is_empty()
    }
}
