// src/loader.rs

use std::io::Cursor;
use std::path::{Path, PathBuf};

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use polars::prelude::*;
use tracing::debug;

use crate::error::{CrossoverError, Result};
use crate::records::{
    date_to_millis, datetime_to_millis, DATE_COLUMN, QUANTITY_COLUMN, STOCK_COLUMN, TIMESTAMP_COLUMN,
    VOLUME_COLUMN,
};

const TIME_COLUMN: &str = "time";

/// ISO first, then the day-before-month layouts exported by the data vendor.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d-%m-%Y", "%d/%m/%Y", "%d-%b-%Y", "%d %b %Y"];
/// Tick files carry month-first dates.
const TICK_DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%m-%d-%Y", "%d-%b-%Y", "%d %b %Y"];
const TIME_FORMATS: &[&str] = &["%H:%M:%S", "%H:%M:%S%.f", "%H:%M"];

/// Anything that can hand over a canonical table.
pub trait TableSource {
    fn load(&self) -> Result<DataFrame>;
}

/// Daily volume CSV (`Date`, `Stock Name`, `Volume`).
pub struct DailyCsv {
    pub path: PathBuf,
}

impl DailyCsv {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        DailyCsv { path: path.into() }
    }
}

impl TableSource for DailyCsv {
    fn load(&self) -> Result<DataFrame> {
        read_daily_csv(&self.path)
    }
}

/// Intraday tick CSV (`Date`, `Time`, `Stock Name`, `Last Traded Quantity`).
pub struct IntradayCsv {
    pub path: PathBuf,
}

impl IntradayCsv {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        IntradayCsv { path: path.into() }
    }
}

impl TableSource for IntradayCsv {
    fn load(&self) -> Result<DataFrame> {
        read_intraday_csv(&self.path)
    }
}

/// Frames already in canonical layout.
impl TableSource for DataFrame {
    fn load(&self) -> Result<DataFrame> {
        Ok(self.clone())
    }
}

pub fn read_daily_csv<P: AsRef<Path>>(path: P) -> Result<DataFrame> {
    let path = path.as_ref();
    debug!(path = %path.display(), "reading daily volume file");
    parse_daily_csv(std::fs::read_to_string(path)?)
}

pub fn read_intraday_csv<P: AsRef<Path>>(path: P) -> Result<DataFrame> {
    let path = path.as_ref();
    debug!(path = %path.display(), "reading intraday tick file");
    parse_intraday_csv(std::fs::read_to_string(path)?)
}

/// Parses daily CSV content into `date`, `stock`, `volume`.
pub fn parse_daily_csv(content: String) -> Result<DataFrame> {
    let raw = RawFrameBuilder::from_csv(content)?;

    let dates = RawFrameBuilder::string_column(&raw, DATE_COLUMN)?
        .into_iter()
        .enumerate()
        .map(|(i, value)| {
            let value = value.unwrap_or_default();
            parse_date(value)
                .map(date_to_millis)
                .ok_or_else(|| CrossoverError::MalformedDate { row: i + 1, value: value.to_string() })
        })
        .collect::<Result<Vec<i64>>>()?;

    let stocks = RawFrameBuilder::stock_names(&raw)?;
    let volumes = RawFrameBuilder::numbers(&raw, VOLUME_COLUMN)?;

    Ok(DataFrame::new(vec![
        Series::new(DATE_COLUMN, dates),
        Series::new(STOCK_COLUMN, stocks),
        Series::new(VOLUME_COLUMN, volumes),
    ])?)
}

/// Parses intraday CSV content into `timestamp`, `stock`, `quantity`.
pub fn parse_intraday_csv(content: String) -> Result<DataFrame> {
    let raw = RawFrameBuilder::from_csv(content)?;

    let dates = RawFrameBuilder::string_column(&raw, DATE_COLUMN)?;
    let times = RawFrameBuilder::string_column(&raw, TIME_COLUMN)?;

    let timestamps = dates
        .into_iter()
        .zip(times.into_iter())
        .enumerate()
        .map(|(i, (date, time))| -> Result<i64> {
            let date = date.unwrap_or_default();
            let time = time.unwrap_or_default();
            let date = parse_tick_date(date)
                .ok_or_else(|| CrossoverError::MalformedDate { row: i + 1, value: date.to_string() })?;
            let time = parse_time(time)
                .ok_or_else(|| CrossoverError::MalformedTime { row: i + 1, value: time.to_string() })?;
            Ok(datetime_to_millis(NaiveDateTime::new(date, time)))
        })
        .collect::<Result<Vec<i64>>>()?;

    let stocks = RawFrameBuilder::stock_names(&raw)?;
    let quantities = RawFrameBuilder::numbers(&raw, QUANTITY_COLUMN)?;

    Ok(DataFrame::new(vec![
        Series::new(TIMESTAMP_COLUMN, timestamps),
        Series::new(STOCK_COLUMN, stocks),
        Series::new(QUANTITY_COLUMN, quantities),
    ])?)
}

/// Daily-file date: ISO or day-first.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    parse_with(value, DATE_FORMATS)
}

/// Intraday-file date: ISO or month-first.
pub fn parse_tick_date(value: &str) -> Option<NaiveDate> {
    parse_with(value, TICK_DATE_FORMATS)
}

fn parse_with(value: &str, formats: &[&str]) -> Option<NaiveDate> {
    let value = value.trim();
    formats
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
}

pub fn parse_time(value: &str) -> Option<NaiveTime> {
    let value = value.trim();
    TIME_FORMATS
        .iter()
        .find_map(|format| NaiveTime::parse_from_str(value, format).ok())
}

/// Parses a user-supplied target date, ISO or day-first.
pub fn parse_target_date(value: &str) -> Result<NaiveDate> {
    parse_date(value).ok_or_else(|| CrossoverError::MalformedDate { row: 0, value: value.to_string() })
}

/// Reads CSV text as untyped string columns and maps vendor headers to canonical names.
struct RawFrameBuilder;

impl RawFrameBuilder {
    const MAPPING: &'static [(&'static str, &'static str)] = &[
        ("date", DATE_COLUMN),
        ("time", TIME_COLUMN),
        ("stock name", STOCK_COLUMN),
        ("stock", STOCK_COLUMN),
        ("volume", VOLUME_COLUMN),
        ("last traded quantity", QUANTITY_COLUMN),
    ];

    fn from_csv(content: String) -> Result<DataFrame> {
        let mut df = CsvReader::new(Cursor::new(content.into_bytes()))
            .has_header(true)
            .infer_schema(Some(0))
            .finish()?;
        Self::rename_columns(&mut df)?;
        Ok(df)
    }

    fn rename_columns(df: &mut DataFrame) -> Result<()> {
        let names: Vec<String> = df.get_column_names().iter().map(|name| name.to_string()).collect();
        for name in names {
            let key = name.trim().to_lowercase();
            if let Some((_, canonical)) = Self::MAPPING.iter().find(|(alias, _)| *alias == key) {
                if name != *canonical {
                    df.rename(&name, canonical)?;
                }
            }
        }
        Ok(())
    }

    fn string_column<'a>(df: &'a DataFrame, name: &str) -> Result<&'a StringChunked> {
        let column = df
            .column(name)
            .map_err(|_| CrossoverError::MissingColumn(name.to_string()))?;
        Ok(column.str()?)
    }

    fn stock_names(df: &DataFrame) -> Result<Vec<String>> {
        Self::string_column(df, STOCK_COLUMN)?
            .into_iter()
            .enumerate()
            .map(|(i, stock)| {
                let stock = stock.unwrap_or_default().trim();
                if stock.is_empty() {
                    return Err(CrossoverError::MalformedStock { row: i + 1 });
                }
                Ok(stock.to_string())
            })
            .collect()
    }

    fn numbers(df: &DataFrame, name: &str) -> Result<Vec<f64>> {
        Self::string_column(df, name)?
            .into_iter()
            .enumerate()
            .map(|(i, value)| {
                let value = value.unwrap_or_default();
                parse_quantity(value)
                    .ok_or_else(|| CrossoverError::MalformedNumber { row: i + 1, value: value.to_string() })
            })
            .collect()
    }
}

/// Non-negative decimal, thousands separators allowed.
fn parse_quantity(value: &str) -> Option<f64> {
    let cleaned: String = value.trim().chars().filter(|c| *c != ',').collect();
    cleaned
        .parse::<f64>()
        .ok()
        .filter(|number| number.is_finite() && *number >= 0.0)
}
