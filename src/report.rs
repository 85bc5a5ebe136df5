// src/report.rs

use std::fs::File;
use std::path::Path;

use polars::prelude::*;
use tracing::info;

use crate::error::Result;
use crate::records::CrossoverResult;

pub const STOCK_HEADER: &str = "Stock Name";
pub const DATE_HEADER: &str = "Date";
pub const CROSSOVER_HEADER: &str = "First Crossover Timestamp";

/// Output table; the crossover column is null where no crossover was found.
pub fn results_frame(results: &[CrossoverResult]) -> Result<DataFrame> {
    let stocks: Vec<&str> = results.iter().map(|r| r.stock.as_str()).collect();
    let dates: Vec<String> = results
        .iter()
        .map(|r| r.target_date.format("%Y-%m-%d").to_string())
        .collect();
    let crossovers: Vec<Option<String>> = results
        .iter()
        .map(|r| r.first_crossover.map(|ts| ts.format("%Y-%m-%d %H:%M:%S").to_string()))
        .collect();

    Ok(DataFrame::new(vec![
        Series::new(STOCK_HEADER, stocks),
        Series::new(DATE_HEADER, dates),
        Series::new(CROSSOVER_HEADER, crossovers),
    ])?)
}

pub fn write_results_csv<P: AsRef<Path>>(results: &[CrossoverResult], path: P) -> Result<()> {
    let path = path.as_ref();
    let mut df = results_frame(results)?;
    let mut file = File::create(path)?;

    CsvWriter::new(&mut file).include_header(true).finish(&mut df)?;

    info!(path = %path.display(), rows = df.height(), "wrote crossover results");
    Ok(())
}

pub fn results_json(results: &[CrossoverResult]) -> Result<String> {
    Ok(serde_json::to_string_pretty(results)?)
}
