// src/pipeline.rs

use std::collections::HashSet;

use chrono::NaiveDate;
use polars::prelude::DataFrame;
use tracing::{info, warn};

use crate::averager::{compute_averages, AverageVolumeTable};
use crate::config::ScanSettings;
use crate::error::{CrossoverError, Result};
use crate::loader::TableSource;
use crate::records::CrossoverResult;
use crate::scanner::find_crossovers;

/// Runs the averaging step once and the crossover scan once per target date.
pub struct CrossoverPipeline {
    settings: ScanSettings,
}

impl Default for CrossoverPipeline {
    fn default() -> Self {
        CrossoverPipeline::new(ScanSettings::default())
    }
}

impl CrossoverPipeline {
    pub fn new(settings: ScanSettings) -> Self {
        CrossoverPipeline { settings }
    }

    pub fn settings(&self) -> &ScanSettings {
        &self.settings
    }

    /// `target_dates` and `intraday_sources` are paired by position. Input shape
    /// is checked before any source is loaded, so a bad call produces no output.
    pub fn run<H, I>(
        &self,
        historical: &H,
        target_dates: &[NaiveDate],
        intraday_sources: &[I],
    ) -> Result<Vec<CrossoverResult>>
    where
        H: TableSource + ?Sized,
        I: TableSource,
    {
        self.settings.validate()?;
        validate_targets(target_dates, intraday_sources.len())?;

        let daily = historical.load()?;
        let averages = compute_averages(&daily, target_dates, &self.settings)?;

        let mut all_results = Vec::new();
        for (&target_date, source) in target_dates.iter().zip(intraday_sources) {
            let ticks = source.load()?;
            let results = self.scan_date(&ticks, &averages, target_date)?;
            all_results.extend(results);
        }

        Ok(all_results)
    }

    fn scan_date(
        &self,
        ticks: &DataFrame,
        averages: &AverageVolumeTable,
        target_date: NaiveDate,
    ) -> Result<Vec<CrossoverResult>> {
        if averages.for_date(target_date).is_empty() {
            warn!(%target_date, "no trailing averages for date; every stock will report no crossover");
        }

        let results = find_crossovers(ticks, averages, target_date, &self.settings)?;
        let crossed = results.iter().filter(|r| r.first_crossover.is_some()).count();
        info!(
            %target_date,
            ticks = ticks.height(),
            stocks = results.len(),
            crossed,
            "scanned intraday volume"
        );
        Ok(results)
    }
}

fn validate_targets(target_dates: &[NaiveDate], sources: usize) -> Result<()> {
    if target_dates.is_empty() {
        return Err(CrossoverError::EmptyTargetDates);
    }
    if target_dates.len() != sources {
        return Err(CrossoverError::MismatchedSources {
            dates: target_dates.len(),
            sources,
        });
    }

    let mut seen = HashSet::new();
    for date in target_dates {
        if !seen.insert(*date) {
            return Err(CrossoverError::DuplicateTargetDate(*date));
        }
    }
    Ok(())
}
