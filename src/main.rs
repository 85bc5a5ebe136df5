//! Volume crossover screener.
//!
//! Reads a daily volume history plus one intraday tick file per target date and
//! writes the first rolling-volume crossover of every stock.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;
use volume_crossover::config::DEFAULT_OUTPUT_FILE;
use volume_crossover::loader::parse_target_date;
use volume_crossover::{
    results_frame, results_json, write_results_csv, CrossoverPipeline, DailyCsv, IntradayCsv, ScanSettings,
};

#[derive(Parser)]
#[command(name = "volume-crossover")]
#[command(version, about = "First intraday crossover of rolling volume over the trailing average")]
struct Cli {
    /// Daily volume CSV (Date, Stock Name, Volume)
    #[arg(long)]
    historical: PathBuf,

    /// Target date; repeat once per intraday file, in the same order
    #[arg(short, long = "date", required = true)]
    dates: Vec<String>,

    /// Intraday tick CSV (Date, Time, Stock Name, Last Traded Quantity)
    #[arg(short, long = "intraday", required = true)]
    intraday: Vec<PathBuf>,

    /// Output CSV path
    #[arg(short, long, default_value = DEFAULT_OUTPUT_FILE)]
    output: PathBuf,

    /// JSON file overriding lookback, window and market open
    #[arg(short, long)]
    settings: Option<PathBuf>,

    /// Also print the results as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging()?;

    if cli.dates.len() != cli.intraday.len() {
        bail!(
            "got {} --date values but {} --intraday files",
            cli.dates.len(),
            cli.intraday.len()
        );
    }

    let settings = match &cli.settings {
        Some(path) => ScanSettings::from_json_file(path)
            .with_context(|| format!("Failed to load settings: {}", path.display()))?,
        None => ScanSettings::default(),
    };

    let target_dates = cli
        .dates
        .iter()
        .map(|date| parse_target_date(date))
        .collect::<volume_crossover::Result<Vec<_>>>()
        .context("Invalid --date value")?;

    let historical = DailyCsv::new(&cli.historical);
    let intraday: Vec<IntradayCsv> = cli.intraday.iter().map(IntradayCsv::new).collect();

    info!(
        dates = target_dates.len(),
        lookback_days = settings.lookback_days,
        window_minutes = settings.rolling_window_minutes,
        market_open = %settings.market_open,
        "starting crossover scan"
    );

    let pipeline = CrossoverPipeline::new(settings);
    let results = pipeline
        .run(&historical, &target_dates, &intraday)
        .context("Crossover scan failed")?;

    info!("crossover results:\n{}", results_frame(&results)?);

    write_results_csv(&results, &cli.output)
        .with_context(|| format!("Failed to write results: {}", cli.output.display()))?;

    if cli.json {
        println!("{}", results_json(&results)?);
    }

    Ok(())
}

fn init_logging() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("volume_crossover=info")),
        )
        .with_target(true)
        .init();
    Ok(())
}
