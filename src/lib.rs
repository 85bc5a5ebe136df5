// src/lib.rs

pub mod averager;
pub mod config;
pub mod error;
pub mod loader;
pub mod pipeline;
pub mod records;
pub mod report;
pub mod scanner;

pub use averager::{compute_averages, AverageVolumeTable, LookbackFilter};
pub use config::ScanSettings;
pub use error::{CrossoverError, Result};
pub use loader::{DailyCsv, IntradayCsv, TableSource};
pub use pipeline::CrossoverPipeline;
pub use records::{daily_frame, intraday_frame, CrossoverResult, DailyRecord, IntradayTick};
pub use report::{results_frame, results_json, write_results_csv};
pub use scanner::{find_crossovers, RollingVolume, SessionFilter};
