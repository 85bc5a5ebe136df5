// src/error.rs

use chrono::NaiveDate;
use polars::prelude::PolarsError;
use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum CrossoverError {
    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Settings error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid settings: {0}")]
    InvalidSettings(String),

    #[error("Missing column '{0}'")]
    MissingColumn(String),

    #[error("Malformed date '{value}' at row {row}")]
    MalformedDate { row: usize, value: String },

    #[error("Malformed time '{value}' at row {row}")]
    MalformedTime { row: usize, value: String },

    #[error("Missing stock name at row {row}")]
    MalformedStock { row: usize },

    #[error("Malformed number '{value}' at row {row}")]
    MalformedNumber { row: usize, value: String },

    #[error("No target dates given")]
    EmptyTargetDates,

    #[error("Target date {0} given more than once")]
    DuplicateTargetDate(NaiveDate),

    #[error("{dates} target dates but {sources} intraday sources")]
    MismatchedSources { dates: usize, sources: usize },
}

pub type Result<T> = std::result::Result<T, CrossoverError>;
