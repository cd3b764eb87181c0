use chrono::NaiveDate;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Missing feature: {0}")]
    MissingFeature(String),

    #[error("No price data for {ticker} between {start} and {end}")]
    DataUnavailable {
        ticker: String,
        start: NaiveDate,
        end: NaiveDate,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
