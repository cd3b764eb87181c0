//! Daily prices from CSV exports (e.g. a Yahoo Finance download).

use std::io::{self, Read};
use std::path::{Path, PathBuf};

use analysis_core::{AnalysisError, PricePoint, PriceSeries, PriceSource};
use async_trait::async_trait;
use chrono::NaiveDate;
use tracing::debug;

const DATE_COLUMN: &str = "Date";
/// Price columns in order of preference.
const PRICE_COLUMNS: [&str; 2] = ["Adj Close", "Close"];

/// Reads `<TICKER>.csv` from a directory, or one CSV file for any ticker.
#[derive(Debug, Clone)]
pub struct CsvPriceSource {
    path: PathBuf,
}

impl CsvPriceSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn file_for(&self, ticker: &str) -> PathBuf {
        if self.path.is_dir() {
            self.path.join(format!("{}.csv", ticker.to_uppercase()))
        } else {
            self.path.clone()
        }
    }
}

#[async_trait]
impl PriceSource for CsvPriceSource {
    async fn fetch_prices(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceSeries, AnalysisError> {
        let file = self.file_for(ticker);
        let bytes = match tokio::fs::read(&file).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("{}: no price file at {}", ticker, file.display());
                return Err(AnalysisError::DataUnavailable {
                    ticker: ticker.to_string(),
                    start,
                    end,
                });
            }
            Err(e) => return Err(read_error(&file, e)),
        };

        parse_prices(bytes.as_slice(), ticker, start, end)
    }
}

fn read_error(file: &Path, e: impl std::fmt::Display) -> AnalysisError {
    AnalysisError::InvalidData(format!("{}: {}", file.display(), e))
}

/// Parse a price CSV and keep rows dated within `start..=end`.
///
/// Rows with a blank or non-numeric price are dropped. Rows are sorted by
/// date and a repeated date keeps its last price.
pub fn parse_prices<R: Read>(
    reader: R,
    ticker: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<PriceSeries, AnalysisError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers = reader
        .headers()
        .map_err(|e| AnalysisError::InvalidData(format!("{}: unreadable header: {}", ticker, e)))?
        .clone();
    let column = |name: &str| headers.iter().position(|h| h.trim().eq_ignore_ascii_case(name));

    let date_idx = column(DATE_COLUMN).ok_or_else(|| {
        AnalysisError::InvalidData(format!("{}: missing '{}' column", ticker, DATE_COLUMN))
    })?;
    let price_idx = PRICE_COLUMNS
        .iter()
        .find_map(|name| column(*name))
        .ok_or_else(|| {
            AnalysisError::InvalidData(format!(
                "{}: missing price column (expected one of {:?})",
                ticker, PRICE_COLUMNS
            ))
        })?;

    let mut points = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| AnalysisError::InvalidData(format!("{}: {}", ticker, e)))?;

        let Some(date) = record.get(date_idx).and_then(parse_date) else {
            continue;
        };
        if date < start || date > end {
            continue;
        }
        let Some(price) = record
            .get(price_idx)
            .and_then(|v| v.trim().parse::<f64>().ok())
            .filter(|p| p.is_finite())
        else {
            continue;
        };

        points.push(PricePoint::new(date, price));
    }

    points.sort_by_key(|p| p.date);
    // Keep the last row for a repeated date.
    points.reverse();
    points.dedup_by_key(|p| p.date);
    points.reverse();

    if points.is_empty() {
        return Err(AnalysisError::DataUnavailable {
            ticker: ticker.to_string(),
            start,
            end,
        });
    }

    debug!("{}: loaded {} prices", ticker, points.len());
    PriceSeries::new(ticker, points)
}

/// Accepts `YYYY-MM-DD`, optionally followed by a time component.
fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    let day = raw.get(..10).unwrap_or(raw);
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}
