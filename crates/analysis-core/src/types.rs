use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::AnalysisError;

/// One dated closing price (adjusted close when the source has it).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub price: f64,
}

impl PricePoint {
    pub fn new(date: NaiveDate, price: f64) -> Self {
        Self { date, price }
    }
}

/// Price history for a single ticker, strictly increasing by date.
///
/// Construction rejects non-finite or non-positive prices and out-of-order
/// dates, so everything downstream can assume a clean series. An empty series
/// is representable; the feature engine refuses it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceSeries {
    ticker: String,
    points: Vec<PricePoint>,
}

impl PriceSeries {
    pub fn new(ticker: impl Into<String>, points: Vec<PricePoint>) -> Result<Self, AnalysisError> {
        let ticker = ticker.into();

        for (i, point) in points.iter().enumerate() {
            if !point.price.is_finite() || point.price <= 0.0 {
                return Err(AnalysisError::InvalidData(format!(
                    "{}: price {} on {} is not a positive number",
                    ticker, point.price, point.date
                )));
            }
            if i > 0 && points[i - 1].date >= point.date {
                return Err(AnalysisError::InvalidData(format!(
                    "{}: dates must be strictly increasing ({} followed by {})",
                    ticker,
                    points[i - 1].date,
                    point.date
                )));
            }
        }

        Ok(Self { ticker, points })
    }

    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn prices(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.price).collect()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.points.first().map(|p| p.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.points.last().map(|p| p.date)
    }
}

/// Engineered features for one trading day.
///
/// Every value is computed from prices at or before `date`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureRow {
    #[serde(rename = "Date")]
    pub date: NaiveDate,
    #[serde(rename = "Price")]
    pub price: f64,
    #[serde(rename = "Returns")]
    pub returns: f64,
    #[serde(rename = "Log_Returns")]
    pub log_returns: f64,
    #[serde(rename = "Volatility")]
    pub volatility: f64,
    #[serde(rename = "SMA_50")]
    pub sma_50: f64,
    #[serde(rename = "SMA_200")]
    pub sma_200: f64,
    #[serde(rename = "Momentum_3M")]
    pub momentum_3m: f64,
    #[serde(rename = "Drawdown")]
    pub drawdown: f64,
    /// 1 when price is above SMA_200, else 0.
    #[serde(rename = "Trend")]
    pub trend: u8,
}

impl FeatureRow {
    /// Column order used for feature vectors handed to external models.
    pub const FEATURE_NAMES: [&'static str; 8] = [
        "Returns",
        "Log_Returns",
        "Volatility",
        "SMA_50",
        "SMA_200",
        "Momentum_3M",
        "Drawdown",
        "Trend",
    ];

    pub fn is_uptrend(&self) -> bool {
        self.trend == 1
    }

    /// Feature values in `FEATURE_NAMES` order.
    pub fn values(&self) -> [f64; 8] {
        [
            self.returns,
            self.log_returns,
            self.volatility,
            self.sma_50,
            self.sma_200,
            self.momentum_3m,
            self.drawdown,
            f64::from(self.trend),
        ]
    }

    pub fn to_named(&self) -> HashMap<String, f64> {
        Self::FEATURE_NAMES
            .iter()
            .zip(self.values())
            .map(|(name, value)| (name.to_string(), value))
            .collect()
    }
}

/// Feature rows for one ticker, warm-up prefix already dropped.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureTable {
    ticker: String,
    rows: Vec<FeatureRow>,
}

impl FeatureTable {
    pub fn new(ticker: impl Into<String>, rows: Vec<FeatureRow>) -> Self {
        Self {
            ticker: ticker.into(),
            rows,
        }
    }

    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    pub fn rows(&self) -> &[FeatureRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&FeatureRow> {
        self.rows.get(index)
    }

    pub fn last(&self) -> Option<&FeatureRow> {
        self.rows.last()
    }

    /// Rows `0..=index`: everything known at the close of `index`.
    pub fn history(&self, index: usize) -> &[FeatureRow] {
        let end = (index + 1).min(self.rows.len());
        &self.rows[..end]
    }

    pub fn position_of(&self, date: NaiveDate) -> Option<usize> {
        self.rows.binary_search_by(|row| row.date.cmp(&date)).ok()
    }
}

/// Market regime classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Regime {
    /// Calm market, price above its 200-day average
    Bullish,

    /// Calm market, price at or below its 200-day average
    Bearish,

    /// Annualized volatility above the high-volatility threshold
    #[serde(rename = "High Volatility")]
    HighVolatility,

    /// Annualized volatility above the crash threshold
    Crash,
}

impl Regime {
    pub const ALL: [Regime; 4] = [
        Regime::Bullish,
        Regime::Bearish,
        Regime::HighVolatility,
        Regime::Crash,
    ];

    /// Get human-readable name
    pub fn name(&self) -> &'static str {
        match self {
            Regime::Bullish => "Bullish",
            Regime::Bearish => "Bearish",
            Regime::HighVolatility => "High Volatility",
            Regime::Crash => "Crash",
        }
    }
}

impl fmt::Display for Regime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Regime {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Regime::ALL
            .into_iter()
            .find(|r| r.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| AnalysisError::InvalidData(format!("unknown regime label '{}'", s)))
    }
}

/// Portfolio weights over the fixed Equity / Bonds / Cash triple.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Allocation {
    #[serde(rename = "Equity")]
    pub equity: f64,
    #[serde(rename = "Bonds")]
    pub bonds: f64,
    #[serde(rename = "Cash")]
    pub cash: f64,
}

impl Allocation {
    /// Sets the risk-asset weights; cash absorbs the remainder.
    pub fn from_risk_weights(equity: f64, bonds: f64) -> Self {
        Self {
            equity,
            bonds,
            cash: 1.0 - (equity + bonds),
        }
    }

    pub fn all_cash() -> Self {
        Self::from_risk_weights(0.0, 0.0)
    }

    pub fn risk_weight(&self) -> f64 {
        self.equity + self.bonds
    }

    pub fn total(&self) -> f64 {
        self.equity + self.bonds + self.cash
    }

    /// True when every weight is non-negative and the total is 1 within `tolerance`.
    pub fn is_valid(&self, tolerance: f64) -> bool {
        self.equity >= -tolerance
            && self.bonds >= -tolerance
            && self.cash >= -tolerance
            && (self.total() - 1.0).abs() <= tolerance
    }
}

/// One simulated day of the strategy trace.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResultRow {
    #[serde(rename = "Date")]
    pub date: NaiveDate,
    #[serde(rename = "Value")]
    pub value: f64,
    /// Regime decided on the previous trading day.
    #[serde(rename = "Regime")]
    pub regime: Regime,
    #[serde(rename = "Equity_Weight")]
    pub equity_weight: f64,
    #[serde(rename = "Bonds_Weight")]
    pub bonds_weight: f64,
    #[serde(rename = "Cash_Weight")]
    pub cash_weight: f64,
}

impl ResultRow {
    pub fn allocation(&self) -> Allocation {
        Allocation {
            equity: self.equity_weight,
            bonds: self.bonds_weight,
            cash: self.cash_weight,
        }
    }
}

/// Summary statistics of a completed value series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    #[serde(rename = "CAGR")]
    pub cagr: f64,
    #[serde(rename = "Volatility")]
    pub volatility: f64,
    #[serde(rename = "Sharpe Ratio")]
    pub sharpe_ratio: f64,
    #[serde(rename = "Max Drawdown")]
    pub max_drawdown: f64,
}

impl Metrics {
    /// Replace non-finite values with `None` so the record survives JSON.
    pub fn sanitized(&self) -> SanitizedMetrics {
        SanitizedMetrics {
            cagr: finite_or_none(self.cagr),
            volatility: finite_or_none(self.volatility),
            sharpe_ratio: finite_or_none(self.sharpe_ratio),
            max_drawdown: finite_or_none(self.max_drawdown),
        }
    }
}

/// Wire form of [`Metrics`]: NaN and infinities become `null`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SanitizedMetrics {
    #[serde(rename = "CAGR")]
    pub cagr: Option<f64>,
    #[serde(rename = "Volatility")]
    pub volatility: Option<f64>,
    #[serde(rename = "Sharpe Ratio")]
    pub sharpe_ratio: Option<f64>,
    #[serde(rename = "Max Drawdown")]
    pub max_drawdown: Option<f64>,
}

pub fn finite_or_none(value: f64) -> Option<f64> {
    if value.is_finite() {
        Some(value)
    } else {
        None
    }
}
