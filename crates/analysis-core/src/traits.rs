use async_trait::async_trait;
use chrono::NaiveDate;

use crate::{AnalysisError, Allocation, Metrics, PriceSeries, Regime};

/// Supplies cleaned daily prices for one ticker.
///
/// Implementations return `AnalysisError::DataUnavailable` when nothing
/// exists for the range; callers never substitute synthetic data.
#[async_trait]
pub trait PriceSource: Send + Sync {
    async fn fetch_prices(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceSeries, AnalysisError>;
}

/// Turns the latest decision into free text. The result is opaque to the engine.
#[async_trait]
pub trait ExplanationProvider: Send + Sync {
    async fn explain(
        &self,
        regime: Regime,
        allocation: &Allocation,
        metrics: Option<&Metrics>,
    ) -> String;
}
