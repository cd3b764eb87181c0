use analysis_core::{ExplanationProvider, Metrics, ResultRow, SanitizedMetrics};
use chrono::NaiveDate;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::explain::explain_run;
use crate::metrics::regime_shares;
use crate::models::*;

/// Wire form of a [`StressTestResult`]; non-finite numbers become `null`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StressTestSummary {
    pub drop_pct: f64,
    pub shock_index: usize,
    pub shock_date: Option<NaiveDate>,
    pub protected_final_value: Option<f64>,
    pub unprotected_final_value: Option<f64>,
    pub capital_preserved: Option<f64>,
    #[serde(serialize_with = "metrics_or_empty")]
    pub metrics_protected: Option<SanitizedMetrics>,
    #[serde(serialize_with = "metrics_or_empty")]
    pub metrics_unprotected: Option<SanitizedMetrics>,
}

impl From<&StressTestResult> for StressTestSummary {
    fn from(result: &StressTestResult) -> Self {
        Self {
            drop_pct: result.scenario.drop_pct,
            shock_index: result.shock_index,
            shock_date: result.shock_date,
            protected_final_value: result.protected_final_value(),
            unprotected_final_value: result.unprotected_final_value(),
            capital_preserved: result.capital_preserved(),
            metrics_protected: sanitize(result.protected.metrics.as_ref()),
            metrics_unprotected: sanitize(result.unprotected.metrics.as_ref()),
        }
    }
}

/// Everything a caller needs to render a strategy-vs-benchmark backtest.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BacktestReport {
    pub ticker: String,
    #[serde(serialize_with = "metrics_or_empty")]
    pub metrics_strategy: Option<SanitizedMetrics>,
    #[serde(serialize_with = "metrics_or_empty")]
    pub metrics_benchmark: Option<SanitizedMetrics>,
    pub data_strategy: Vec<ResultRow>,
    pub data_benchmark: Vec<ResultRow>,
    pub explanation: String,
    pub regime_breakdown: Vec<RegimeShare>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stress_test: Option<StressTestSummary>,
}

fn sanitize(metrics: Option<&Metrics>) -> Option<SanitizedMetrics> {
    metrics.map(Metrics::sanitized)
}

/// Missing metrics serialize as an empty object.
fn metrics_or_empty<S: Serializer>(
    metrics: &Option<SanitizedMetrics>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match metrics {
        Some(metrics) => metrics.serialize(serializer),
        None => serializer.serialize_map(Some(0))?.end(),
    }
}

pub async fn build_report(
    ticker: &str,
    comparison: StrategyComparison,
    stress: Option<&StressTestResult>,
    explainer: &dyn ExplanationProvider,
) -> BacktestReport {
    let explanation = explain_run(explainer, &comparison.strategy).await;

    BacktestReport {
        ticker: ticker.to_string(),
        metrics_strategy: sanitize(comparison.strategy.metrics.as_ref()),
        metrics_benchmark: sanitize(comparison.benchmark.metrics.as_ref()),
        regime_breakdown: regime_shares(&comparison.strategy.results),
        data_strategy: comparison.strategy.results,
        data_benchmark: comparison.benchmark.results,
        explanation,
        stress_test: stress.map(StressTestSummary::from),
    }
}
