use std::collections::BTreeMap;

use analysis_core::{Metrics, Regime, ResultRow, SimulationParameters};
use statrs::statistics::Statistics;

use crate::models::RegimeShare;

/// Performance summary of a completed trace. Empty trace → `None`.
pub fn calculate_metrics(results: &[ResultRow], params: &SimulationParameters) -> Option<Metrics> {
    let values: Vec<f64> = results.iter().map(|r| r.value).collect();
    metrics_from_values(&values, params)
}

/// Same as [`calculate_metrics`], over a bare value series.
///
/// Volatility is NaN with fewer than two day-over-day changes; Sharpe is 0
/// whenever volatility is not strictly positive.
pub fn metrics_from_values(values: &[f64], params: &SimulationParameters) -> Option<Metrics> {
    let (&first, &last) = (values.first()?, values.last()?);
    let periods = values.len() as f64;

    let total_return = last / first - 1.0;
    let cagr = (1.0 + total_return).powf(params.trading_days_per_year / periods) - 1.0;

    let changes: Vec<f64> = values.windows(2).map(|w| w[1] / w[0] - 1.0).collect();
    let volatility = changes.std_dev() * params.annualization_factor();

    let sharpe_ratio = if volatility > 0.0 {
        (cagr - params.risk_free_rate) / volatility
    } else {
        0.0
    };

    Some(Metrics {
        cagr,
        volatility,
        sharpe_ratio,
        max_drawdown: max_drawdown(values),
    })
}

/// Deepest peak-to-trough decline, as a value <= 0.
pub fn max_drawdown(values: &[f64]) -> f64 {
    let mut peak = f64::NEG_INFINITY;
    let mut worst = 0.0_f64;
    for &value in values {
        peak = peak.max(value);
        if peak > 0.0 {
            worst = worst.min((value - peak) / peak);
        }
    }
    worst
}

/// Days spent in each regime.
pub fn regime_breakdown(results: &[ResultRow]) -> BTreeMap<Regime, usize> {
    let mut counts = BTreeMap::new();
    for row in results {
        *counts.entry(row.regime).or_insert(0) += 1;
    }
    counts
}

/// Regime counts with their share of the trace, in regime order.
pub fn regime_shares(results: &[ResultRow]) -> Vec<RegimeShare> {
    let total = results.len();
    regime_breakdown(results)
        .into_iter()
        .map(|(regime, days)| RegimeShare {
            regime,
            days,
            fraction: days as f64 / total as f64,
        })
        .collect()
}
