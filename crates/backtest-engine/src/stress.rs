//! Shock scenarios: replay history with an injected crash, or project the
//! engine's next-day reaction to a sudden drop.

use analysis_core::{AnalysisError, Allocation, EngineConfig, FeatureRow, PricePoint, PriceSeries};
use market_regime_detector::{target_allocation, RegimeDetector};
use risk_manager::RiskManager;
use tracing::info;

use crate::engine::BacktestEngine;
use crate::models::*;

fn check_drop(drop_pct: f64) -> Result<(), AnalysisError> {
    if !(0.0..1.0).contains(&drop_pct) {
        return Err(AnalysisError::InvalidConfig(format!(
            "shock drop must be in [0, 1), got {}",
            drop_pct
        )));
    }
    Ok(())
}

/// Copy of `series` with every price from `at_index` on scaled by `1 - drop_pct`.
///
/// An index past the end leaves the series unchanged.
pub fn inject_shock(
    series: &PriceSeries,
    drop_pct: f64,
    at_index: usize,
) -> Result<PriceSeries, AnalysisError> {
    check_drop(drop_pct)?;

    let points = series
        .points()
        .iter()
        .enumerate()
        .map(|(i, p)| {
            if i >= at_index {
                PricePoint::new(p.date, p.price * (1.0 - drop_pct))
            } else {
                *p
            }
        })
        .collect();

    PriceSeries::new(series.ticker(), points)
}

/// Re-run the comparison on a shocked copy of `series`.
pub fn run_stress_test(
    engine: &BacktestEngine,
    series: &PriceSeries,
    scenario: StressScenario,
) -> Result<StressTestResult, AnalysisError> {
    let shock_index = scenario.at.resolve(series.len());
    let shocked = inject_shock(series, scenario.drop_pct, shock_index)?;
    let features = engine.prepare_features(&shocked)?;
    let comparison = engine.run_comparison(&features);

    let result = StressTestResult {
        scenario,
        shock_index,
        shock_date: series.points().get(shock_index).map(|p| p.date),
        protected: comparison.strategy,
        unprotected: comparison.benchmark,
    };

    if let Some(preserved) = result.capital_preserved() {
        info!(
            "{}: {:.0}% shock at index {}, overlay preserved {:.2}",
            series.ticker(),
            scenario.drop_pct * 100.0,
            shock_index,
            preserved
        );
    }

    Ok(result)
}

/// Project how the engine would respond if `last_row` were hit by a sudden
/// `shock_pct` drop with volatility multiplied by `vol_multiplier`.
pub fn crisis_reaction(
    last_row: &FeatureRow,
    current_allocation: &Allocation,
    shock_pct: f64,
    vol_multiplier: f64,
    config: &EngineConfig,
) -> Result<CrisisReaction, AnalysisError> {
    check_drop(shock_pct)?;
    if !vol_multiplier.is_finite() || vol_multiplier < 0.0 {
        return Err(AnalysisError::InvalidConfig(format!(
            "volatility multiplier must be non-negative, got {}",
            vol_multiplier
        )));
    }

    let stressed = stress_row(last_row, shock_pct, vol_multiplier);
    let detector = RegimeDetector::new(config.regime);
    let risk = RiskManager::new(config.risk);

    let detection = detector.detect_with_reasoning(&stressed);
    let regime = detection.regime;
    let (reaction, modifier) =
        risk.apply_risk_controls(stressed.volatility, stressed.drawdown, &target_allocation(regime));

    let equity_cut = reaction.equity < current_allocation.equity;
    let message = if equity_cut {
        format!(
            "{} detected after a {:.0}% shock. Cutting equity from {:.1}% to {:.1}%.",
            regime,
            shock_pct * 100.0,
            current_allocation.equity * 100.0,
            reaction.equity * 100.0
        )
    } else {
        "Risk within limits. Holding positions.".to_string()
    };

    Ok(CrisisReaction {
        shock_pct,
        vol_multiplier,
        immediate_impact: -current_allocation.equity * shock_pct,
        stressed_regime: regime,
        reasoning: detection.reasoning,
        current_allocation: *current_allocation,
        reaction_allocation: reaction,
        risk_modifier: modifier,
        equity_cut,
        message,
    })
}

/// Feature row as it would read the day after the shock.
fn stress_row(row: &FeatureRow, shock_pct: f64, vol_multiplier: f64) -> FeatureRow {
    let price = row.price * (1.0 - shock_pct);
    FeatureRow {
        price,
        returns: -shock_pct,
        log_returns: (1.0 - shock_pct).ln(),
        volatility: row.volatility * vol_multiplier,
        drawdown: (1.0 + row.drawdown) * (1.0 - shock_pct) - 1.0,
        trend: u8::from(price > row.sma_200),
        ..*row
    }
}
