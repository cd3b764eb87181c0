use analysis_core::{
    AnalysisError, Allocation, EngineConfig, FeatureRow, FeatureTable, PriceSeries, Regime,
    ResultRow,
};
use feature_engine::FeatureEngine;
use market_regime_detector::{target_allocation, RegimeDetector};
use risk_manager::RiskManager;
use tracing::{debug, info};

use crate::metrics::calculate_metrics;
use crate::models::*;

/// Regime-adaptive allocation backtester.
///
/// Each day's regime and weights are decided from feature rows up to and
/// including that day, then realized against the next row's return
/// (next-bar execution). The engine keeps no state between runs.
#[derive(Debug, Clone, Copy)]
pub struct BacktestEngine {
    config: EngineConfig,
    features: FeatureEngine,
    detector: RegimeDetector,
    risk: RiskManager,
}

/// What the engine would hold after the close of one day.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Decision {
    pub regime: Regime,
    pub allocation: Allocation,
    pub risk_modifier: f64,
}

impl BacktestEngine {
    pub fn new(config: EngineConfig) -> Result<Self, AnalysisError> {
        config.validate()?;
        Ok(Self {
            config,
            features: FeatureEngine::new(config.simulation.trading_days_per_year),
            detector: RegimeDetector::new(config.regime),
            risk: RiskManager::new(config.risk),
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn detector(&self) -> &RegimeDetector {
        &self.detector
    }

    pub fn risk_manager(&self) -> &RiskManager {
        &self.risk
    }

    pub fn prepare_features(&self, series: &PriceSeries) -> Result<FeatureTable, AnalysisError> {
        self.features.compute(series)
    }

    /// Decide regime and weights from everything known at the last row of `history`.
    pub fn decide(
        &self,
        history: &[FeatureRow],
        use_risk_engine: bool,
    ) -> Result<Decision, AnalysisError> {
        let today = history.last().ok_or_else(|| {
            AnalysisError::InsufficientData("no feature rows to decide on".to_string())
        })?;
        Ok(self.decide_on(today, use_risk_engine))
    }

    /// Regime and weights for a single day's features.
    pub fn decide_on(&self, today: &FeatureRow, use_risk_engine: bool) -> Decision {
        let regime = self.detector.classify(today);
        let proposed = target_allocation(regime);

        let (allocation, risk_modifier) = if use_risk_engine {
            self.risk
                .apply_risk_controls(today.volatility, today.drawdown, &proposed)
        } else {
            (proposed, 1.0)
        };

        Decision {
            regime,
            allocation,
            risk_modifier,
        }
    }

    /// Run the simulation loop over a feature table.
    ///
    /// The first `warmup_period` rows are history only: the first decision is
    /// taken on row `warmup_period - 1` and the first result is dated on row
    /// `warmup_period`. A table no longer than the warm-up yields an empty run.
    ///
    /// Deciding first on row `warmup_period` instead would also respect the
    /// warm-up but drop the first result, leaving the trace one row shorter.
    pub fn run(&self, features: &FeatureTable, use_risk_engine: bool) -> BacktestRun {
        let sim = &self.config.simulation;
        let rows = features.rows();
        let daily_bond = sim.daily_bond_return();
        let first_decision = sim.warmup_period.saturating_sub(1);

        let mut value = sim.initial_capital;
        let mut results = Vec::with_capacity(rows.len().saturating_sub(sim.warmup_period));

        for (today, next) in rows.iter().zip(rows.iter().skip(1)).skip(first_decision) {
            let decision = self.decide_on(today, use_risk_engine);

            let alloc = decision.allocation;
            let portfolio_return = alloc.equity * next.returns + alloc.bonds * daily_bond;
            value *= 1.0 + portfolio_return;

            results.push(ResultRow {
                date: next.date,
                value,
                regime: decision.regime,
                equity_weight: alloc.equity,
                bonds_weight: alloc.bonds,
                cash_weight: alloc.cash,
            });
        }

        let metrics = calculate_metrics(&results, sim);

        match results.last() {
            Some(last) => info!(
                "{}: {} simulated days (risk overlay {}), final value {:.2}",
                features.ticker(),
                results.len(),
                if use_risk_engine { "on" } else { "off" },
                last.value
            ),
            None => debug!(
                "{}: {} feature rows do not clear the {}-row warm-up",
                features.ticker(),
                rows.len(),
                sim.warmup_period
            ),
        }

        BacktestRun { results, metrics }
    }

    /// Derive features from `series` and run the loop.
    pub fn run_series(
        &self,
        series: &PriceSeries,
        use_risk_engine: bool,
    ) -> Result<BacktestRun, AnalysisError> {
        let features = self.prepare_features(series)?;
        Ok(self.run(&features, use_risk_engine))
    }

    /// Strategy (overlay on) and benchmark (overlay off), run in parallel.
    pub fn run_comparison(&self, features: &FeatureTable) -> StrategyComparison {
        let (strategy, benchmark) =
            rayon::join(|| self.run(features, true), || self.run(features, false));
        StrategyComparison {
            strategy,
            benchmark,
        }
    }
}

impl Default for BacktestEngine {
    fn default() -> Self {
        let config = EngineConfig::default();
        Self {
            config,
            features: FeatureEngine::new(config.simulation.trading_days_per_year),
            detector: RegimeDetector::new(config.regime),
            risk: RiskManager::new(config.risk),
        }
    }
}
