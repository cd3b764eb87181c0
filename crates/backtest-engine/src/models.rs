use analysis_core::{Allocation, Metrics, Regime, ResultRow};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Outcome of one pass of the simulation loop.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BacktestRun {
    pub results: Vec<ResultRow>,
    /// `None` when the trace is empty.
    pub metrics: Option<Metrics>,
}

impl BacktestRun {
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn final_value(&self) -> Option<f64> {
        self.results.last().map(|r| r.value)
    }

    pub fn last(&self) -> Option<&ResultRow> {
        self.results.last()
    }
}

/// Risk overlay on ("strategy") against off ("benchmark") over the same features.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StrategyComparison {
    pub strategy: BacktestRun,
    pub benchmark: BacktestRun,
}

/// Where in the series a shock starts
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ShockPoint {
    /// Absolute price index
    Index(usize),
    /// Fraction of the series length, e.g. 0.75
    Fraction(f64),
}

impl ShockPoint {
    pub fn resolve(&self, series_len: usize) -> usize {
        match *self {
            ShockPoint::Index(index) => index,
            ShockPoint::Fraction(fraction) => {
                let fraction = fraction.clamp(0.0, 1.0);
                ((series_len as f64) * fraction).floor() as usize
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StressScenario {
    /// Price drop applied from the shock point onwards, e.g. 0.20 for -20%.
    pub drop_pct: f64,
    pub at: ShockPoint,
}

impl StressScenario {
    pub fn new(drop_pct: f64, at: ShockPoint) -> Self {
        Self { drop_pct, at }
    }
}

impl Default for StressScenario {
    fn default() -> Self {
        Self {
            drop_pct: 0.20,
            at: ShockPoint::Fraction(0.75),
        }
    }
}

/// Protected (overlay on) and unprotected (overlay off) runs over a shocked series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StressTestResult {
    pub scenario: StressScenario,
    pub shock_index: usize,
    /// First shocked date, if the shock lands inside the series.
    pub shock_date: Option<NaiveDate>,
    pub protected: BacktestRun,
    pub unprotected: BacktestRun,
}

impl StressTestResult {
    pub fn protected_final_value(&self) -> Option<f64> {
        self.protected.final_value()
    }

    pub fn unprotected_final_value(&self) -> Option<f64> {
        self.unprotected.final_value()
    }

    pub fn capital_preserved(&self) -> Option<f64> {
        Some(self.protected_final_value()? - self.unprotected_final_value()?)
    }
}

/// Immediate impact of a one-day shock and the engine's projected response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrisisReaction {
    pub shock_pct: f64,
    pub vol_multiplier: f64,
    /// Portfolio value change from the equity sleeve alone (negative for a drop).
    pub immediate_impact: f64,
    pub stressed_regime: Regime,
    /// Why the stressed row classified as it did.
    pub reasoning: String,
    pub current_allocation: Allocation,
    pub reaction_allocation: Allocation,
    pub risk_modifier: f64,
    pub equity_cut: bool,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegimeShare {
    pub regime: Regime,
    pub days: usize,
    pub fraction: f64,
}
