use std::collections::HashMap;

use analysis_core::{AnalysisError, FeatureRow, Regime, RegimeThresholds};
use serde::{Deserialize, Serialize};

pub mod allocation;
pub mod surrogate;

pub use allocation::{allocation_for_label, target_allocation, BALANCED_ALLOCATION};
pub use surrogate::{build_training_set, label_table, SurrogateSample};

/// Regime decision with the inputs that produced it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegimeDetection {
    pub regime: Regime,
    pub volatility: f64,
    pub uptrend: bool,
    pub reasoning: String,
}

/// Rule-based market regime detector.
///
/// Stateless: the regime depends only on the latest feature row, so the
/// detector can double as a labeling function for an external surrogate.
#[derive(Debug, Clone, Copy, Default)]
pub struct RegimeDetector {
    thresholds: RegimeThresholds,
}

impl RegimeDetector {
    pub fn new(thresholds: RegimeThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> RegimeThresholds {
        self.thresholds
    }

    /// Classify the last row of `history` (everything known at the decision date).
    pub fn detect_regime(&self, history: &[FeatureRow]) -> Result<Regime, AnalysisError> {
        let last = history.last().ok_or_else(|| {
            AnalysisError::InsufficientData("no feature rows to classify".to_string())
        })?;
        Ok(self.classify(last))
    }

    pub fn classify(&self, row: &FeatureRow) -> Regime {
        self.classify_values(row.volatility, row.is_uptrend())
    }

    /// Threshold cascade; volatility checks take priority over trend.
    pub fn classify_values(&self, volatility: f64, uptrend: bool) -> Regime {
        if volatility > self.thresholds.crash_threshold {
            Regime::Crash
        } else if volatility > self.thresholds.high_vol_threshold {
            Regime::HighVolatility
        } else if uptrend {
            Regime::Bullish
        } else {
            Regime::Bearish
        }
    }

    /// Classify a named feature vector, as handed over by external tooling.
    ///
    /// Requires `Volatility` and `Trend`; other keys are ignored.
    pub fn classify_named(&self, features: &HashMap<String, f64>) -> Result<Regime, AnalysisError> {
        let volatility = features
            .get("Volatility")
            .copied()
            .ok_or_else(|| AnalysisError::MissingFeature("Volatility".to_string()))?;
        let trend = features
            .get("Trend")
            .copied()
            .ok_or_else(|| AnalysisError::MissingFeature("Trend".to_string()))?;

        Ok(self.classify_values(volatility, trend == 1.0))
    }

    pub fn detect_with_reasoning(&self, row: &FeatureRow) -> RegimeDetection {
        let regime = self.classify(row);
        let reasoning = match regime {
            Regime::Crash => format!(
                "volatility {:.1}% above crash threshold {:.1}%",
                row.volatility * 100.0,
                self.thresholds.crash_threshold * 100.0
            ),
            Regime::HighVolatility => format!(
                "volatility {:.1}% above high-volatility threshold {:.1}%",
                row.volatility * 100.0,
                self.thresholds.high_vol_threshold * 100.0
            ),
            Regime::Bullish => format!(
                "calm ({:.1}% volatility) with price above 200-day average",
                row.volatility * 100.0
            ),
            Regime::Bearish => format!(
                "calm ({:.1}% volatility) with price at or below 200-day average",
                row.volatility * 100.0
            ),
        };

        RegimeDetection {
            regime,
            volatility: row.volatility,
            uptrend: row.is_uptrend(),
            reasoning,
        }
    }
}
