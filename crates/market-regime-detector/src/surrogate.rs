//! Training data for an external surrogate classifier.
//!
//! The rule-based detector is the labeling function: each sample pairs the
//! features known at a decision date with the regime chosen from them.

use analysis_core::{FeatureRow, FeatureTable, Regime, ResultRow};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::RegimeDetector;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SurrogateSample {
    /// Date the regime was decided (features are as of this close).
    pub date: NaiveDate,
    pub features: FeatureRow,
    pub regime: Regime,
}

impl SurrogateSample {
    pub fn feature_names() -> [&'static str; 8] {
        FeatureRow::FEATURE_NAMES
    }

    pub fn values(&self) -> [f64; 8] {
        self.features.values()
    }
}

/// Pair each simulated day with the features the decision was made on.
///
/// A result dated `d` carries the regime decided on the preceding feature
/// row. Results whose date is not in `features` are skipped.
pub fn build_training_set(features: &FeatureTable, results: &[ResultRow]) -> Vec<SurrogateSample> {
    results
        .iter()
        .filter_map(|result| {
            let position = features.position_of(result.date)?;
            let decision = features.get(position.checked_sub(1)?)?;
            Some(SurrogateSample {
                date: decision.date,
                features: *decision,
                regime: result.regime,
            })
        })
        .collect()
}

/// Label every feature row directly, without running a simulation.
pub fn label_table(detector: &RegimeDetector, features: &FeatureTable) -> Vec<SurrogateSample> {
    features
        .rows()
        .iter()
        .map(|row| SurrogateSample {
            date: row.date,
            features: *row,
            regime: detector.classify(row),
        })
        .collect()
}
