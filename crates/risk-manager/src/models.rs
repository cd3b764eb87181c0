use analysis_core::Allocation;
use serde::{Deserialize, Serialize};

pub use analysis_core::RiskParameters;

/// Which overlay rule reduced exposure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskControl {
    /// Realized volatility above target; exposure scaled by target / realized
    VolatilityTarget,
    /// Drawdown beyond the limit; all risk assets moved to cash
    DrawdownStop,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAdjustment {
    pub allocation: Allocation,
    /// Multiplier applied to the risk-asset weights, in [0, 1].
    pub modifier: f64,
    pub triggered: Vec<RiskControl>,
}

impl RiskAdjustment {
    pub fn is_adjusted(&self) -> bool {
        self.modifier < 1.0
    }

    pub fn is_halted(&self) -> bool {
        self.triggered.contains(&RiskControl::DrawdownStop)
    }
}
