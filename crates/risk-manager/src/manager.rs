use analysis_core::Allocation;
use tracing::trace;

use crate::models::*;

/// Post-allocation overlay: volatility targeting plus a drawdown stop.
///
/// Holds parameters only; every call is independent.
#[derive(Debug, Clone, Copy, Default)]
pub struct RiskManager {
    params: RiskParameters,
}

impl RiskManager {
    pub fn new(params: RiskParameters) -> Self {
        Self { params }
    }

    pub fn parameters(&self) -> &RiskParameters {
        &self.params
    }

    /// Rescale `proposed` for the current volatility and drawdown.
    ///
    /// Returns the adjusted allocation and the modifier applied to equity and
    /// bonds. Cash absorbs whatever the risk assets give up.
    pub fn apply_risk_controls(
        &self,
        current_vol: f64,
        current_drawdown: f64,
        proposed: &Allocation,
    ) -> (Allocation, f64) {
        let adjustment = self.evaluate(current_vol, current_drawdown, proposed);
        (adjustment.allocation, adjustment.modifier)
    }

    pub fn evaluate(
        &self,
        current_vol: f64,
        current_drawdown: f64,
        proposed: &Allocation,
    ) -> RiskAdjustment {
        let mut modifier = 1.0;
        let mut triggered = Vec::new();

        // NaN volatility carries no information; skip the scaling rule.
        // Infinite volatility scales risk assets to zero.
        if !current_vol.is_nan() && current_vol > self.params.target_vol {
            modifier *= self.params.target_vol / current_vol;
            triggered.push(RiskControl::VolatilityTarget);
        }

        // Drawdowns arrive as values <= 0; the limit is a magnitude.
        if current_drawdown.abs() > self.params.max_drawdown {
            modifier = 0.0;
            triggered.push(RiskControl::DrawdownStop);
        }

        let allocation = Allocation::from_risk_weights(
            proposed.equity * modifier,
            proposed.bonds * modifier,
        );

        if modifier < 1.0 {
            trace!(
                "Risk overlay: vol={:.4} drawdown={:.4} modifier={:.4} equity {:.3} -> {:.3}",
                current_vol,
                current_drawdown,
                modifier,
                proposed.equity,
                allocation.equity
            );
        }

        RiskAdjustment {
            allocation,
            modifier,
            triggered,
        }
    }
}
