use analysis_core::{Allocation, ExplanationProvider, Metrics, Regime};
use async_trait::async_trait;

use crate::models::BacktestRun;

/// Explanation used when the strategy trace is empty.
pub const NO_DATA_EXPLANATION: &str = "No data available.";

/// Fixed-template narrative of the latest decision.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateExplainer;

impl TemplateExplainer {
    pub fn new() -> Self {
        Self
    }

    pub fn reasoning(regime: Regime) -> &'static str {
        match regime {
            Regime::Crash => {
                "Extreme market stress detected. Maximizing capital preservation (High Cash/Gold)."
            }
            Regime::HighVolatility => {
                "Volatility is elevated. Reducing risk assets to protect against potential downside."
            }
            Regime::Bearish => "Trend is negative (Price < 200 SMA). Defensive positioning favored.",
            Regime::Bullish => {
                "Market conditions are favorable (Calm & Trending Up). Increasing equity exposure to capture upsides."
            }
        }
    }

    pub fn narrate(&self, regime: Regime, allocation: &Allocation) -> String {
        format!(
            "**Market Regime Detected:** {}\n\n\
             **Action Taken:**\n\
             The system has adjusted the portfolio allocation to:\n\
             - Equity: {:.1}%\n\
             - Bonds: {:.1}%\n\
             - Cash: {:.1}%\n\n\
             **Reasoning:**\n{}",
            regime,
            allocation.equity * 100.0,
            allocation.bonds * 100.0,
            allocation.cash * 100.0,
            Self::reasoning(regime)
        )
    }
}

#[async_trait]
impl ExplanationProvider for TemplateExplainer {
    async fn explain(
        &self,
        regime: Regime,
        allocation: &Allocation,
        _metrics: Option<&Metrics>,
    ) -> String {
        self.narrate(regime, allocation)
    }
}

/// Explain the last decision of `run`, or [`NO_DATA_EXPLANATION`] when it is empty.
pub async fn explain_run(provider: &dyn ExplanationProvider, run: &BacktestRun) -> String {
    match run.last() {
        Some(last) => {
            provider
                .explain(last.regime, &last.allocation(), run.metrics.as_ref())
                .await
        }
        None => NO_DATA_EXPLANATION.to_string(),
    }
}
