use analysis_core::{AnalysisError, FeatureRow, FeatureTable, PriceSeries};
use tracing::{debug, warn};

use crate::indicators::{log_returns, pct_change, rolling_max, rolling_mean, rolling_std};

/// Window for realized volatility (~1 month).
pub const VOLATILITY_WINDOW: usize = 21;
pub const SHORT_SMA_WINDOW: usize = 50;
pub const LONG_SMA_WINDOW: usize = 200;
/// Lookback for 3-month momentum.
pub const MOMENTUM_LOOKBACK: usize = 63;
/// Trailing window for the drawdown peak (~1 year).
pub const DRAWDOWN_WINDOW: usize = 252;

/// Derives the per-day feature table from a price series.
#[derive(Debug, Clone, Copy)]
pub struct FeatureEngine {
    annualization: f64,
}

impl FeatureEngine {
    pub fn new(trading_days_per_year: f64) -> Self {
        Self {
            annualization: trading_days_per_year.sqrt(),
        }
    }

    /// Compute features for every date with a complete history.
    ///
    /// The longest window is SMA_200, so the first row lines up with the
    /// 200th price. A shorter series yields an empty table.
    pub fn compute(&self, series: &PriceSeries) -> Result<FeatureTable, AnalysisError> {
        if series.is_empty() {
            return Err(AnalysisError::InsufficientData(format!(
                "{}: price series is empty",
                series.ticker()
            )));
        }

        let prices = series.prices();
        let returns = pct_change(&prices, 1);
        let log_rets = log_returns(&prices);
        let volatility = rolling_std(&log_rets, VOLATILITY_WINDOW);
        let sma_50 = rolling_mean(&prices, SHORT_SMA_WINDOW);
        let sma_200 = rolling_mean(&prices, LONG_SMA_WINDOW);
        let momentum = pct_change(&prices, MOMENTUM_LOOKBACK);
        let peaks = rolling_max(&prices, DRAWDOWN_WINDOW, 1);

        let mut rows = Vec::with_capacity(prices.len().saturating_sub(LONG_SMA_WINDOW - 1));

        for (i, point) in series.points().iter().enumerate() {
            let (
                Some(ret),
                Some(log_ret),
                Some(vol),
                Some(short_sma),
                Some(long_sma),
                Some(mom),
                Some(peak),
            ) = (
                returns[i],
                log_rets[i],
                volatility[i],
                sma_50[i],
                sma_200[i],
                momentum[i],
                peaks[i],
            )
            else {
                continue;
            };

            let vol = vol * self.annualization;
            if !vol.is_finite() {
                continue;
            }

            rows.push(FeatureRow {
                date: point.date,
                price: point.price,
                returns: ret,
                log_returns: log_ret,
                volatility: vol,
                sma_50: short_sma,
                sma_200: long_sma,
                momentum_3m: mom,
                drawdown: (point.price - peak) / peak,
                trend: u8::from(point.price > long_sma),
            });
        }

        if rows.is_empty() {
            warn!(
                "{}: {} prices is not enough history for features (need {})",
                series.ticker(),
                prices.len(),
                LONG_SMA_WINDOW
            );
        } else {
            debug!(
                "{}: {} feature rows from {} prices",
                series.ticker(),
                rows.len(),
                prices.len()
            );
        }

        Ok(FeatureTable::new(series.ticker(), rows))
    }
}

impl Default for FeatureEngine {
    fn default() -> Self {
        Self::new(252.0)
    }
}
