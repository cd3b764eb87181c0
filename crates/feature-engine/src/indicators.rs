//! Backward-looking rolling primitives.
//!
//! Every function returns a vector aligned with its input: element `i` only
//! depends on inputs `..=i`, and is `None` until the window is complete.

use statrs::statistics::Statistics;

/// Percent change over `periods` observations.
pub fn pct_change(data: &[f64], periods: usize) -> Vec<Option<f64>> {
    (0..data.len())
        .map(|i| {
            if periods == 0 || i < periods {
                return None;
            }
            let base = data[i - periods];
            if base == 0.0 {
                None
            } else {
                Some(data[i] / base - 1.0)
            }
        })
        .collect()
}

/// Natural log of the price ratio to the previous observation.
pub fn log_returns(data: &[f64]) -> Vec<Option<f64>> {
    (0..data.len())
        .map(|i| {
            if i == 0 || data[i - 1] <= 0.0 || data[i] <= 0.0 {
                None
            } else {
                Some((data[i] / data[i - 1]).ln())
            }
        })
        .collect()
}

/// Simple moving average over `period` observations.
pub fn rolling_mean(data: &[f64], period: usize) -> Vec<Option<f64>> {
    (0..data.len())
        .map(|i| {
            if period == 0 || i + 1 < period {
                return None;
            }
            let sum: f64 = data[i + 1 - period..=i].iter().sum();
            Some(sum / period as f64)
        })
        .collect()
}

/// Sample standard deviation (n - 1) over `period` observations.
///
/// A window containing any missing value yields `None`.
pub fn rolling_std(data: &[Option<f64>], period: usize) -> Vec<Option<f64>> {
    (0..data.len())
        .map(|i| {
            if period < 2 || i + 1 < period {
                return None;
            }
            let window: Option<Vec<f64>> = data[i + 1 - period..=i].iter().copied().collect();
            window.map(|w| w.std_dev())
        })
        .collect()
}

/// Rolling maximum over the trailing `period` observations, defined once
/// at least `min_periods` are available.
pub fn rolling_max(data: &[f64], period: usize, min_periods: usize) -> Vec<Option<f64>> {
    (0..data.len())
        .map(|i| {
            let start = (i + 1).saturating_sub(period);
            let window = &data[start..=i];
            if period == 0 || window.len() < min_periods.max(1) {
                return None;
            }
            Some(window.iter().copied().fold(f64::NEG_INFINITY, f64::max))
        })
        .collect()
}
