//! Static regime → target allocation table.

use analysis_core::{Allocation, Regime};

/// Used when a regime label is not recognized.
pub const BALANCED_ALLOCATION: Allocation = Allocation {
    equity: 0.5,
    bonds: 0.4,
    cash: 0.1,
};

/// Target weights for a regime. Cash takes whatever equity and bonds leave.
pub fn target_allocation(regime: Regime) -> Allocation {
    let (equity, bonds) = match regime {
        Regime::Bullish => (0.7, 0.2),
        Regime::Bearish => (0.3, 0.5),
        Regime::HighVolatility => (0.1, 0.4),
        Regime::Crash => (0.0, 0.2),
    };
    Allocation::from_risk_weights(equity, bonds)
}

/// Allocation for a free-form regime label.
pub fn allocation_for_label(label: &str) -> Allocation {
    match label.parse::<Regime>() {
        Ok(regime) => target_allocation(regime),
        Err(_) => {
            log::debug!("Unknown regime label '{}', using balanced allocation", label);
            BALANCED_ALLOCATION
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn test_allocation_table() {
        let bullish = target_allocation(Regime::Bullish);
        assert!((bullish.equity - 0.7).abs() < EPS);
        assert!((bullish.bonds - 0.2).abs() < EPS);
        assert!((bullish.cash - 0.1).abs() < EPS);

        let bearish = target_allocation(Regime::Bearish);
        assert!((bearish.equity - 0.3).abs() < EPS);
        assert!((bearish.bonds - 0.5).abs() < EPS);
        assert!((bearish.cash - 0.2).abs() < EPS);

        let high_vol = target_allocation(Regime::HighVolatility);
        assert!((high_vol.equity - 0.1).abs() < EPS);
        assert!((high_vol.cash - 0.5).abs() < EPS);

        let crash = target_allocation(Regime::Crash);
        assert_eq!(crash.equity, 0.0);
        assert!((crash.cash - 0.8).abs() < EPS);
    }

    #[test]
    fn test_every_allocation_is_fully_invested() {
        for regime in Regime::ALL {
            let alloc = target_allocation(regime);
            assert!(alloc.is_valid(EPS), "{regime} allocation invalid: {alloc:?}");
        }
        assert!(BALANCED_ALLOCATION.is_valid(EPS));
    }

    #[test]
    fn test_equity_decreases_with_stress() {
        let equity: Vec<f64> = [
            Regime::Bullish,
            Regime::Bearish,
            Regime::HighVolatility,
            Regime::Crash,
        ]
        .iter()
        .map(|r| target_allocation(*r).equity)
        .collect();
        assert!(equity.windows(2).all(|w| w[0] > w[1]));
    }

    #[test]
    fn test_label_lookup_and_fallback() {
        assert_eq!(
            allocation_for_label("High Volatility"),
            target_allocation(Regime::HighVolatility)
        );
        assert_eq!(allocation_for_label("Sideways"), BALANCED_ALLOCATION);
    }
}
